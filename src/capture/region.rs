//! Capture regions and their per-tick resolution.
//!
//! A region is either the primary display (fixed for the session) or the
//! on-screen rectangle of a tracked window, which is re-queried every tick.

use log::{debug, warn};

use super::screen::ScreenGrabber;
use super::window::{WindowCaptureError, WindowLister};
use crate::recorder::RecorderError;

/// Label of the selector entry that stands for the whole primary display.
pub const ENTIRE_SCREEN: &str = "Entire Screen";

/// Consecutive failed geometry fetches tolerated before a tracked window is
/// declared lost.
pub const MAX_GEOMETRY_FAILURES: u32 = 5;

/// An integer pixel rectangle in global screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Centre point, used to pick the monitor a region lives on.
    pub fn center(&self) -> (i32, i32) {
        (
            self.left + (self.width / 2) as i32,
            self.top + (self.height / 2) as i32,
        )
    }
}

impl std::fmt::Display for CaptureRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.left, self.top
        )
    }
}

/// What the user asked to record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSelector {
    /// The primary display's bounds
    PrimaryDisplay,
    /// A window, by the id its lister reported
    Window(u64),
}

/// Resolves a selector to a concrete rectangle at session start.
///
/// Start-time resolution is strict: an unknown window, an unsupported
/// platform or a transient geometry failure all refuse the session.
pub fn resolve(
    selector: RegionSelector,
    screen: &dyn ScreenGrabber,
    windows: &dyn WindowLister,
) -> Result<CaptureRegion, RecorderError> {
    let region = match selector {
        RegionSelector::PrimaryDisplay => screen
            .primary_bounds()
            .map_err(RecorderError::RegionUnavailable)?,
        RegionSelector::Window(id) => match windows.window_rect(id) {
            Ok(Some(region)) => region,
            Ok(None) => {
                return Err(RecorderError::RegionUnavailable(format!(
                    "window {} no longer exists",
                    id
                )))
            }
            Err(e) => return Err(RecorderError::RegionUnavailable(e.to_string())),
        },
    };

    if region.is_empty() {
        return Err(RecorderError::RegionUnavailable(format!(
            "region has no area: {}",
            region
        )));
    }

    Ok(region)
}

/// Follows a selector across ticks, reusing the last good rectangle while the
/// window manager has transient trouble reporting geometry.
#[derive(Debug, Clone)]
pub struct RegionTracker {
    selector: RegionSelector,
    last_good: CaptureRegion,
    consecutive_failures: u32,
}

impl RegionTracker {
    pub fn new(selector: RegionSelector, initial: CaptureRegion) -> Self {
        Self {
            selector,
            last_good: initial,
            consecutive_failures: 0,
        }
    }

    /// Returns the region to grab for this tick.
    pub fn refresh(&mut self, windows: &dyn WindowLister) -> Result<CaptureRegion, RecorderError> {
        let id = match self.selector {
            RegionSelector::PrimaryDisplay => return Ok(self.last_good),
            RegionSelector::Window(id) => id,
        };

        match windows.window_rect(id) {
            Ok(Some(region)) if !region.is_empty() => {
                if region != self.last_good {
                    debug!("Window {} moved or resized to {}", id, region);
                }
                self.last_good = region;
                self.consecutive_failures = 0;
                Ok(region)
            }
            Ok(Some(region)) => self.transient_failure(id, format!("empty rectangle {}", region)),
            Ok(None) => Err(RecorderError::RegionLost(format!(
                "window {} was closed",
                id
            ))),
            Err(WindowCaptureError::Unsupported(reason)) => Err(RecorderError::RegionLost(reason)),
            Err(e) => self.transient_failure(id, e.to_string()),
        }
    }

    fn transient_failure(&mut self, id: u64, reason: String) -> Result<CaptureRegion, RecorderError> {
        self.consecutive_failures += 1;
        if self.consecutive_failures > MAX_GEOMETRY_FAILURES {
            return Err(RecorderError::RegionLost(format!(
                "geometry of window {} unavailable for {} consecutive ticks: {}",
                id, self.consecutive_failures, reason
            )));
        }
        warn!(
            "Could not fetch geometry of window {} ({}), reusing {}",
            id, reason, self.last_good
        );
        Ok(self.last_good)
    }
}
