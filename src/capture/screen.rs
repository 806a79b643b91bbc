//! Screen raster grabs using the xcap library.
//!
//! Regions are captured by grabbing the monitor that contains the region's
//! centre and cropping, so window-bound regions capture whatever is on screen
//! over the window, the same way the full display is captured.

use image::{imageops, RgbaImage};
use log::debug;
use xcap::Monitor;

use super::region::CaptureRegion;

/// Source of raw screen images. Owned by the capture thread for a session.
pub trait ScreenGrabber: Send {
    /// Bounds of the primary display in global coordinates.
    fn primary_bounds(&self) -> Result<CaptureRegion, String>;

    /// Grabs the pixels under `region`. The image may be larger than the
    /// region on scaled displays.
    fn grab(&mut self, region: &CaptureRegion) -> Result<RgbaImage, String>;
}

/// Information about a monitor
#[derive(Debug, Clone)]
pub struct MonitorInfo {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl MonitorInfo {
    fn from_xcap(monitor: &Monitor) -> Result<Self, String> {
        Ok(Self {
            name: monitor.name().map_err(|e| e.to_string())?,
            x: monitor.x().map_err(|e| e.to_string())?,
            y: monitor.y().map_err(|e| e.to_string())?,
            width: monitor.width().map_err(|e| e.to_string())?,
            height: monitor.height().map_err(|e| e.to_string())?,
        })
    }

    pub fn bounds(&self) -> CaptureRegion {
        CaptureRegion::new(self.x, self.y, self.width, self.height)
    }
}

/// Get the primary monitor
pub fn get_primary_monitor() -> Result<MonitorInfo, String> {
    let monitors = Monitor::all().map_err(|e| format!("Failed to get monitors: {}", e))?;

    let monitor = monitors
        .iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .or(monitors.first())
        .ok_or_else(|| "No primary monitor found".to_string())?;

    MonitorInfo::from_xcap(monitor)
}

/// Grabs through xcap, one monitor capture per call.
#[derive(Debug, Default)]
pub struct XcapScreen;

impl ScreenGrabber for XcapScreen {
    fn primary_bounds(&self) -> Result<CaptureRegion, String> {
        get_primary_monitor().map(|m| m.bounds())
    }

    fn grab(&mut self, region: &CaptureRegion) -> Result<RgbaImage, String> {
        let (cx, cy) = region.center();
        let monitor = match Monitor::from_point(cx, cy) {
            Ok(monitor) => monitor,
            Err(_) => {
                let monitors =
                    Monitor::all().map_err(|e| format!("Failed to get monitors: {}", e))?;
                let primary = monitors.iter().position(|m| m.is_primary().unwrap_or(false));
                monitors
                    .into_iter()
                    .nth(primary.unwrap_or(0))
                    .ok_or("No monitors available")?
            }
        };
        let info = MonitorInfo::from_xcap(&monitor)?;

        let image = monitor
            .capture_image()
            .map_err(|e| format!("Failed to capture screen: {}", e))?;

        debug!(
            "Captured monitor '{}' ({}x{} pixels) for region {}",
            info.name,
            image.width(),
            image.height(),
            region
        );

        crop_to_region(&image, &info.bounds(), region)
    }
}

/// Crops a monitor image down to `region`, both given in global logical
/// coordinates. Handles monitors whose image is scaled relative to their
/// logical size and clips regions hanging off the monitor's edge.
pub fn crop_to_region(
    image: &RgbaImage,
    monitor: &CaptureRegion,
    region: &CaptureRegion,
) -> Result<RgbaImage, String> {
    if monitor.is_empty() {
        return Err("Monitor reports no area".to_string());
    }

    let scale_x = image.width() as f64 / monitor.width as f64;
    let scale_y = image.height() as f64 / monitor.height as f64;

    let left = (region.left - monitor.left).max(0) as f64;
    let top = (region.top - monitor.top).max(0) as f64;
    let right = ((region.left - monitor.left) as f64 + region.width as f64).min(monitor.width as f64);
    let bottom = ((region.top - monitor.top) as f64 + region.height as f64).min(monitor.height as f64);

    if right <= left || bottom <= top {
        return Err(format!("Region {} is outside the monitor", region));
    }

    let x = (left * scale_x).round() as u32;
    let y = (top * scale_y).round() as u32;
    let width = (((right - left) * scale_x).round() as u32).min(image.width() - x);
    let height = (((bottom - top) * scale_y).round() as u32).min(image.height() - y);

    if width == 0 || height == 0 {
        return Err(format!("Region {} is outside the monitor", region));
    }

    Ok(imageops::crop_imm(image, x, y, width, height).to_image())
}
