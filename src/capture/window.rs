use super::region::{CaptureRegion, RegionSelector, ENTIRE_SCREEN};
use crate::recorder::RecorderError;

pub use super::desktop::WindowListBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: u64,

    /// Owning application, as the backend names it
    pub app_name: String,

    pub title: String,

    pub x: i32,

    pub y: i32,

    pub width: u32,

    pub height: u32,

    pub is_minimized: bool,
}

impl WindowInfo {
    pub fn rect(&self) -> CaptureRegion {
        CaptureRegion::new(self.x, self.y, self.width, self.height)
    }

    /// Whether the window is worth offering for capture.
    pub fn is_capturable(&self) -> bool {
        !self.is_minimized && !self.title.trim().is_empty() && self.width > 0 && self.height > 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WindowCaptureError {
    #[error("Failed to enumerate windows: {0}")]
    EnumerationFailed(String),

    #[error("Failed to get window info: {0}")]
    InfoFailed(String),

    #[error("Window capture is not supported: {0}")]
    Unsupported(String),
}

/// Window enumeration and geometry for one desktop session.
///
/// Chosen once at startup by [`super::window_backends::lister_for_session`].
pub trait WindowLister: Send + Sync {
    fn backend(&self) -> WindowListBackend;

    /// Every window the backend knows about, capturable or not.
    fn list_windows(&self) -> Result<Vec<WindowInfo>, WindowCaptureError>;

    /// Current screen rectangle of window `id`: `Ok(None)` when the window is
    /// confirmed gone, `Err` when the lookup itself failed.
    fn window_rect(&self, id: u64) -> Result<Option<CaptureRegion>, WindowCaptureError> {
        Ok(self
            .list_windows()?
            .into_iter()
            .find(|w| w.id == id)
            .map(|w| w.rect()))
    }
}

/// An entry of the capture target picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowChoice {
    pub label: String,
    pub selector: RegionSelector,
}

impl WindowChoice {
    pub fn entire_screen() -> Self {
        Self {
            label: ENTIRE_SCREEN.to_string(),
            selector: RegionSelector::PrimaryDisplay,
        }
    }
}

/// "Entire Screen" followed by every capturable window, by title.
pub fn list_capture_choices(lister: &dyn WindowLister) -> Vec<WindowChoice> {
    let mut choices = vec![WindowChoice::entire_screen()];

    match lister.list_windows() {
        Ok(windows) => {
            for w in windows.into_iter().filter(|w| w.is_capturable()) {
                log::debug!("Window {} '{}' ({})", w.id, w.title, w.app_name);
                choices.push(WindowChoice {
                    label: w.title,
                    selector: RegionSelector::Window(w.id),
                });
            }
        }
        Err(WindowCaptureError::Unsupported(_)) => {}
        Err(e) => log::warn!("{}", e),
    }

    log::info!(
        "{} capturable windows via {}",
        choices.len() - 1,
        lister.backend()
    );
    choices
}

/// Maps a window title (as persisted in the config) to a selector, against a
/// fresh listing.
pub fn selector_for_name(
    lister: &dyn WindowLister,
    name: &str,
) -> Result<RegionSelector, RecorderError> {
    if name.is_empty() || name == ENTIRE_SCREEN {
        return Ok(RegionSelector::PrimaryDisplay);
    }

    let windows = lister
        .list_windows()
        .map_err(|e| RecorderError::RegionUnavailable(e.to_string()))?;

    windows
        .into_iter()
        .find(|w| w.title == name && w.is_capturable())
        .map(|w| RegionSelector::Window(w.id))
        .ok_or_else(|| RecorderError::RegionUnavailable(format!("no window titled '{}'", name)))
}
