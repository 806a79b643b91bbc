//! Capture module: what to record and how to grab it.
//!
//! Region selection and tracking, xcap-backed screen grabs, and window
//! enumeration with one backend per desktop session.

pub mod desktop;
pub mod region;
pub mod screen;
pub mod window;
pub mod window_backends;

pub use desktop::DesktopSession;
pub use region::{CaptureRegion, RegionSelector, RegionTracker, ENTIRE_SCREEN};
pub use screen::{ScreenGrabber, XcapScreen};
pub use window::{list_capture_choices, selector_for_name, WindowChoice, WindowLister};
pub use window_backends::lister_for_session;
