use gtk4 as gtk;

use gtk4::prelude::*;
use std::path::Path;

use crate::capture::CaptureRegion;
use crate::recorder::{EncoderProfile, RecorderError};

pub fn show_message(parent: &impl IsA<gtk::Window>, message: &str, detail: &str) {
    let dialog = gtk::AlertDialog::builder()
        .message(message)
        .detail(detail)
        .modal(true)
        .build();
    dialog.show(Some(parent));
}

pub fn show_error(parent: &impl IsA<gtk::Window>, error: &RecorderError) {
    let message = match error {
        RecorderError::InvalidParameters(_) => "Invalid input",
        RecorderError::RegionLost(_) => "Recording stopped",
        _ => "Error",
    };
    show_message(parent, message, &error.to_string());
}

pub fn started_detail(
    width: u32,
    height: u32,
    region: &CaptureRegion,
    profile: EncoderProfile,
    path: &Path,
) -> String {
    format!(
        "Recording {}x{} frames from {}\nEncoder: {}\nSaving to:\n{}",
        width,
        height,
        region,
        profile,
        path.display()
    )
}

pub fn finished_detail(path: &Path, frames: u64, duration_secs: f64) -> String {
    format!(
        "Saved {} frames ({:.1} s of video) to:\n{}",
        frames,
        duration_secs,
        path.display()
    )
}
