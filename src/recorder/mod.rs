//! Recording sessions: the capture loop and the video encoder it feeds.

pub mod encoder;
mod error;
pub mod frame;
pub mod session;

pub use encoder::{EncoderProfile, FfmpegOpener};
pub use error::RecorderError;
pub use session::{parse_positive, Recorder, RecorderEvent, RecordingHandle, RecordingRequest};
