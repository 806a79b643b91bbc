//! Video encoding through an `ffmpeg` child process.
//!
//! Frames are piped to ffmpeg as raw RGB24. The container frame rate is
//! given to ffmpeg as the input rate, so playback duration is always
//! `frames / fps` no matter how far apart the frames were grabbed.

use std::env;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};

use image::RgbImage;
use log::{debug, info, warn};

use super::RecorderError;

/// Environment variable naming the ffmpeg binary to use.
pub const FFMPEG_ENV: &str = "TIMELAPSE_FFMPEG";

/// Codec setups tried in order until one opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderProfile {
    /// H.264 tagged `avc1`, plays nearly everywhere
    H264,
    /// MPEG-4 Part 2 tagged `mp4v`, available in almost every ffmpeg build
    Mpeg4,
}

impl EncoderProfile {
    pub const PREFERENCE: [EncoderProfile; 2] = [EncoderProfile::H264, EncoderProfile::Mpeg4];

    /// ffmpeg encoder name.
    pub fn codec(&self) -> &'static str {
        match self {
            EncoderProfile::H264 => "libx264",
            EncoderProfile::Mpeg4 => "mpeg4",
        }
    }

    pub fn fourcc(&self) -> &'static str {
        match self {
            EncoderProfile::H264 => "avc1",
            EncoderProfile::Mpeg4 => "mp4v",
        }
    }

    fn codec_args(&self) -> &'static [&'static str] {
        match self {
            EncoderProfile::H264 => &["-preset", "medium", "-crf", "23"],
            EncoderProfile::Mpeg4 => &["-q:v", "3"],
        }
    }
}

impl std::fmt::Display for EncoderProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.fourcc(), self.codec())
    }
}

/// Everything a sink is bound to for its whole life.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    pub path: PathBuf,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

/// An open video file accepting frames of exactly the settings' size.
pub trait FrameSink: Send {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), RecorderError>;

    /// Flushes and closes the file, returning the number of frames written.
    fn finish(self: Box<Self>) -> Result<u64, RecorderError>;
}

/// Opens sinks for a given profile.
pub trait SinkOpener {
    fn open(
        &self,
        profile: EncoderProfile,
        settings: &EncoderSettings,
    ) -> Result<Box<dyn FrameSink>, String>;
}

/// A sink together with the profile that opened it.
pub struct OpenedEncoder {
    pub profile: EncoderProfile,
    pub sink: Box<dyn FrameSink>,
}

/// Tries every profile in [`EncoderProfile::PREFERENCE`] with identical
/// settings, returning the first that opens.
pub fn open_with_fallback(
    opener: &dyn SinkOpener,
    settings: &EncoderSettings,
) -> Result<OpenedEncoder, RecorderError> {
    let mut attempts = Vec::new();

    for profile in EncoderProfile::PREFERENCE {
        match opener.open(profile, settings) {
            Ok(sink) => {
                info!(
                    "Opened {} encoder for {} ({}x{} @ {} fps)",
                    profile,
                    settings.path.display(),
                    settings.width,
                    settings.height,
                    settings.fps
                );
                return Ok(OpenedEncoder { profile, sink });
            }
            Err(reason) => {
                warn!("Encoder {} unavailable: {}", profile, reason);
                attempts.push(format!("{}: {}", profile, reason));
            }
        }
    }

    Err(RecorderError::EncoderUnavailable {
        path: settings.path.clone(),
        attempts,
    })
}

/// Opens [`FfmpegSink`]s using a located ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegOpener {
    binary: Option<PathBuf>,
}

impl FfmpegOpener {
    /// Uses `$TIMELAPSE_FFMPEG`, else `ffmpeg` from `PATH`.
    pub fn locate() -> Self {
        let binary = env::var_os(FFMPEG_ENV)
            .map(PathBuf::from)
            .or_else(|| which::which("ffmpeg").ok());

        match &binary {
            Some(path) => info!("Using ffmpeg at {}", path.display()),
            None => warn!("ffmpeg not found; set {} or install ffmpeg", FFMPEG_ENV),
        }

        Self { binary }
    }
}

impl SinkOpener for FfmpegOpener {
    fn open(
        &self,
        profile: EncoderProfile,
        settings: &EncoderSettings,
    ) -> Result<Box<dyn FrameSink>, String> {
        let binary = self.binary.as_deref().ok_or("ffmpeg not found")?;

        let encoders = list_encoders(binary)?;
        if !encoders.iter().any(|name| name == profile.codec()) {
            return Err(format!("ffmpeg has no {} encoder", profile.codec()));
        }
        trial_encode(binary, profile, settings)?;

        FfmpegSink::spawn(binary, profile, settings).map(|sink| Box::new(sink) as Box<dyn FrameSink>)
    }
}

/// Runs `ffmpeg -encoders` and returns the encoder names it lists.
fn list_encoders(binary: &Path) -> Result<Vec<String>, String> {
    let output = Command::new(binary)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| format!("Failed to run {}: {}", binary.display(), e))?;

    if !output.status.success() {
        return Err("ffmpeg -encoders returned non-zero exit code".to_string());
    }

    Ok(parse_encoder_names(&String::from_utf8_lossy(&output.stdout)))
}

/// Parses the table printed by `ffmpeg -encoders`:
/// a legend, a `------` separator, then one ` V....D name  description` line
/// per encoder.
fn parse_encoder_names(listing: &str) -> Vec<String> {
    listing
        .lines()
        .skip_while(|line| line.trim() != "------")
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}

/// Arguments encoding one synthetic black frame at the sink's size and rate
/// into the null muxer.
fn trial_args(profile: EncoderProfile, settings: &EncoderSettings) -> Vec<String> {
    let fps = settings.fps.to_string();
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-f", "lavfi", "-i"]
        .map(String::from)
        .to_vec();

    args.push(format!(
        "color=c=black:s={}x{}:r={}",
        settings.width, settings.height, fps
    ));
    args.extend(["-frames:v", "1", "-an", "-c:v", profile.codec()].map(String::from));
    args.extend(profile.codec_args().iter().map(|s| s.to_string()));
    args.extend(["-pix_fmt".to_string(), "yuv420p".to_string(), "-r".to_string(), fps]);
    args.extend(["-f", "null", "-"].map(String::from));
    args
}

/// Checks that the codec initialises at the sink's size and rate. ffmpeg
/// only opens the encoder once the first frame arrives, so a sink that
/// spawned fine can still fail on its first write without this.
fn trial_encode(
    binary: &Path,
    profile: EncoderProfile,
    settings: &EncoderSettings,
) -> Result<(), String> {
    let output = Command::new(binary)
        .args(trial_args(profile, settings))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .output()
        .map_err(|e| format!("Failed to run {}: {}", binary.display(), e))?;

    if output.status.success() {
        return Ok(());
    }

    Err(format!(
        "{} rejected {}x{} @ {} fps: {}",
        profile.codec(),
        settings.width,
        settings.height,
        settings.fps,
        String::from_utf8_lossy(&output.stderr).trim()
    ))
}

/// Builds the full ffmpeg argument list for a sink.
fn ffmpeg_args(profile: EncoderProfile, settings: &EncoderSettings) -> Vec<String> {
    let fps = settings.fps.to_string();
    let mut args: Vec<String> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-y",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgb24",
        "-video_size",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.push(format!("{}x{}", settings.width, settings.height));
    args.extend(["-framerate".to_string(), fps.clone()]);
    args.extend(["-i", "-", "-an", "-c:v", profile.codec()].map(String::from));
    args.extend(profile.codec_args().iter().map(|s| s.to_string()));
    args.extend(["-pix_fmt", "yuv420p", "-tag:v", profile.fourcc()].map(String::from));
    args.extend(["-r".to_string(), fps]);
    args.extend(["-movflags", "+faststart"].map(String::from));
    args.push(settings.path.to_string_lossy().into_owned());
    args
}

/// One ffmpeg process writing one file.
pub struct FfmpegSink {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_thread: Option<JoinHandle<Vec<String>>>,
    frame_len: usize,
    frames: u64,
    width: u32,
    height: u32,
}

impl FfmpegSink {
    fn spawn(
        binary: &Path,
        profile: EncoderProfile,
        settings: &EncoderSettings,
    ) -> Result<Self, String> {
        let mut child = Command::new(binary)
            .args(ffmpeg_args(profile, settings))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("Failed to spawn {}: {}", binary.display(), e))?;

        let stdin = child.stdin.take();
        let stderr_thread = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                let mut lines = Vec::new();
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    debug!("ffmpeg: {}", line);
                    lines.push(line);
                }
                lines
            })
        });

        Ok(Self {
            child,
            stdin,
            stderr_thread,
            frame_len: settings.width as usize * settings.height as usize * 3,
            frames: 0,
            width: settings.width,
            height: settings.height,
        })
    }

    fn close(&mut self) -> Result<Vec<String>, std::io::Error> {
        drop(self.stdin.take());
        let status = self.child.wait()?;
        let stderr = self
            .stderr_thread
            .take()
            .and_then(|t| t.join().ok())
            .unwrap_or_default();

        if status.success() {
            Ok(stderr)
        } else {
            Err(std::io::Error::other(format!(
                "ffmpeg exited with {}: {}",
                status,
                stderr.join(" | ")
            )))
        }
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), RecorderError> {
        if frame.dimensions() != (self.width, self.height) || frame.as_raw().len() != self.frame_len {
            return Err(RecorderError::EncoderFailed(format!(
                "frame is {}x{}, encoder expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| RecorderError::EncoderFailed("encoder already closed".to_string()))?;

        stdin
            .write_all(frame.as_raw())
            .map_err(|e| RecorderError::EncoderFailed(format!("ffmpeg stopped accepting frames: {}", e)))?;

        self.frames += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<u64, RecorderError> {
        match self.close() {
            Ok(_) => Ok(self.frames),
            // ffmpeg may refuse to finalize a stream it never received a frame for
            Err(e) if self.frames == 0 => {
                warn!("Empty recording did not finalize cleanly: {}", e);
                Ok(0)
            }
            Err(e) => Err(RecorderError::EncoderFailed(e.to_string())),
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            if let Err(e) = self.close() {
                warn!("Encoder closed with error: {}", e);
            }
        }
    }
}
