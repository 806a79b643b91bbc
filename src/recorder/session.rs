//! The capture loop: validate, size the encoder from a first grab, then
//! sample the region on a background thread until the running flag clears.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use log::{debug, error, info, warn};

use super::encoder::{open_with_fallback, EncoderProfile, EncoderSettings, FrameSink, SinkOpener};
use super::frame;
use super::RecorderError;
use crate::capture::region::{self, CaptureRegion, RegionSelector, RegionTracker};
use crate::capture::{ScreenGrabber, WindowLister};

/// Required extension of the output file.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Longest single sleep while waiting for the next tick, bounding how late a
/// stop request is noticed.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Parameters of a start request, as collected by the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingRequest {
    pub output_dir: PathBuf,
    /// Empty means a timestamped default name
    pub filename: String,
    /// Container frame rate, frames per second of playback
    pub fps: f64,
    /// Seconds between screen grabs
    pub interval: f64,
    pub selector: RegionSelector,
}

impl RecordingRequest {
    /// Checks the numeric fields and returns the pause between grabs.
    pub fn validate(&self) -> Result<Duration, RecorderError> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(RecorderError::InvalidParameters(format!(
                "FPS must be > 0 (got {})",
                self.fps
            )));
        }
        if !self.interval.is_finite() || self.interval <= 0.0 {
            return Err(RecorderError::InvalidParameters(format!(
                "Interval must be > 0 (got {})",
                self.interval
            )));
        }
        Duration::try_from_secs_f64(self.interval).map_err(|_| {
            RecorderError::InvalidParameters(format!(
                "Interval of {} seconds is too long",
                self.interval
            ))
        })
    }

    /// The file this request records into, named relative to `now`.
    pub fn target_path(&self, now: DateTime<Local>) -> PathBuf {
        self.output_dir.join(normalize_filename(&self.filename, now))
    }
}

/// Parses a user-entered positive number such as an FPS or interval field.
pub fn parse_positive(label: &str, text: &str) -> Result<f64, RecorderError> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| RecorderError::InvalidParameters(format!("{} must be a number", label)))?;

    if !value.is_finite() || value <= 0.0 {
        return Err(RecorderError::InvalidParameters(format!(
            "{} must be > 0",
            label
        )));
    }
    Ok(value)
}

/// Trims the name, substitutes a timestamped default for an empty one, and
/// appends `.mp4` unless already present in any letter case.
pub fn normalize_filename(filename: &str, now: DateTime<Local>) -> String {
    let name = filename.trim();
    let mut name = if name.is_empty() {
        format!("timelapse_{}", now.format("%Y%m%d_%H%M%S"))
    } else {
        name.to_string()
    };

    let suffix = format!(".{}", VIDEO_EXTENSION);
    if !name.to_lowercase().ends_with(&suffix) {
        name.push_str(&suffix);
    }
    name
}

/// Makes sure `path` can be written as a file: its directory exists (or is
/// created), the path is not a directory, and the file can be opened for
/// writing. A file created by the check is removed again.
fn prepare_target(path: &Path) -> Result<(), RecorderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| RecorderError::io(parent, e))?;
    }
    if path.is_dir() {
        return Err(RecorderError::io(
            path,
            std::io::Error::other("target is a directory"),
        ));
    }

    let existed = path.exists();
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| RecorderError::io(path, e))?;
    if !existed {
        std::fs::remove_file(path).map_err(|e| RecorderError::io(path, e))?;
    }
    Ok(())
}

/// Seconds of playback for `frames` frames at `fps`.
pub fn playback_seconds(frames: u64, fps: f64) -> f64 {
    frames as f64 / fps
}

/// Notifications from the capture thread, drained by the UI thread.
#[derive(Debug)]
pub enum RecorderEvent {
    Started {
        region: CaptureRegion,
        width: u32,
        height: u32,
        profile: EncoderProfile,
        path: PathBuf,
    },
    Finished {
        path: PathBuf,
        frames: u64,
        duration_secs: f64,
    },
    /// The session ended on an error. The file is closed and holds `frames`
    /// frames.
    Failed {
        reason: RecorderError,
        path: PathBuf,
        frames: u64,
    },
}

/// Starts recording sessions. One per application.
pub struct Recorder {
    windows: Arc<dyn WindowLister>,
    opener: Box<dyn SinkOpener>,
}

impl Recorder {
    pub fn new(windows: Arc<dyn WindowLister>, opener: Box<dyn SinkOpener>) -> Self {
        Self { windows, opener }
    }

    pub fn windows(&self) -> &Arc<dyn WindowLister> {
        &self.windows
    }

    /// Validates the request, grabs the region once, opens the encoder and spawns
    /// the capture thread.
    ///
    /// Every start-time failure is returned here, before any thread exists.
    /// Later outcomes arrive on `events`.
    pub fn start(
        &self,
        request: &RecordingRequest,
        mut screen: Box<dyn ScreenGrabber>,
        events: Sender<RecorderEvent>,
    ) -> Result<RecordingHandle, RecorderError> {
        let interval = request.validate()?;

        let region = region::resolve(request.selector, screen.as_ref(), self.windows.as_ref())?;
        let first = screen
            .grab(&region)
            .map_err(RecorderError::CaptureFailed)?;
        let (width, height) = frame::output_dimensions(first.width(), first.height());

        let path = request.target_path(Local::now());
        prepare_target(&path)?;

        let settings = EncoderSettings {
            path: path.clone(),
            fps: request.fps,
            width,
            height,
        };
        let encoder = open_with_fallback(self.opener.as_ref(), &settings)?;

        let running = Arc::new(AtomicBool::new(true));
        let session = CaptureSession {
            tracker: RegionTracker::new(request.selector, region),
            windows: Arc::clone(&self.windows),
            screen,
            running: Arc::clone(&running),
            interval,
            width,
            height,
        };

        info!(
            "Recording {} into {} ({}x{}, one frame every {}s, {} fps)",
            region,
            path.display(),
            width,
            height,
            request.interval,
            request.fps
        );

        let started = RecorderEvent::Started {
            region,
            width,
            height,
            profile: encoder.profile,
            path: path.clone(),
        };

        let thread_path = path.clone();
        let fps = request.fps;
        let join = thread::Builder::new()
            .name("timelapse-capture".to_string())
            .spawn(move || {
                let _ = events.send(started);
                let event = session.run(encoder.sink, thread_path, fps);
                let _ = events.send(event);
            })
            .map_err(|e| RecorderError::io(&path, e))?;

        Ok(RecordingHandle {
            running,
            join: Some(join),
            path,
        })
    }
}

/// The UI side of a running session.
pub struct RecordingHandle {
    running: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
    path: PathBuf,
}

impl RecordingHandle {
    /// Asks the capture thread to stop after its current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stops the session and waits until the file is closed.
    pub fn stop_and_wait(mut self) {
        self.stop();
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("Capture thread panicked");
            }
        }
    }
}

/// State owned by the capture thread.
struct CaptureSession {
    tracker: RegionTracker,
    windows: Arc<dyn WindowLister>,
    screen: Box<dyn ScreenGrabber>,
    running: Arc<AtomicBool>,
    interval: Duration,
    width: u32,
    height: u32,
}

impl CaptureSession {
    /// Samples until stopped or failed, then always closes the sink.
    fn run(mut self, mut sink: Box<dyn FrameSink>, path: PathBuf, fps: f64) -> RecorderEvent {
        let mut written = 0;
        let sampled = self.sample(sink.as_mut(), &mut written);
        self.running.store(false, Ordering::Release);

        let finished = sink.finish();

        match (sampled, finished) {
            (Ok(()), Ok(frames)) => {
                info!(
                    "Timelapse saved to {} ({} frames, {:.2}s)",
                    path.display(),
                    frames,
                    playback_seconds(frames, fps)
                );
                RecorderEvent::Finished {
                    path,
                    frames,
                    duration_secs: playback_seconds(frames, fps),
                }
            }
            (Err(reason), finished) => {
                error!("Recording stopped: {}", reason);
                let frames = match finished {
                    Ok(frames) => frames,
                    Err(e) => {
                        warn!("Encoder also failed to close: {}", e);
                        written
                    }
                };
                RecorderEvent::Failed {
                    reason,
                    path,
                    frames,
                }
            }
            (Ok(()), Err(reason)) => {
                error!("Could not finalize {}: {}", path.display(), reason);
                RecorderEvent::Failed {
                    reason,
                    path,
                    frames: written,
                }
            }
        }
    }

    fn sample(&mut self, sink: &mut dyn FrameSink, written: &mut u64) -> Result<(), RecorderError> {
        while self.running.load(Ordering::Acquire) {
            let region = self.tracker.refresh(self.windows.as_ref())?;
            let image = self
                .screen
                .grab(&region)
                .map_err(RecorderError::CaptureFailed)?;
            let frame = frame::normalize(image, self.width, self.height);
            sink.write_frame(&frame)?;
            *written += 1;
            debug!("Tick {}: captured {}", written, region);

            self.pause();
        }
        Ok(())
    }

    /// Sleeps one interval, waking early when the running flag clears.
    fn pause(&self) {
        let deadline = Instant::now() + self.interval;
        while self.running.load(Ordering::Acquire) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(STOP_POLL));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::window::{WindowCaptureError, WindowInfo, WindowListBackend};
    use chrono::TimeZone;
    use image::{RgbImage, RgbaImage};
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc::{self, Receiver};
    use std::sync::Mutex;

    #[derive(Default)]
    struct SinkLog {
        frames: Vec<(u32, u32)>,
        finished: bool,
    }

    struct RecordingSink {
        log: Arc<Mutex<SinkLog>>,
    }

    impl FrameSink for RecordingSink {
        fn write_frame(&mut self, frame: &RgbImage) -> Result<(), RecorderError> {
            self.log.lock().unwrap().frames.push(frame.dimensions());
            Ok(())
        }

        fn finish(self: Box<Self>) -> Result<u64, RecorderError> {
            let mut log = self.log.lock().unwrap();
            log.finished = true;
            Ok(log.frames.len() as u64)
        }
    }

    struct FakeOpener {
        working: bool,
        log: Arc<Mutex<SinkLog>>,
        opened: Arc<AtomicUsize>,
    }

    impl SinkOpener for FakeOpener {
        fn open(
            &self,
            _profile: EncoderProfile,
            _settings: &EncoderSettings,
        ) -> Result<Box<dyn FrameSink>, String> {
            if !self.working {
                return Err("no codec".to_string());
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(RecordingSink {
                log: Arc::clone(&self.log),
            }))
        }
    }

    /// A screen whose grabs are exactly the requested region's size.
    struct FakeScreen {
        display: CaptureRegion,
        grabs: Arc<AtomicUsize>,
    }

    impl ScreenGrabber for FakeScreen {
        fn primary_bounds(&self) -> Result<CaptureRegion, String> {
            Ok(self.display)
        }

        fn grab(&mut self, region: &CaptureRegion) -> Result<RgbaImage, String> {
            self.grabs.fetch_add(1, Ordering::SeqCst);
            Ok(RgbaImage::new(region.width, region.height))
        }
    }

    /// Answers geometry queries from a script, repeating the last answer.
    struct ScriptedWindows {
        title: String,
        answers: Mutex<VecDeque<Option<CaptureRegion>>>,
        last: Mutex<Option<CaptureRegion>>,
    }

    impl ScriptedWindows {
        fn new(answers: Vec<Option<CaptureRegion>>) -> Self {
            Self {
                title: "Editor".to_string(),
                answers: Mutex::new(answers.into()),
                last: Mutex::new(None),
            }
        }
    }

    impl WindowLister for ScriptedWindows {
        fn backend(&self) -> WindowListBackend {
            WindowListBackend::Xcap
        }

        fn list_windows(&self) -> Result<Vec<WindowInfo>, WindowCaptureError> {
            Ok(vec![WindowInfo {
                id: 1,
                app_name: "editor".to_string(),
                title: self.title.clone(),
                x: 0,
                y: 0,
                width: 800,
                height: 600,
                is_minimized: false,
            }])
        }

        fn window_rect(&self, _id: u64) -> Result<Option<CaptureRegion>, WindowCaptureError> {
            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.answers.lock().unwrap().pop_front() {
                *last = next;
            }
            Ok(*last)
        }
    }

    struct Harness {
        recorder: Recorder,
        log: Arc<Mutex<SinkLog>>,
        opened: Arc<AtomicUsize>,
        grabs: Arc<AtomicUsize>,
        dir: PathBuf,
    }

    impl Harness {
        fn new(name: &str, windows: ScriptedWindows, encoder_works: bool) -> Self {
            let log = Arc::new(Mutex::new(SinkLog::default()));
            let opened = Arc::new(AtomicUsize::new(0));
            let opener = FakeOpener {
                working: encoder_works,
                log: Arc::clone(&log),
                opened: Arc::clone(&opened),
            };
            let dir = std::env::temp_dir().join(format!(
                "timelapse-session-{}-{}",
                name,
                std::process::id()
            ));
            let _ = std::fs::remove_dir_all(&dir);

            Self {
                recorder: Recorder::new(Arc::new(windows), Box::new(opener)),
                log,
                opened,
                grabs: Arc::new(AtomicUsize::new(0)),
                dir,
            }
        }

        fn screen(&self) -> Box<dyn ScreenGrabber> {
            Box::new(FakeScreen {
                display: CaptureRegion::new(0, 0, 800, 600),
                grabs: Arc::clone(&self.grabs),
            })
        }

        fn request(&self, fps: f64, interval: f64, selector: RegionSelector) -> RecordingRequest {
            RecordingRequest {
                output_dir: self.dir.clone(),
                filename: "clip".to_string(),
                fps,
                interval,
                selector,
            }
        }

        fn frames_written(&self) -> usize {
            self.log.lock().unwrap().frames.len()
        }

        fn wait_for_frames(&self, count: usize) {
            let deadline = Instant::now() + Duration::from_secs(10);
            while self.frames_written() < count {
                assert!(Instant::now() < deadline, "timed out waiting for frames");
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    fn final_event(rx: &Receiver<RecorderEvent>) -> RecorderEvent {
        loop {
            match rx.recv_timeout(Duration::from_secs(10)) {
                Ok(RecorderEvent::Started { .. }) => continue,
                Ok(event) => return event,
                Err(e) => panic!("no final event: {}", e),
            }
        }
    }

    #[test]
    fn test_zero_fps_is_rejected_before_anything_happens() {
        let harness = Harness::new("zero-fps", ScriptedWindows::new(vec![]), true);
        let (tx, rx) = mpsc::channel();

        let err = harness
            .recorder
            .start(
                &harness.request(0.0, 2.0, RegionSelector::PrimaryDisplay),
                harness.screen(),
                tx,
            )
            .err()
            .unwrap();

        assert!(matches!(err, RecorderError::InvalidParameters(_)));
        assert_eq!(harness.grabs.load(Ordering::SeqCst), 0);
        assert_eq!(harness.opened.load(Ordering::SeqCst), 0);
        assert!(!harness.dir.exists());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_non_positive_or_nan_interval_is_rejected() {
        let harness = Harness::new("bad-interval", ScriptedWindows::new(vec![]), true);
        for interval in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e20] {
            let (tx, _rx) = mpsc::channel();
            let result = harness.recorder.start(
                &harness.request(30.0, interval, RegionSelector::PrimaryDisplay),
                harness.screen(),
                tx,
            );
            assert!(matches!(result, Err(RecorderError::InvalidParameters(_))));
        }
    }

    #[test]
    fn test_three_ticks_make_three_frames() {
        let harness = Harness::new("three-ticks", ScriptedWindows::new(vec![]), true);
        let (tx, rx) = mpsc::channel();

        let handle = harness
            .recorder
            .start(
                &harness.request(30.0, 0.5, RegionSelector::PrimaryDisplay),
                harness.screen(),
                tx,
            )
            .unwrap();
        assert_eq!(handle.path(), harness.dir.join("clip.mp4"));

        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            RecorderEvent::Started {
                region,
                width,
                height,
                ..
            } => {
                assert_eq!(region, CaptureRegion::new(0, 0, 800, 600));
                assert_eq!((width, height), (800, 600));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        harness.wait_for_frames(3);
        handle.stop();

        match final_event(&rx) {
            RecorderEvent::Finished {
                path,
                frames,
                duration_secs,
            } => {
                assert_eq!(path, harness.dir.join("clip.mp4"));
                assert_eq!(frames, 3);
                assert!((duration_secs - 0.1).abs() < 1e-9);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let log = harness.log.lock().unwrap();
        assert!(log.finished);
        assert!(log.frames.iter().all(|&dims| dims == (800, 600)));
    }

    #[test]
    fn test_immediate_stop_closes_the_sink() {
        let harness = Harness::new("immediate-stop", ScriptedWindows::new(vec![]), true);
        let (tx, rx) = mpsc::channel();

        let handle = harness
            .recorder
            .start(
                &harness.request(24.0, 5.0, RegionSelector::PrimaryDisplay),
                harness.screen(),
                tx,
            )
            .unwrap();
        handle.stop();

        match final_event(&rx) {
            RecorderEvent::Finished {
                frames,
                duration_secs,
                ..
            } => {
                assert!(frames <= 1);
                assert_eq!(duration_secs, playback_seconds(frames, 24.0));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(harness.log.lock().unwrap().finished);
    }

    #[test]
    fn test_stop_is_noticed_during_a_long_interval() {
        let harness = Harness::new("long-interval", ScriptedWindows::new(vec![]), true);
        let (tx, rx) = mpsc::channel();

        let handle = harness
            .recorder
            .start(
                &harness.request(30.0, 30.0, RegionSelector::PrimaryDisplay),
                harness.screen(),
                tx,
            )
            .unwrap();
        harness.wait_for_frames(1);

        let stopped_at = Instant::now();
        handle.stop();
        let event = final_event(&rx);

        assert!(stopped_at.elapsed() < Duration::from_secs(1));
        match event {
            RecorderEvent::Finished { frames, .. } => assert_eq!(frames, 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_huge_interval_is_invalid_not_a_panic() {
        let request = RecordingRequest {
            output_dir: PathBuf::from("."),
            filename: String::new(),
            fps: 30.0,
            interval: 1e20,
            selector: RegionSelector::PrimaryDisplay,
        };
        assert!(matches!(
            request.validate(),
            Err(RecorderError::InvalidParameters(_))
        ));
        assert_eq!(
            RecordingRequest { interval: 2.5, ..request }.validate().unwrap(),
            Duration::from_millis(2500)
        );
    }

    #[test]
    fn test_resized_window_keeps_first_frame_size() {
        let first = CaptureRegion::new(0, 0, 800, 600);
        let grown = CaptureRegion::new(20, 20, 1024, 700);
        let windows = ScriptedWindows::new(vec![Some(first), Some(first), Some(grown)]);
        let harness = Harness::new("resize", windows, true);
        let (tx, rx) = mpsc::channel();

        let handle = harness
            .recorder
            .start(
                &harness.request(30.0, 0.001, RegionSelector::Window(1)),
                harness.screen(),
                tx,
            )
            .unwrap();
        harness.wait_for_frames(4);
        handle.stop_and_wait();

        assert!(matches!(final_event(&rx), RecorderEvent::Finished { .. }));
        let log = harness.log.lock().unwrap();
        assert!(log.frames.len() >= 4);
        assert!(log.frames.iter().all(|&dims| dims == (800, 600)));
    }

    #[test]
    fn test_closed_window_ends_session_with_region_lost() {
        let region = CaptureRegion::new(0, 0, 640, 480);
        let windows = ScriptedWindows::new(vec![Some(region), Some(region), Some(region), None]);
        let harness = Harness::new("closed", windows, true);
        let (tx, rx) = mpsc::channel();

        let handle = harness
            .recorder
            .start(
                &harness.request(30.0, 0.001, RegionSelector::Window(1)),
                harness.screen(),
                tx,
            )
            .unwrap();

        match final_event(&rx) {
            RecorderEvent::Failed { reason, frames, .. } => {
                assert!(matches!(reason, RecorderError::RegionLost(_)));
                assert_eq!(frames, 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(!handle.running.load(Ordering::Acquire));
        assert!(harness.log.lock().unwrap().finished);
    }

    #[test]
    fn test_unknown_window_is_refused_at_start() {
        let harness = Harness::new("unknown-window", ScriptedWindows::new(vec![None]), true);
        let (tx, _rx) = mpsc::channel();

        let result = harness.recorder.start(
            &harness.request(30.0, 1.0, RegionSelector::Window(99)),
            harness.screen(),
            tx,
        );

        assert!(matches!(result, Err(RecorderError::RegionUnavailable(_))));
        assert_eq!(harness.opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_encoder_means_no_session() {
        let harness = Harness::new("no-encoder", ScriptedWindows::new(vec![]), false);
        let (tx, rx) = mpsc::channel();

        let result = harness.recorder.start(
            &harness.request(30.0, 1.0, RegionSelector::PrimaryDisplay),
            harness.screen(),
            tx,
        );

        match result {
            Err(RecorderError::EncoderUnavailable { attempts, .. }) => assert_eq!(attempts.len(), 2),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("session should not start"),
        }
        assert!(!harness.dir.join("clip.mp4").exists());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_target_is_directory_is_io_failure() {
        let harness = Harness::new("dir-target", ScriptedWindows::new(vec![]), true);
        std::fs::create_dir_all(harness.dir.join("clip.mp4")).unwrap();
        let (tx, _rx) = mpsc::channel();

        let result = harness.recorder.start(
            &harness.request(30.0, 1.0, RegionSelector::PrimaryDisplay),
            harness.screen(),
            tx,
        );
        assert!(matches!(result, Err(RecorderError::Io { .. })));
        assert_eq!(harness.opened.load(Ordering::SeqCst), 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unwritable_directory_is_io_failure_at_start() {
        let harness = Harness::new("unwritable", ScriptedWindows::new(vec![]), true);
        let (tx, rx) = mpsc::channel();
        let request = RecordingRequest {
            output_dir: PathBuf::from("/proc/self"),
            ..harness.request(30.0, 1.0, RegionSelector::PrimaryDisplay)
        };

        let result = harness.recorder.start(&request, harness.screen(), tx);

        match result {
            Err(RecorderError::Io { path, .. }) => assert_eq!(path, Path::new("/proc/self/clip.mp4")),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("session should not start"),
        }
        assert_eq!(harness.opened.load(Ordering::SeqCst), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_write_check_leaves_no_file_behind() {
        let harness = Harness::new("write-check", ScriptedWindows::new(vec![]), true);
        let target = harness.dir.join("check.mp4");

        prepare_target(&target).unwrap();
        assert!(harness.dir.is_dir());
        assert!(!target.exists());

        std::fs::write(&target, b"old").unwrap();
        prepare_target(&target).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_normalize_filename() {
        let now = Local.with_ymd_and_hms(2026, 10, 19, 8, 5, 3).unwrap();
        assert_eq!(normalize_filename("clip", now), "clip.mp4");
        assert_eq!(normalize_filename("  clip.MP4 ", now), "clip.MP4");
        assert_eq!(normalize_filename("clip.avi", now), "clip.avi.mp4");
        assert_eq!(normalize_filename("", now), "timelapse_20261019_080503.mp4");
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("FPS", " 29.97 ").unwrap(), 29.97);
        assert!(matches!(
            parse_positive("FPS", "abc"),
            Err(RecorderError::InvalidParameters(_))
        ));
        assert!(parse_positive("FPS", "0").is_err());
        assert!(parse_positive("FPS", "-2").is_err());
        assert!(parse_positive("FPS", "inf").is_err());
    }

    #[test]
    fn test_playback_is_independent_of_interval() {
        // one frame every 5 seconds, played at 30 fps
        assert!((playback_seconds(3, 30.0) - 0.1).abs() < 1e-12);
        assert_eq!(playback_seconds(0, 30.0), 0.0);
        assert_eq!(playback_seconds(60, 30.0), 2.0);
    }
}
