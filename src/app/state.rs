//! Application state shared by the UI handlers.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use log::{info, warn};

use super::config::{Config, ConfigStore};
use crate::capture::{list_capture_choices, selector_for_name, ScreenGrabber, WindowChoice};
use crate::recorder::{parse_positive, Recorder, RecorderError, RecorderEvent, RecordingHandle, RecordingRequest};

/// What the form holds when Start is pressed.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    pub output_dir: String,
    pub fps: String,
    pub interval: String,
    pub filename: String,
    pub window: String,
}

/// Main application state
pub struct AppState {
    pub config: Config,
    store: ConfigStore,
    recorder: Recorder,
    /// Entries of the capture target picker, `Entire Screen` first
    pub choices: Vec<WindowChoice>,
    session: Option<RecordingHandle>,
    events: Option<Receiver<RecorderEvent>>,
}

impl AppState {
    pub fn new(store: ConfigStore, recorder: Recorder) -> Self {
        let config = store.load();
        info!("Loaded settings from {}", store.file().display());

        Self {
            config,
            store,
            recorder,
            choices: Vec::new(),
            session: None,
            events: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Re-lists windows and returns the index of the saved window, or 0
    /// (`Entire Screen`) when it is no longer open.
    pub fn refresh_windows(&mut self) -> usize {
        self.choices = list_capture_choices(self.recorder.windows().as_ref());
        self.choices
            .iter()
            .position(|c| c.label == self.config.window)
            .unwrap_or(0)
    }

    /// Remembers a newly browsed folder. Saved only when the numeric fields
    /// currently hold valid values.
    pub fn remember_folder(&mut self, folder: PathBuf, values: &FormValues) {
        self.config.path = folder;

        let (Ok(fps), Ok(interval)) = (
            parse_positive("FPS", &values.fps),
            parse_positive("Interval", &values.interval),
        ) else {
            return;
        };

        self.config.fps = fps;
        self.config.interval = interval;
        self.config.window = values.window.clone();
        self.save_config();
    }

    /// Validates the form, saves it and starts a session.
    pub fn start(
        &mut self,
        values: &FormValues,
        screen: Box<dyn ScreenGrabber>,
    ) -> Result<PathBuf, RecorderError> {
        if self.is_recording() {
            return Err(RecorderError::InvalidParameters(
                "a recording is already running".to_string(),
            ));
        }

        let fps = parse_positive("FPS", &values.fps)?;
        let interval = parse_positive("Interval", &values.interval)?;
        let output_dir = PathBuf::from(values.output_dir.trim());
        let output_dir = std::path::absolute(&output_dir).unwrap_or(output_dir);

        self.config = Config {
            path: output_dir.clone(),
            fps,
            interval,
            window: values.window.clone(),
        };
        self.save_config();

        let selector = selector_for_name(self.recorder.windows().as_ref(), &values.window)?;
        let request = RecordingRequest {
            output_dir,
            filename: values.filename.clone(),
            fps,
            interval,
            selector,
        };

        let (tx, rx) = mpsc::channel();
        let handle = self.recorder.start(&request, screen, tx)?;
        let path = handle.path().to_path_buf();

        self.session = Some(handle);
        self.events = Some(rx);
        Ok(path)
    }

    pub fn stop(&self) {
        if let Some(session) = &self.session {
            info!("Stop requested for {}", session.path().display());
            session.stop();
        }
    }

    /// Takes every pending event. A session is forgotten once its final event
    /// has been seen. A capture thread that vanished without one (it
    /// panicked) is reported as a failure so the UI can recover.
    pub fn drain_events(&mut self) -> Vec<RecorderEvent> {
        let mut drained = Vec::new();
        let Some(rx) = &self.events else {
            return drained;
        };

        let mut ended = false;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    if matches!(
                        event,
                        RecorderEvent::Finished { .. } | RecorderEvent::Failed { .. }
                    ) {
                        ended = true;
                    }
                    drained.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !ended {
                        let path = self
                            .session
                            .as_ref()
                            .map(|s| s.path().to_path_buf())
                            .unwrap_or_default();
                        warn!("Capture thread for {} ended without a result", path.display());
                        drained.push(RecorderEvent::Failed {
                            reason: RecorderError::CaptureFailed(
                                "the capture thread stopped unexpectedly".to_string(),
                            ),
                            path,
                            frames: 0,
                        });
                    }
                    ended = true;
                    break;
                }
            }
        }

        if ended {
            self.events = None;
            if let Some(session) = self.session.take() {
                session.stop_and_wait();
            }
        }
        drained
    }

    /// Stops any session and waits for its file to close.
    pub fn shutdown(&mut self) {
        self.events = None;
        if let Some(session) = self.session.take() {
            session.stop_and_wait();
        }
    }

    fn save_config(&self) {
        if let Err(e) = self.store.save(&self.config) {
            warn!("Could not save settings to {}: {}", self.store.file().display(), e);
        }
    }
}
