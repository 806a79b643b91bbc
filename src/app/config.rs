//! Flat `key=value` settings file.
//!
//! Four keys: `path`, `fps`, `interval`, `window`. Order is irrelevant,
//! unknown keys are ignored and missing or malformed values take their
//! default. Loading never fails.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::capture::ENTIRE_SCREEN;

pub const CONFIG_DIR_NAME: &str = "timelapse-recorder";
pub const CONFIG_FILE_NAME: &str = "config.txt";

pub const DEFAULT_FPS: f64 = 30.0;
pub const DEFAULT_INTERVAL: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Output directory
    pub path: PathBuf,
    /// Container frame rate
    pub fps: f64,
    /// Seconds between grabs
    pub interval: f64,
    /// Title of the window to record, or `Entire Screen`
    pub window: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: default_output_dir(),
            fps: DEFAULT_FPS,
            interval: DEFAULT_INTERVAL,
            window: ENTIRE_SCREEN.to_string(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Parses the file contents; never fails.
    pub fn parse(text: &str) -> Self {
        let mut config = Self::default();

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            // Paths and window titles are kept verbatim; titles may carry
            // leading or trailing spaces.
            match key.trim() {
                "path" if !value.trim().is_empty() => config.path = PathBuf::from(value),
                "fps" => config.fps = parse_positive_or(value.trim(), DEFAULT_FPS),
                "interval" => config.interval = parse_positive_or(value.trim(), DEFAULT_INTERVAL),
                "window" if !value.trim().is_empty() => config.window = value.to_string(),
                other => debug!("Ignoring config key '{}'", other),
            }
        }

        config
    }

    pub fn render(&self) -> String {
        format!(
            "path={}\nfps={}\ninterval={}\nwindow={}\n",
            self.path.display(),
            self.fps,
            self.interval,
            self.window
        )
    }
}

fn parse_positive_or(value: &str, default: f64) -> f64 {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => default,
    }
}

/// Where the settings live on disk.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    file: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::user_default()
    }
}

impl ConfigStore {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    /// `<config dir>/timelapse-recorder/config.txt`, or `./config.txt` when the
    /// platform has no config directory.
    pub fn user_default() -> Self {
        let file = dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        Self::new(file)
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn load(&self) -> Config {
        match fs::read_to_string(&self.file) {
            Ok(text) => Config::parse(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Config::default(),
            Err(e) => {
                warn!("Could not read {}: {}", self.file.display(), e);
                Config::default()
            }
        }
    }

    /// Writes a sibling temp file and renames it over the config, so readers
    /// see either the old or the new record.
    pub fn save(&self, config: &Config) -> io::Result<()> {
        if let Some(parent) = self.file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = self.file.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, config.render())?;
        fs::rename(&tmp, &self.file)?;
        debug!("Saved settings to {}", self.file.display());
        Ok(())
    }
}
