//! Application module
//!
//! Persistent settings and the state the UI drives recordings through.

pub mod config;
mod state;

pub use config::{Config, ConfigStore};
pub use state::{AppState, FormValues};
