//! Window listing backends for different desktop sessions.
//!
//! - Hyprland (via `hyprctl clients -j`)
//! - Sway (via `swaymsg -t get_tree`)
//! - X11, Windows and macOS (via xcap)
//! - everything else: no window geometry, full-screen capture only
//!
//! Each backend returns the unified `WindowInfo` structure.

use std::process::Command;
use std::sync::Arc;

use log::info;
use serde::Deserialize;
use xcap::Window;

use super::desktop::{DesktopSession, WindowListBackend};
use super::region::CaptureRegion;
use super::window::{WindowCaptureError, WindowInfo, WindowLister};

/// Result type for window listing operations.
pub type WindowListResult = Result<Vec<WindowInfo>, WindowCaptureError>;

/// Picks the lister for the current session. Called once at startup.
pub fn lister_for_session(session: &DesktopSession) -> Arc<dyn WindowLister> {
    let backend = session.window_list_backend();
    info!("Detected session: {} (using {} backend)", session, backend);
    lister_for_backend(backend)
}

pub fn lister_for_backend(backend: WindowListBackend) -> Arc<dyn WindowLister> {
    match backend {
        WindowListBackend::Hyprland => Arc::new(HyprlandWindows),
        WindowListBackend::Sway => Arc::new(SwayWindows),
        WindowListBackend::Xcap => Arc::new(XcapWindows),
        WindowListBackend::Unsupported => Arc::new(UnsupportedWindows),
    }
}

fn run_json_command(program: &str, args: &[&str]) -> Result<String, WindowCaptureError> {
    let output = Command::new(program).args(args).output().map_err(|e| {
        WindowCaptureError::EnumerationFailed(format!("Failed to run {}: {}", program, e))
    })?;

    if !output.status.success() {
        return Err(WindowCaptureError::EnumerationFailed(format!(
            "{} returned non-zero exit code",
            program
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Hyprland clients, addressed by their `address` field.
pub struct HyprlandWindows;

#[derive(Debug, Deserialize)]
struct HyprlandClient {
    address: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    title: String,
    at: [i32; 2],
    size: [i32; 2],
    #[serde(default)]
    hidden: bool,
    #[serde(default = "default_true")]
    mapped: bool,
}

fn default_true() -> bool {
    true
}

impl WindowLister for HyprlandWindows {
    fn backend(&self) -> WindowListBackend {
        WindowListBackend::Hyprland
    }

    fn list_windows(&self) -> WindowListResult {
        parse_hyprland_json(&run_json_command("hyprctl", &["clients", "-j"])?)
    }
}

/// Parses Hyprland's JSON output into WindowInfo structures.
fn parse_hyprland_json(json_str: &str) -> WindowListResult {
    let clients: Vec<HyprlandClient> = serde_json::from_str(json_str).map_err(|e| {
        WindowCaptureError::EnumerationFailed(format!("Invalid JSON from hyprctl: {}", e))
    })?;

    Ok(clients
        .into_iter()
        .filter_map(|client| {
            let id = u64::from_str_radix(client.address.trim_start_matches("0x"), 16).ok()?;
            Some(WindowInfo {
                id,
                app_name: client.class,
                title: client.title,
                x: client.at[0],
                y: client.at[1],
                width: client.size[0].max(0) as u32,
                height: client.size[1].max(0) as u32,
                is_minimized: client.hidden || !client.mapped,
            })
        })
        .collect())
}

/// Sway containers that hold a client (those carrying a pid).
pub struct SwayWindows;

#[derive(Debug, Deserialize)]
struct SwayNode {
    id: u64,
    name: Option<String>,
    pid: Option<i64>,
    app_id: Option<String>,
    window_properties: Option<SwayWindowProperties>,
    rect: SwayRect,
    visible: Option<bool>,
    #[serde(default)]
    nodes: Vec<SwayNode>,
    #[serde(default)]
    floating_nodes: Vec<SwayNode>,
}

#[derive(Debug, Deserialize)]
struct SwayWindowProperties {
    class: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SwayRect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl WindowLister for SwayWindows {
    fn backend(&self) -> WindowListBackend {
        WindowListBackend::Sway
    }

    fn list_windows(&self) -> WindowListResult {
        parse_sway_tree(&run_json_command("swaymsg", &["-t", "get_tree"])?)
    }
}

/// Parses Sway's tree JSON to extract window information.
fn parse_sway_tree(json_str: &str) -> WindowListResult {
    let root: SwayNode = serde_json::from_str(json_str).map_err(|e| {
        WindowCaptureError::EnumerationFailed(format!("Invalid JSON from swaymsg: {}", e))
    })?;

    let mut windows = Vec::new();
    collect_sway_windows(root, &mut windows);
    Ok(windows)
}

fn collect_sway_windows(node: SwayNode, windows: &mut Vec<WindowInfo>) {
    if node.pid.is_some() {
        let app_name = node
            .app_id
            .or_else(|| node.window_properties.and_then(|p| p.class))
            .unwrap_or_default();

        windows.push(WindowInfo {
            id: node.id,
            app_name,
            title: node.name.unwrap_or_default(),
            x: node.rect.x,
            y: node.rect.y,
            width: node.rect.width.max(0) as u32,
            height: node.rect.height.max(0) as u32,
            is_minimized: node.visible == Some(false),
        });
    }

    for child in node.nodes.into_iter().chain(node.floating_nodes) {
        collect_sway_windows(child, windows);
    }
}

/// Lists windows using xcap (X11, Windows, macOS).
pub struct XcapWindows;

impl XcapWindows {
    fn info(window: &Window) -> Result<WindowInfo, WindowCaptureError> {
        let info_err = |e: xcap::XCapError| WindowCaptureError::InfoFailed(e.to_string());
        Ok(WindowInfo {
            id: window.id().map_err(info_err)? as u64,
            app_name: window.app_name().unwrap_or_default(),
            title: window.title().unwrap_or_default(),
            x: window.x().map_err(info_err)?,
            y: window.y().map_err(info_err)?,
            width: window.width().map_err(info_err)?,
            height: window.height().map_err(info_err)?,
            is_minimized: window.is_minimized().unwrap_or(false),
        })
    }
}

impl WindowLister for XcapWindows {
    fn backend(&self) -> WindowListBackend {
        WindowListBackend::Xcap
    }

    fn list_windows(&self) -> WindowListResult {
        let windows = Window::all().map_err(|e| {
            WindowCaptureError::EnumerationFailed(format!("xcap failed to list windows: {}", e))
        })?;

        let mut window_infos = Vec::new();

        for window in &windows {
            match Self::info(window) {
                Ok(info) => window_infos.push(info),
                Err(e) => log::debug!("Skipping window: {}", e),
            }
        }

        Ok(window_infos)
    }

    fn window_rect(&self, id: u64) -> Result<Option<CaptureRegion>, WindowCaptureError> {
        let windows = Window::all().map_err(|e| {
            WindowCaptureError::EnumerationFailed(format!("xcap failed to list windows: {}", e))
        })?;

        match windows.iter().find(|w| w.id().ok().map(u64::from) == Some(id)) {
            Some(window) => Ok(Some(Self::info(window)?.rect())),
            None => Ok(None),
        }
    }
}

/// Sessions without window geometry. Lists nothing and refuses lookups so a
/// window selection never silently turns into a full-screen capture.
pub struct UnsupportedWindows;

impl WindowLister for UnsupportedWindows {
    fn backend(&self) -> WindowListBackend {
        WindowListBackend::Unsupported
    }

    fn list_windows(&self) -> WindowListResult {
        Ok(Vec::new())
    }

    fn window_rect(&self, _id: u64) -> Result<Option<CaptureRegion>, WindowCaptureError> {
        Err(WindowCaptureError::Unsupported(
            "this desktop session does not expose window positions".to_string(),
        ))
    }
}
