use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    Wayland,
    X11,
    Unknown,
}

impl std::fmt::Display for DisplayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayServer::Wayland => write!(f, "Wayland"),
            DisplayServer::X11 => write!(f, "X11"),
            DisplayServer::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesktopEnvironment {
    Gnome,
    Kde,
    Hyprland,
    Sway,
    Other(Option<String>),
}

impl std::fmt::Display for DesktopEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesktopEnvironment::Gnome => write!(f, "GNOME"),
            DesktopEnvironment::Kde => write!(f, "KDE Plasma"),
            DesktopEnvironment::Hyprland => write!(f, "Hyprland"),
            DesktopEnvironment::Sway => write!(f, "Sway"),
            DesktopEnvironment::Other(Some(name)) => write!(f, "{}", name),
            DesktopEnvironment::Other(None) => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DesktopSession {
    pub display_server: DisplayServer,
    pub desktop_environment: DesktopEnvironment,
}

impl DesktopSession {
    pub fn detect() -> Self {
        Self::detect_with(|key| env::var(key).ok())
    }

    /// Detects the session from an arbitrary variable lookup.
    pub fn detect_with(var: impl Fn(&str) -> Option<String>) -> Self {
        let display_server = detect_display_server(&var);
        let desktop_environment = detect_desktop_environment(&var);

        Self {
            display_server,
            desktop_environment,
        }
    }

    /// Which window geometry source can serve this session.
    ///
    /// Wayland compositors other than Hyprland and Sway do not expose
    /// window positions to clients, so window capture is unsupported there.
    pub fn window_list_backend(&self) -> WindowListBackend {
        if !cfg!(target_os = "linux") {
            return WindowListBackend::Xcap;
        }

        match (&self.desktop_environment, &self.display_server) {
            (DesktopEnvironment::Hyprland, DisplayServer::Wayland) => WindowListBackend::Hyprland,
            (DesktopEnvironment::Sway, DisplayServer::Wayland) => WindowListBackend::Sway,
            (_, DisplayServer::X11) => WindowListBackend::Xcap,
            _ => WindowListBackend::Unsupported,
        }
    }
}

impl std::fmt::Display for DesktopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.desktop_environment, self.display_server)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowListBackend {
    Hyprland,
    Sway,
    Xcap,
    Unsupported,
}

impl std::fmt::Display for WindowListBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowListBackend::Hyprland => write!(f, "Hyprland (hyprctl)"),
            WindowListBackend::Sway => write!(f, "Sway (swaymsg)"),
            WindowListBackend::Xcap => write!(f, "xcap"),
            WindowListBackend::Unsupported => write!(f, "none (full screen only)"),
        }
    }
}

fn detect_display_server(var: &impl Fn(&str) -> Option<String>) -> DisplayServer {
    if let Some(session_type) = var("XDG_SESSION_TYPE") {
        match session_type.to_lowercase().as_str() {
            "wayland" => return DisplayServer::Wayland,
            "x11" => return DisplayServer::X11,
            _ => {}
        }
    }

    if var("WAYLAND_DISPLAY").is_some() {
        return DisplayServer::Wayland;
    }

    if var("DISPLAY").is_some() {
        return DisplayServer::X11;
    }

    DisplayServer::Unknown
}

fn detect_desktop_environment(var: &impl Fn(&str) -> Option<String>) -> DesktopEnvironment {
    if var("HYPRLAND_INSTANCE_SIGNATURE").is_some() {
        return DesktopEnvironment::Hyprland;
    }

    if var("SWAYSOCK").is_some() {
        return DesktopEnvironment::Sway;
    }

    if let Some(current_desktop) = var("XDG_CURRENT_DESKTOP") {
        for component in current_desktop.to_lowercase().split(':') {
            match component.trim() {
                "gnome" | "unity" | "ubuntu" | "pop" => return DesktopEnvironment::Gnome,
                "kde" | "plasma" | "kde-plasma" => return DesktopEnvironment::Kde,
                "hyprland" => return DesktopEnvironment::Hyprland,
                "sway" => return DesktopEnvironment::Sway,
                _ => continue,
            }
        }

        if !current_desktop.is_empty() {
            return DesktopEnvironment::Other(Some(current_desktop));
        }
    }

    if var("KDE_FULL_SESSION").is_some() {
        return DesktopEnvironment::Kde;
    }

    if var("GNOME_DESKTOP_SESSION_ID").is_some() {
        return DesktopEnvironment::Gnome;
    }

    DesktopEnvironment::Other(None)
}
