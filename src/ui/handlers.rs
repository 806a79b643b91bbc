use gtk::glib;
use gtk4 as gtk;
use libadwaita as adw;
use log::{debug, error, info, warn};

use gtk4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::app::AppState;
use crate::capture::XcapScreen;
use crate::recorder::RecorderEvent;
use crate::ui::dialogs::{finished_detail, show_error, show_message, started_detail};
use crate::ui::form::FormComponents;
use crate::ui::header::HeaderComponents;

/// How often the UI thread looks for recorder events.
const EVENT_POLL: Duration = Duration::from_millis(200);

pub struct UiComponents {
    pub window: adw::ApplicationWindow,
    pub header: HeaderComponents,
    pub form: FormComponents,
}

impl UiComponents {
    /// Start is only offered while idle, Stop only while recording. The
    /// form is locked during a session.
    pub fn set_recording(&self, recording: bool) {
        self.header.start_btn.set_sensitive(!recording);
        self.header.stop_btn.set_sensitive(recording);
        self.form.grid.set_sensitive(!recording);
    }
}

pub fn refresh_window_list(state: &Rc<RefCell<AppState>>, form: &FormComponents) {
    let mut s = state.borrow_mut();
    let selected = s.refresh_windows();
    form.set_window_choices(&s.choices, selected);
    debug!("Window picker holds {} entries", s.choices.len());
}

pub fn connect_start_handler(state: &Rc<RefCell<AppState>>, components: &Rc<UiComponents>) {
    components.header.start_btn.connect_clicked({
        let state = state.clone();
        let components = components.clone();
        move |_| {
            let values = components.form.values(&state.borrow().choices);
            let result = state
                .borrow_mut()
                .start(&values, Box::new(XcapScreen));

            match result {
                Ok(path) => {
                    info!("Recording to {}", path.display());
                    components.set_recording(true);
                }
                Err(e) => {
                    error!("Could not start recording: {}", e);
                    show_error(&components.window, &e);
                }
            }
        }
    });
}

pub fn connect_stop_handler(state: &Rc<RefCell<AppState>>, components: &Rc<UiComponents>) {
    components.header.stop_btn.connect_clicked({
        let state = state.clone();
        move |btn| {
            state.borrow().stop();
            btn.set_sensitive(false);
        }
    });
}

pub fn connect_browse_handler(state: &Rc<RefCell<AppState>>, components: &Rc<UiComponents>) {
    components.form.browse_btn.connect_clicked({
        let state = state.clone();
        let components = components.clone();
        move |_| {
            let state = state.clone();
            let components = components.clone();
            glib::spawn_future_local(async move {
                let dialog = gtk::FileDialog::new();
                let current = gtk::gio::File::for_path(components.form.path_entry.text().as_str());
                dialog.set_initial_folder(Some(&current));

                match dialog.select_folder_future(Some(&components.window)).await {
                    Ok(folder) => {
                        let Some(folder_path) = folder.path() else {
                            warn!("Selected folder has no local path");
                            return;
                        };
                        components
                            .form
                            .path_entry
                            .set_text(&folder_path.to_string_lossy());
                        let values = components.form.values(&state.borrow().choices);
                        state.borrow_mut().remember_folder(folder_path, &values);
                    }
                    Err(e) => debug!("Folder selection cancelled: {}", e),
                }
            });
        }
    });
}

pub fn connect_refresh_handler(state: &Rc<RefCell<AppState>>, components: &Rc<UiComponents>) {
    components.form.refresh_btn.connect_clicked({
        let state = state.clone();
        let components = components.clone();
        move |_| refresh_window_list(&state, &components.form)
    });
}

fn handle_event(components: &UiComponents, event: RecorderEvent) {
    match event {
        RecorderEvent::Started {
            region,
            width,
            height,
            profile,
            path,
        } => {
            info!("Capturing {} with {}", region, profile);
            show_message(
                &components.window,
                "Recording started",
                &started_detail(width, height, &region, profile, &path),
            );
        }
        RecorderEvent::Finished {
            path,
            frames,
            duration_secs,
        } => {
            info!("Saved {} ({} frames)", path.display(), frames);
            components.set_recording(false);
            show_message(
                &components.window,
                "Recording saved",
                &finished_detail(&path, frames, duration_secs),
            );
        }
        RecorderEvent::Failed {
            reason,
            path,
            frames,
        } => {
            error!(
                "Recording to {} ended after {} frames: {}",
                path.display(),
                frames,
                reason
            );
            components.set_recording(false);
            show_error(&components.window, &reason);
        }
    }
}

pub fn watch_recorder_events(state: &Rc<RefCell<AppState>>, components: &Rc<UiComponents>) {
    glib::timeout_add_local(EVENT_POLL, {
        let state = state.clone();
        let components = components.clone();
        move || {
            let events = state.borrow_mut().drain_events();
            for event in events {
                handle_event(&components, event);
            }
            glib::ControlFlow::Continue
        }
    });
}

pub fn connect_close_handler(state: &Rc<RefCell<AppState>>, components: &Rc<UiComponents>) {
    components.window.connect_close_request({
        let state = state.clone();
        move |_| {
            state.borrow_mut().shutdown();
            glib::Propagation::Proceed
        }
    });
}

pub fn connect_all_handlers(state: &Rc<RefCell<AppState>>, components: &Rc<UiComponents>) {
    connect_start_handler(state, components);
    connect_stop_handler(state, components);
    connect_browse_handler(state, components);
    connect_refresh_handler(state, components);
    connect_close_handler(state, components);
    watch_recorder_events(state, components);
}
