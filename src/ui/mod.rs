pub mod dialogs;
pub mod form;
pub mod handlers;
pub mod header;

pub use handlers::{connect_all_handlers, UiComponents};

use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;
use gtk::Orientation;
use std::cell::RefCell;
use std::rc::Rc;

use crate::app::{AppState, ConfigStore};
use crate::capture::{lister_for_session, DesktopSession};
use crate::recorder::{FfmpegOpener, Recorder};

pub fn build_ui(app: &adw::Application) {
    let windows = lister_for_session(&DesktopSession::detect());
    let recorder = Recorder::new(windows, Box::new(FfmpegOpener::locate()));
    let state = Rc::new(RefCell::new(AppState::new(
        ConfigStore::user_default(),
        recorder,
    )));

    let header = header::create_header_bar();
    let form = form::create_form(&state.borrow().config);
    handlers::refresh_window_list(&state, &form);

    let content = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .build();
    content.append(&header.header_bar);
    content.append(&form.grid);

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Screen Timelapse Recorder")
        .content(&content)
        .default_width(520)
        .resizable(false)
        .build();

    let components = Rc::new(UiComponents {
        window: window.clone(),
        header,
        form,
    });

    connect_all_handlers(&state, &components);

    window.present();
}
