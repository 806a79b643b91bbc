use gtk4 as gtk;

use gtk::{Align, Orientation};
use gtk4::prelude::*;

use crate::app::{Config, FormValues};
use crate::capture::{WindowChoice, ENTIRE_SCREEN};

/// Filename offered on startup.
const DEFAULT_FILENAME: &str = "timelapse.mp4";

pub struct FormComponents {
    pub grid: gtk::Grid,
    pub path_entry: gtk::Entry,
    pub browse_btn: gtk::Button,
    pub window_dropdown: gtk::DropDown,
    pub refresh_btn: gtk::Button,
    pub fps_entry: gtk::Entry,
    pub interval_entry: gtk::Entry,
    pub filename_entry: gtk::Entry,
}

fn row_label(text: &str) -> gtk::Label {
    let label = gtk::Label::builder().label(text).halign(Align::End).build();
    label.add_css_class("dim-label");
    label
}

fn linked(first: &impl IsA<gtk::Widget>, second: &impl IsA<gtk::Widget>) -> gtk::Box {
    let row = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .build();
    row.add_css_class("linked");
    row.append(first);
    row.append(second);
    row
}

pub fn create_form(config: &Config) -> FormComponents {
    let path_entry = gtk::Entry::builder()
        .text(config.path.to_string_lossy().as_ref())
        .hexpand(true)
        .build();
    let browse_btn = gtk::Button::builder()
        .icon_name("folder-open-symbolic")
        .tooltip_text("Browse")
        .build();

    let window_dropdown = gtk::DropDown::builder()
        .model(&gtk::StringList::new(&[ENTIRE_SCREEN]))
        .hexpand(true)
        .build();
    let refresh_btn = gtk::Button::builder()
        .icon_name("view-refresh-symbolic")
        .tooltip_text("Refresh window list")
        .build();

    let fps_entry = gtk::Entry::builder()
        .text(config.fps.to_string())
        .input_purpose(gtk::InputPurpose::Number)
        .build();
    let interval_entry = gtk::Entry::builder()
        .text(config.interval.to_string())
        .input_purpose(gtk::InputPurpose::Number)
        .build();
    let filename_entry = gtk::Entry::builder().text(DEFAULT_FILENAME).build();

    let grid = gtk::Grid::builder()
        .row_spacing(12)
        .column_spacing(12)
        .margin_top(18)
        .margin_bottom(18)
        .margin_start(18)
        .margin_end(18)
        .build();

    grid.attach(&row_label("Output Folder"), 0, 0, 1, 1);
    grid.attach(&linked(&path_entry, &browse_btn), 1, 0, 1, 1);
    grid.attach(&row_label("Capture Window"), 0, 1, 1, 1);
    grid.attach(&linked(&window_dropdown, &refresh_btn), 1, 1, 1, 1);
    grid.attach(&row_label("Output FPS"), 0, 2, 1, 1);
    grid.attach(&fps_entry, 1, 2, 1, 1);
    grid.attach(&row_label("Capture every N seconds"), 0, 3, 1, 1);
    grid.attach(&interval_entry, 1, 3, 1, 1);
    grid.attach(&row_label("Output filename"), 0, 4, 1, 1);
    grid.attach(&filename_entry, 1, 4, 1, 1);

    FormComponents {
        grid,
        path_entry,
        browse_btn,
        window_dropdown,
        refresh_btn,
        fps_entry,
        interval_entry,
        filename_entry,
    }
}

impl FormComponents {
    /// Replaces the picker entries and selects `selected`.
    pub fn set_window_choices(&self, choices: &[WindowChoice], selected: usize) {
        let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();
        self.window_dropdown
            .set_model(Some(&gtk::StringList::new(&labels)));
        self.window_dropdown.set_selected(selected as u32);
    }

    /// Current field contents, with the picker resolved to its label.
    pub fn values(&self, choices: &[WindowChoice]) -> FormValues {
        let window = choices
            .get(self.window_dropdown.selected() as usize)
            .map(|c| c.label.clone())
            .unwrap_or_else(|| ENTIRE_SCREEN.to_string());

        FormValues {
            output_dir: self.path_entry.text().to_string(),
            fps: self.fps_entry.text().to_string(),
            interval: self.interval_entry.text().to_string(),
            filename: self.filename_entry.text().to_string(),
            window,
        }
    }
}
