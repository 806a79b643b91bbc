use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;

pub struct HeaderComponents {
    pub header_bar: adw::HeaderBar,
    pub start_btn: gtk::Button,
    pub stop_btn: gtk::Button,
}

pub fn create_header_bar() -> HeaderComponents {
    let start_btn = gtk::Button::builder()
        .label("Start Recording")
        .icon_name("media-record-symbolic")
        .tooltip_text("Start Recording")
        .build();
    start_btn.add_css_class("suggested-action");

    let stop_btn = gtk::Button::builder()
        .label("Stop Recording")
        .icon_name("media-playback-stop-symbolic")
        .tooltip_text("Stop Recording")
        .sensitive(false)
        .build();
    stop_btn.add_css_class("destructive-action");

    let title = adw::WindowTitle::new("Screen Timelapse Recorder", "");

    let header_bar = adw::HeaderBar::builder().title_widget(&title).build();
    header_bar.pack_start(&start_btn);
    header_bar.pack_end(&stop_btn);

    HeaderComponents {
        header_bar,
        start_btn,
        stop_btn,
    }
}
