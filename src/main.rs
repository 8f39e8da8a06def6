mod domain;
mod infrastructure;
mod presentation;

use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 720.0])
            .with_title("Smart Bokashi"),
        ..Default::default()
    };

    eframe::run_native(
        "Smart Bokashi",
        options,
        Box::new(|cc| Ok(Box::new(presentation::app::SmartBokashiApp::new(cc)))),
    )
}
