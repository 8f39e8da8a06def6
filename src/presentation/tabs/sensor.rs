use crate::presentation::app::SmartBokashiApp;
use crate::presentation::components::Components;
use crate::presentation::theme::BrutalistPalette;
use eframe::egui;

pub fn render(app: &mut SmartBokashiApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Capteur Bokashi");
    ui.add_space(20.0);

    ui_link_panel(app, ui);
    ui.add_space(15.0);

    ui_reading_panel(app, ui);
}

fn ui_link_panel(app: &SmartBokashiApp, ui: &mut egui::Ui) {
    Components::brutalist_card(ui, "Sensor Link", |ui| {
        let palette = BrutalistPalette::new(app.is_dark_mode);
        let (bg_color, text_color) = palette.link(app.session.link_state);
        Components::status_banner(ui, app.session.link_state.label(), bg_color, text_color);

        if let Some(msg) = &app.session.status_message {
            ui.add_space(8.0);
            ui.label(
                egui::RichText::new(&msg.message)
                    .color(palette.severity(msg.severity))
                    .strong(),
            );
        }
    });
}

fn ui_reading_panel(app: &SmartBokashiApp, ui: &mut egui::Ui) {
    let reading = app.session.reading();

    Components::brutalist_card(ui, "Live Reading", |ui| {
        if reading.has_values() {
            ui.label(
                egui::RichText::new(format!("Température: {}°C", reading.temperature)).size(22.0),
            );
            ui.label(egui::RichText::new(format!("Humidité: {}%", reading.humidity)).size(22.0));
        } else {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Waiting for sensor data...");
            });
        }
    });
}
