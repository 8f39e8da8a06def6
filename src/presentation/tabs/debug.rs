use crate::presentation::app::SmartBokashiApp;
use crate::presentation::components::Components;
use crate::presentation::theme::BrutalistPalette;
use eframe::egui;

pub fn render(app: &mut SmartBokashiApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Debug & Internal State");
    ui.add_space(20.0);

    let palette = BrutalistPalette::new(app.is_dark_mode);

    Components::brutalist_card(ui, "Bluetooth Engine Status", |ui| {
        egui::Grid::new("link_grid")
            .spacing([20.0, 5.0])
            .show(ui, |ui| {
                ui.label("State:");
                ui.label(egui::RichText::new(app.session.link_state.label()).strong());
                ui.end_row();

                ui.label("Target:");
                ui.label(&app.target_name);
                ui.end_row();

                let reading = app.session.reading();
                ui.label("Raw reading:");
                ui.label(format!("{:?}, {:?}", reading.temperature, reading.humidity));
                ui.end_row();
            });
    });

    ui.add_space(10.0);

    Components::brutalist_card(ui, "Peripherals Seen", |ui| {
        if app.session.scanned_devices.is_empty() {
            ui.label("None yet");
        }
        egui::ScrollArea::vertical()
            .id_salt("scan_results")
            .max_height(160.0)
            .show(ui, |ui| {
                for device in &app.session.scanned_devices {
                    let rssi = device
                        .rssi
                        .map(|r| format!("{} dBm", r))
                        .unwrap_or_else(|| "?".to_string());
                    let text = format!("{} ({}) [{}]", device.display_name(), rssi, device.id);
                    if device.name.as_deref() == Some(app.target_name.as_str()) {
                        ui.label(egui::RichText::new(text).strong());
                    } else {
                        ui.label(text);
                    }
                }
            });
    });

    ui.add_space(10.0);

    Components::brutalist_card(ui, "Recent Messages", |ui| {
        egui::ScrollArea::vertical()
            .id_salt("recent_messages")
            .max_height(200.0)
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for msg in &app.session.recent_messages {
                    ui.label(
                        egui::RichText::new(&msg.message).color(palette.severity(msg.severity)),
                    );
                }
            });
    });
}
