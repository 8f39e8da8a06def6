use eframe::egui;

/// Size of the bokashi progress bar
pub const PROGRESS_BAR_SIZE: egui::Vec2 = egui::vec2(200.0, 20.0);

pub struct Components;

impl Components {
    pub fn heading(ui: &mut egui::Ui, text: &str) {
        ui.heading(egui::RichText::new(text).strong());
    }

    pub fn brutalist_card<R>(
        ui: &mut egui::Ui,
        title: &str,
        add_contents: impl FnOnce(&mut egui::Ui) -> R,
    ) -> R {
        let stroke = ui.style().visuals.widgets.noninteractive.bg_stroke;
        let bg = ui.style().visuals.widgets.noninteractive.bg_fill;

        egui::Frame::none()
            .inner_margin(egui::Margin::same(15.0))
            .stroke(stroke)
            .fill(bg)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(egui::RichText::new(title).strong().size(18.0));
                    ui.add_space(8.0);
                    add_contents(ui)
                })
                .inner
            })
            .inner
    }

    pub fn status_banner(
        ui: &mut egui::Ui,
        text: &str,
        bg_color: egui::Color32,
        text_color: egui::Color32,
    ) {
        ui.add_sized(
            [ui.available_width(), 35.0],
            egui::Label::new(
                egui::RichText::new(text)
                    .color(text_color)
                    .background_color(bg_color)
                    .size(16.0)
                    .strong(),
            )
            .wrap_mode(egui::TextWrapMode::Extend),
        );
    }

    /// Grey rounded track filled proportionally, with the percentage below
    pub fn progress_bar(ui: &mut egui::Ui, fraction: f32, fill: egui::Color32, label: &str) {
        ui.vertical(|ui| {
            let (rect, _) = ui.allocate_exact_size(PROGRESS_BAR_SIZE, egui::Sense::hover());
            let rounding = egui::Rounding::same(PROGRESS_BAR_SIZE.y / 2.0);
            let painter = ui.painter();

            painter.rect_filled(rect, rounding, egui::Color32::from_gray(128).gamma_multiply(0.3));

            let filled = egui::Rect::from_min_size(
                rect.min,
                egui::vec2(rect.width() * fraction.clamp(0.0, 1.0), rect.height()),
            );
            if filled.width() > 0.0 {
                painter.rect_filled(filled, rounding, fill);
            }

            ui.add_space(8.0);
            ui.label(label);
        });
    }
}
