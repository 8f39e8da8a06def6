use crate::domain::bokashi::{self, BokashiSite};
use crate::presentation::app::SmartBokashiApp;
use crate::presentation::components::Components;
use crate::presentation::theme::BrutalistPalette;
use eframe::egui;

pub fn render(app: &mut SmartBokashiApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Carte Bokashi");
    ui.add_space(10.0);

    if let Some((lat, lon)) = bokashi::centre(&app.sites, app.selected_site) {
        ui.label(format!("Centre: {:.5}, {:.5}", lat, lon));
    }
    ui.add_space(10.0);

    let palette = BrutalistPalette::new(app.is_dark_mode);

    Components::brutalist_card(ui, "Liste des Bokashis", |ui| {
        for (index, site) in app.sites.iter().enumerate() {
            let colour = palette.site(site.colour());
            let title = egui::RichText::new(format!("{} {}", site.logo.glyph(), site.title))
                .color(colour)
                .strong();

            let selected = app.selected_site == Some(index);
            if ui.selectable_label(selected, title).clicked() {
                app.selected_site = if selected { None } else { Some(index) };
            }
            Components::progress_bar(ui, site.fill_fraction(), colour, &site.percent_label());
            ui.separator();
        }
    });

    if let Some(site) = app.selected_site.and_then(|i| app.sites.get(i)) {
        ui.add_space(15.0);
        ui_site_detail(site, &palette, ui);
    }
}

fn ui_site_detail(site: &BokashiSite, palette: &BrutalistPalette, ui: &mut egui::Ui) {
    Components::brutalist_card(ui, &site.title, |ui| {
        ui.label(format!("Taux d'avancement de {} :", site.title));
        Components::progress_bar(
            ui,
            site.fill_fraction(),
            palette.site(site.colour()),
            &site.percent_label(),
        );
        ui.label(format!("{:.6}, {:.6}", site.latitude, site.longitude));
    });
}
