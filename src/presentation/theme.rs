use crate::domain::bokashi::SiteColour;
use crate::domain::models::{LinkState, MessageSeverity};
use eframe::egui;

pub struct BrutalistPalette {
    pub bg: egui::Color32,
    pub fg: egui::Color32,
    pub stroke: egui::Color32,
    pub accent_yellow: egui::Color32,
    pub accent_green: egui::Color32,
    pub accent_cyan: egui::Color32,
    pub accent_red: egui::Color32,
}

impl BrutalistPalette {
    pub fn new(is_dark: bool) -> Self {
        if is_dark {
            Self {
                bg: egui::Color32::from_rgb(25, 25, 25),
                fg: egui::Color32::WHITE,
                stroke: egui::Color32::WHITE,
                accent_yellow: egui::Color32::from_rgb(255, 200, 0),
                accent_green: egui::Color32::from_rgb(0, 200, 90),
                accent_cyan: egui::Color32::from_rgb(0, 255, 255),
                accent_red: egui::Color32::from_rgb(255, 80, 80),
            }
        } else {
            Self {
                bg: egui::Color32::from_rgb(245, 245, 245),
                fg: egui::Color32::BLACK,
                stroke: egui::Color32::BLACK,
                accent_yellow: egui::Color32::from_rgb(255, 220, 0),
                accent_green: egui::Color32::from_rgb(0, 180, 70),
                accent_cyan: egui::Color32::from_rgb(0, 200, 255),
                accent_red: egui::Color32::from_rgb(230, 40, 40),
            }
        }
    }

    pub fn site(&self, colour: SiteColour) -> egui::Color32 {
        match colour {
            SiteColour::Red => self.accent_red,
            SiteColour::Green => self.accent_green,
        }
    }

    /// Banner background and text colour for a link state
    pub fn link(&self, state: LinkState) -> (egui::Color32, egui::Color32) {
        match state {
            LinkState::Subscribed => (self.accent_green, egui::Color32::BLACK),
            LinkState::Idle => (egui::Color32::from_gray(100), egui::Color32::WHITE),
            _ => (self.accent_yellow, egui::Color32::BLACK),
        }
    }

    pub fn severity(&self, severity: MessageSeverity) -> egui::Color32 {
        match severity {
            MessageSeverity::Info => self.fg,
            MessageSeverity::Success => self.accent_green,
            MessageSeverity::Warning => self.accent_yellow,
            MessageSeverity::Error => self.accent_red,
        }
    }
}

pub fn configure_neubrutalism(ctx: &egui::Context, is_dark: bool) {
    let mut style = (*ctx.style()).clone();
    let palette = BrutalistPalette::new(is_dark);

    style
        .text_styles
        .iter_mut()
        .for_each(|(text_style, font_id)| {
            font_id.size = match text_style {
                egui::TextStyle::Heading => 28.0,
                egui::TextStyle::Body => 15.0,
                egui::TextStyle::Button => 15.0,
                _ => font_id.size,
            };
        });

    style.spacing.item_spacing = egui::vec2(12.0, 12.0);
    style.spacing.button_padding = egui::vec2(16.0, 10.0);

    let widgets = &mut style.visuals.widgets;
    for (visuals, width) in [
        (&mut widgets.noninteractive, 2.0_f32),
        (&mut widgets.inactive, 2.0),
        (&mut widgets.hovered, 2.5),
        (&mut widgets.active, 3.0),
    ] {
        visuals.bg_stroke = egui::Stroke::new(width, palette.stroke);
        visuals.rounding = egui::Rounding::ZERO;
    }

    widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, palette.fg);
    widgets.noninteractive.bg_fill = palette.bg;
    widgets.inactive.bg_fill = if is_dark {
        egui::Color32::from_gray(30)
    } else {
        egui::Color32::WHITE
    };
    widgets.inactive.fg_stroke = egui::Stroke::new(1.0, palette.fg);
    widgets.hovered.bg_fill = palette.accent_yellow;
    widgets.hovered.fg_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);
    widgets.hovered.expansion = 2.0;
    widgets.active.bg_fill = palette.accent_green;
    widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);

    style.visuals.selection.stroke = egui::Stroke::new(1.0, palette.stroke);
    style.visuals.selection.bg_fill = palette.accent_cyan;

    style.visuals.window_rounding = egui::Rounding::ZERO;
    style.visuals.window_stroke = egui::Stroke::new(2.0, palette.stroke);
    style.visuals.window_shadow = egui::Shadow {
        offset: egui::vec2(8.0, 8.0),
        blur: 0.0,
        spread: 0.0,
        color: palette.stroke,
    };
    style.visuals.window_fill = palette.bg;
    style.visuals.panel_fill = palette.bg;
    style.visuals.override_text_color = Some(palette.fg);

    ctx.set_style(style);
}
