use crate::domain::bokashi::{self, BokashiSite};
use crate::domain::models::{AppEvent, MessageSeverity, StatusMessage, Tab};
use crate::domain::settings::SettingsService;
use crate::infrastructure::bluetooth::BluetoothService;
use crate::infrastructure::logging::{self, LoggingGuard};
use crate::presentation::session::LinkSession;
use crate::presentation::{tabs, theme};
use eframe::egui;
use tokio::sync::mpsc;
use tracing::{error, info};

pub struct SmartBokashiApp {
    // Sensor link, as seen from the UI thread
    pub(crate) session: LinkSession,
    pub(crate) event_rx: mpsc::UnboundedReceiver<AppEvent>,
    pub(crate) target_name: String,

    // Bins
    pub(crate) sites: Vec<BokashiSite>,
    pub(crate) selected_site: Option<usize>,

    // UI State
    pub(crate) selected_tab: Tab,
    pub(crate) is_dark_mode: bool,

    // Logging guard
    pub(crate) _logging_guard: Option<LoggingGuard>,
}

impl SmartBokashiApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings_service = SettingsService::load();
        let settings = settings_service.get().clone();

        let logging_guard = logging::init_logger(&settings.log_settings)
            .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
            .ok();

        info!("Starting Smart Bokashi");
        if let Some(path) = settings_service.path() {
            info!("Settings file: {}", path.display());
        }

        theme::configure_neubrutalism(&cc.egui_ctx, settings.dark_mode);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        spawn_bluetooth_thread(event_tx, settings.target_name.clone(), cc.egui_ctx.clone());

        Self {
            session: LinkSession::new(),
            event_rx,
            target_name: settings.target_name,
            sites: bokashi::sample_sites(),
            selected_site: None,
            selected_tab: Tab::Sensor,
            is_dark_mode: settings.dark_mode,
            _logging_guard: logging_guard,
        }
    }
}

/// Run the sensor link on its own thread with a single-threaded runtime.
/// Everything it reports reaches the UI through `event_tx`.
fn spawn_bluetooth_thread(
    event_tx: mpsc::UnboundedSender<AppEvent>,
    target_name: String,
    ctx: egui::Context,
) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create tokio runtime for Bluetooth: {}", e);
                return;
            }
        };

        rt.block_on(async move {
            let service = BluetoothService::new(event_tx.clone(), &target_name);
            if let Err(e) = service.run().await {
                error!("Bluetooth link stopped: {}", e);
                let _ = event_tx.send(AppEvent::LogMessage(StatusMessage {
                    message: format!("Bluetooth unavailable: {}", e),
                    severity: MessageSeverity::Error,
                }));
                ctx.request_repaint();
            }
        });
    });
}

impl eframe::App for SmartBokashiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // All published state is written here, on the UI thread
        while let Ok(event) = self.event_rx.try_recv() {
            self.session.apply(event);
        }

        ctx.request_repaint();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.selectable_value(&mut self.selected_tab, Tab::Sensor, "Capteur");
                ui.selectable_value(&mut self.selected_tab, Tab::Bins, "Bokashis");
                ui.selectable_value(&mut self.selected_tab, Tab::Debug, "Debug");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let switch_icon = if self.is_dark_mode {
                        "☀ Light"
                    } else {
                        "🌙 Dark"
                    };
                    if ui.button(switch_icon).clicked() {
                        self.is_dark_mode = !self.is_dark_mode;
                        theme::configure_neubrutalism(ctx, self.is_dark_mode);
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.set_max_width(800.0);
                    ui.add_space(20.0);

                    match self.selected_tab {
                        Tab::Sensor => tabs::sensor::render(self, ui),
                        Tab::Bins => tabs::bins::render(self, ui),
                        Tab::Debug => tabs::debug::render(self, ui),
                    }

                    ui.add_space(50.0);
                });
            });
        });
    }
}
