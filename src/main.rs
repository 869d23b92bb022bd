mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::RustyGastosApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Invalid configuration, using defaults: {e:#}");
            (AppConfig::default(), Some(format!("Configuración inválida: {e:#}")))
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Gastos – Análisis de gastos de mantenimiento",
        options,
        Box::new(move |cc| {
            // Install image loaders so egui can render png/jpg from file:// URIs.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            let mut app = RustyGastosApp::new(config);
            if let Some(msg) = config_error {
                app.state.status_message.get_or_insert(msg);
            }
            Ok(Box::new(app))
        }),
    )
}
