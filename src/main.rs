use eframe::egui;
use plantfix_chat::config::AppConfig;
use plantfix_chat::ui::PlantChatApp;
use plantfix_chat::utils::init_tracing;

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    init_tracing("info");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {:#}", e);
            AppConfig::default()
        }
    };
    if let Err(e) = config.validate() {
        tracing::warn!("Config is invalid: {:#}", e);
    }
    tracing::info!("Starting Plantfix Chat against {}", config.api_url);

    let (width, height) = config.window_size;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Plantfix Chat")
            .with_inner_size([width, height])
            .with_min_inner_size([400.0, 520.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Plantfix Chat",
        options,
        Box::new(|cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(PlantChatApp::new(cc, config)?))
        }),
    )
}
