use clap::Parser;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use de_explorer::app::ExplorerApp;
use de_explorer::cli::Args;
use de_explorer::config::AppConfig;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> de_explorer::Result<()> {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::load_or_default(&args.config);
    let view_mode = args.view_mode.unwrap_or(config.view.mode);
    let window = config.window.clone();

    let mut app = ExplorerApp::new(config, view_mode);
    if let Some(input) = &args.input {
        // a bad input file is reported in the window rather than aborting
        app.load_path(input);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([window.width, window.height])
            .with_title("DE Explorer"),
        ..Default::default()
    };

    eframe::run_native(
        "DE Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )?;
    Ok(())
}
