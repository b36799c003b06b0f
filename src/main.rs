use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

use vizzy::core::config;

#[derive(Parser)]
#[command(name = "vizzy", about = "Chat with an image and video generation server")]
struct Args {
    /// Server base URL (overrides VIZZY_BASE_URL and the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Log file path
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let (file_config, config_error) = match config::load_config() {
        Ok(c) => (c, None),
        Err(e) => (config::VizzyConfig::default(), Some(e)),
    };
    let resolved = config::resolve(
        &file_config,
        args.base_url.as_deref(),
        args.log_file.as_deref(),
    );

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    if let Some(e) = config_error {
        log::warn!("Failed to load config ({}), using defaults", e);
    }
    log::info!("Vizzy starting up against {}", resolved.base_url);

    vizzy::tui::run(resolved)
}
