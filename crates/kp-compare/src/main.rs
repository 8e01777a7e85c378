mod commands;
mod error;
mod gpx_input;
mod settings;

use clap::Parser;
use settings::Settings;
use tracing_subscriber::EnvFilter;

fn main() {
    let settings = Settings::parse();

    // Logs go to stderr so stdout carries only JSON
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::run(&settings) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
