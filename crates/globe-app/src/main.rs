//! The `globe` binary: generate a mesh file, or load one back.

use std::process::ExitCode;

use clap::Parser;
use globe_config::{CliArgs, Config, default_config_dir};
use tracing::{error, info};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    globe_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match globe_app::run(&config, args.load.as_deref()) {
        Ok(report) => {
            info!(
                "{} ready: {} bytes, {} vertices, {} faces",
                report.path.display(),
                report.file_len,
                report.summary.vertices,
                report.summary.faces
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
