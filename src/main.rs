//! Label Text Recognition - camera label reader
//!
//! Shows a live camera preview and, on a key press, runs OCR on the current
//! frame, merges the detected words into reading-order lines and stores the
//! frame, an annotated copy and the recognized lines.

mod app;
mod capture;
mod config;
mod error;
mod overlay;
mod session;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::LabelTextApp;
use crate::config::AppConfig;

/// Label Text Recognition - OCR on camera frames with line merging
#[derive(Parser, Debug)]
#[command(name = "label-text-recognition")]
#[command(about = "Capture camera frames and recognize label text line by line")]
struct Args {
    /// Configuration file (default: platform config dir/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run without the live preview window, keys are read from stdin
    #[arg(long)]
    headless: bool,

    /// List available devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Write the default configuration to the config path and exit
    #[arg(long)]
    write_default_config: bool,

    /// Debug level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = match args.config {
        Some(path) => path,
        None => storage::get_config_dir()?.join("config.toml"),
    };

    if args.write_default_config {
        config::save_config(&AppConfig::default(), &config_path)
            .with_context(|| format!("Failed to write {:?}", config_path))?;
        println!("Default configuration written to {}", config_path.display());
        return Ok(());
    }

    let config = load_or_create_config(&config_path)?;
    let app = LabelTextApp::new(config, args.headless);

    // List devices mode
    if args.list_devices {
        let devices = app.list_devices();
        if devices.is_empty() {
            println!("No available devices detected");
        } else {
            println!("Available devices: {:?}", devices);
        }
        return Ok(());
    }

    info!("Label Text Recognition starting...");
    app.run()?;
    info!("Label Text Recognition shutdown complete");

    Ok(())
}

/// Load configuration from file, or defaults when there is no file.
///
/// A file that exists but does not parse is an error; running on defaults
/// would silently drop the operator's settings.
fn load_or_create_config(config_path: &Path) -> Result<AppConfig> {
    if !config_path.exists() {
        info!("No configuration at {:?}, using defaults", config_path);
        return Ok(AppConfig::default());
    }

    let config = config::load_config(config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;
    info!("Loaded configuration from {:?}", config_path);
    Ok(config)
}
