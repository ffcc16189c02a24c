//! Storage Layer
//!
//! Handles persistence of capture results and locates the configuration file.

pub mod export;

use anyhow::Result;
use std::path::PathBuf;

pub use export::{artifact_path, capture_timestamp, save_image, JsonExporter, ResultSink};

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "labeltextrecognition", "LabelTextRecognition")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}
