//! OCR (Optical Character Recognition) engine interface
//!
//! The recognition model is an external collaborator. The session only needs
//! word detections for a frame; [`SidecarEngine`] supplies them from JSON files
//! written next to replayed frames by an offline OCR run.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::Detection;
use crate::capture::frame::CapturedFrame;
use crate::error::EngineError;

/// Word-level text detection and recognition
pub trait DetectionEngine {
    /// Language code the engine recognizes
    fn language(&self) -> &str;

    /// Detect words in a frame.
    ///
    /// `orientation_correction` trades latency for robustness to rotated text.
    fn recognize(
        &mut self,
        frame: &CapturedFrame,
        orientation_correction: bool,
    ) -> Result<Vec<Detection>, EngineError>;
}

/// Build one engine per language. An empty list falls back to English.
pub fn build_engines<F>(languages: &[String], mut factory: F) -> Vec<Box<dyn DetectionEngine>>
where
    F: FnMut(&str) -> Box<dyn DetectionEngine>,
{
    let languages: Vec<&str> = if languages.is_empty() {
        vec!["en"]
    } else {
        languages.iter().map(String::as_str).collect()
    };

    languages
        .into_iter()
        .map(|lang| {
            info!("Initializing OCR engine for language: {}", lang);
            factory(lang)
        })
        .collect()
}

/// Engine reading precomputed detections from `<stem>.<lang>.json` or `<stem>.json`
#[derive(Debug, Clone)]
pub struct SidecarEngine {
    language: String,
    sidecar_dir: Option<PathBuf>,
}

impl SidecarEngine {
    pub fn new(language: &str, sidecar_dir: Option<PathBuf>) -> Self {
        Self {
            language: language.to_string(),
            sidecar_dir,
        }
    }

    fn candidates(&self, origin: &Path) -> Vec<PathBuf> {
        let dir = self
            .sidecar_dir
            .clone()
            .or_else(|| origin.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let stem = origin
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        vec![
            dir.join(format!("{}.{}.json", stem, self.language)),
            dir.join(format!("{}.json", stem)),
        ]
    }
}

impl DetectionEngine for SidecarEngine {
    fn language(&self) -> &str {
        &self.language
    }

    fn recognize(
        &mut self,
        frame: &CapturedFrame,
        orientation_correction: bool,
    ) -> Result<Vec<Detection>, EngineError> {
        let origin = frame
            .origin
            .as_deref()
            .ok_or_else(|| EngineError::Failed("frame has no origin file to look up".to_string()))?;

        let Some(path) = self.candidates(origin).into_iter().find(|p| p.is_file()) else {
            debug!("No detections recorded for {:?}", origin);
            return Ok(Vec::new());
        };

        debug!(
            "Reading detections from {:?} (orientation correction: {})",
            path, orientation_correction
        );
        let content = std::fs::read_to_string(&path)
            .map_err(|e| EngineError::Failed(format!("{:?}: {}", path, e)))?;
        serde_json::from_str(&content).map_err(|e| EngineError::Malformed(format!("{:?}: {}", path, e)))
    }
}
