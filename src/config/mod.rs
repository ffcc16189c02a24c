//! Application Configuration
//!
//! Settings stored in TOML format, read once per process. The session only ever
//! sees the immutable [`SessionConfig`] snapshot taken from it.

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::capture::CameraSelector;

/// Raw camera index value as written in the document: a number or a string.
/// Any other value type is kept as written and never resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CameraIndexSetting {
    Number(i64),
    Text(String),
    Other(toml::Value),
}

impl Default for CameraIndexSetting {
    fn default() -> Self {
        CameraIndexSetting::Text("auto".to_string())
    }
}

impl CameraIndexSetting {
    /// Interpret the setting. `None` means the value is malformed.
    pub fn resolve(&self) -> Option<CameraSelector> {
        match self {
            CameraIndexSetting::Number(n) => u32::try_from(*n).ok().map(CameraSelector::Index),
            CameraIndexSetting::Text(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("auto") {
                    Some(CameraSelector::Auto)
                } else {
                    s.parse::<u32>().ok().map(CameraSelector::Index)
                }
            }
            CameraIndexSetting::Other(_) => None,
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Device selector: "auto" or a device index
    pub camera_index: CameraIndexSetting,
    /// Highest index probed in auto mode (exclusive)
    pub camera_probe_max: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Minimum detection confidence (0.0 - 1.0)
    pub conf_threshold: f32,
    /// Minimum definition score for a frame to count as sharp
    pub definition_threshold: f64,
    /// Recognition languages, the first one is the main engine
    pub ocr_langs: Vec<String>,
    /// Orientation correction in the engine
    pub ocr_cls_enable: bool,
    /// Vertical tolerance between consecutive words of a line (px)
    pub y_thresh: f32,
    /// Horizontal gap under which words are merged into one group (px)
    pub x_gap_thresh: f32,
    pub save_output: bool,
    pub console_log: bool,
    pub retry_on_error: bool,
    /// Show the definition score on live frames
    pub show_definition: bool,
    pub capture_key: String,
    pub quit_key: String,
    pub source: SourceSettings,
    pub engine: EngineSettings,
    pub visualization: VisualizationSettings,
    pub export: ExportSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            camera_index: CameraIndexSetting::default(),
            camera_probe_max: 10,
            frame_width: 960,
            frame_height: 540,
            conf_threshold: 0.5,
            definition_threshold: 200.0,
            ocr_langs: vec!["en".to_string()],
            ocr_cls_enable: true,
            y_thresh: 20.0,
            x_gap_thresh: 30.0,
            save_output: true,
            console_log: true,
            retry_on_error: false,
            show_definition: true,
            capture_key: "space".to_string(),
            quit_key: "q".to_string(),
            source: SourceSettings::default(),
            engine: EngineSettings::default(),
            visualization: VisualizationSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

/// Image folder replay backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Root directory; each subdirectory is one device
    pub root: PathBuf,
    /// Consecutive reads that return the same image
    pub hold_frames: u32,
    /// Restart from the first image once the folder is exhausted
    pub looping: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets/frames"),
            hold_frames: 30,
            looping: true,
        }
    }
}

/// Detection engine settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Directory holding detection sidecars; defaults to the frame's directory
    pub sidecar_dir: Option<PathBuf>,
}

/// Live preview and overlay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationSettings {
    /// Open the preview window
    pub live_preview: bool,
    /// Redraw the last outcome's boxes on live frames
    pub live_draw_boxes: bool,
    /// Label the redrawn boxes with their corner coordinates
    pub live_show_coords: bool,
    /// TTF font used for text overlays
    pub font_path: Option<PathBuf>,
}

impl Default for VisualizationSettings {
    fn default() -> Self {
        Self {
            live_preview: true,
            live_draw_boxes: false,
            live_show_coords: false,
            font_path: None,
        }
    }
}

/// One persisted artifact kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactSettings {
    pub enabled: bool,
    pub dir: PathBuf,
    /// File name pattern, `{timestamp}` is replaced by `YYYYMMDD_HHMMSS`
    pub pattern: String,
}

impl ArtifactSettings {
    fn new(enabled: bool, dir: &str, pattern: &str) -> Self {
        Self {
            enabled,
            dir: PathBuf::from(dir),
            pattern: pattern.to_string(),
        }
    }
}

/// Artifact block as written; missing keys keep the block's own default
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArtifactOverride {
    enabled: Option<bool>,
    dir: Option<PathBuf>,
    pattern: Option<String>,
}

impl ArtifactOverride {
    fn apply(self, target: &mut ArtifactSettings) {
        if let Some(enabled) = self.enabled {
            target.enabled = enabled;
        }
        if let Some(dir) = self.dir {
            target.dir = dir;
        }
        if let Some(pattern) = self.pattern {
            target.pattern = pattern;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExportOverride {
    origin_image: ArtifactOverride,
    annotated_image: ArtifactOverride,
    text_json: ArtifactOverride,
    bbox_json: ArtifactOverride,
    debug_image: ArtifactOverride,
    merge_bbox_into_text: Option<bool>,
}

/// Export settings, one block per artifact
#[derive(Debug, Clone, Serialize)]
pub struct ExportSettings {
    pub origin_image: ArtifactSettings,
    pub annotated_image: ArtifactSettings,
    pub text_json: ArtifactSettings,
    pub bbox_json: ArtifactSettings,
    pub debug_image: ArtifactSettings,
    /// Write `{results, bbox}` into the text JSON instead of a plain array
    pub merge_bbox_into_text: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            origin_image: ArtifactSettings::new(true, "assets/pictures-origin", "capture_{timestamp}.jpg"),
            annotated_image: ArtifactSettings::new(true, "assets/pictures", "capture_{timestamp}.jpg"),
            text_json: ArtifactSettings::new(true, "assets/json", "capture_{timestamp}.json"),
            bbox_json: ArtifactSettings::new(false, "assets/json-bbox", "bbox_{timestamp}.json"),
            debug_image: ArtifactSettings::new(false, "assets/pictures-debug", "debug_{timestamp}.jpg"),
            merge_bbox_into_text: false,
        }
    }
}

impl<'de> Deserialize<'de> for ExportSettings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = ExportOverride::deserialize(deserializer)?;
        let mut settings = ExportSettings::default();
        raw.origin_image.apply(&mut settings.origin_image);
        raw.annotated_image.apply(&mut settings.annotated_image);
        raw.text_json.apply(&mut settings.text_json);
        raw.bbox_json.apply(&mut settings.bbox_json);
        raw.debug_image.apply(&mut settings.debug_image);
        if let Some(merge) = raw.merge_bbox_into_text {
            settings.merge_bbox_into_text = merge;
        }
        Ok(settings)
    }
}

/// Immutable snapshot handed to the capture session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub conf_threshold: f32,
    pub definition_threshold: f64,
    pub orientation_correction: bool,
    pub y_thresh: f32,
    pub x_gap_thresh: f32,
    pub save_output: bool,
    pub console_log: bool,
    pub retry_on_error: bool,
    pub show_definition: bool,
    pub live_draw_boxes: bool,
    pub live_show_coords: bool,
    pub export: ExportSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

impl SessionConfig {
    /// Take the snapshot, clamping values the merger and classifier cannot use
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            conf_threshold: clamp_setting("conf_threshold", config.conf_threshold, 0.0, 1.0),
            definition_threshold: if config.definition_threshold.is_finite() && config.definition_threshold >= 0.0 {
                config.definition_threshold
            } else {
                warn!("Invalid definition_threshold {}, using 0", config.definition_threshold);
                0.0
            },
            orientation_correction: config.ocr_cls_enable,
            y_thresh: clamp_setting("y_thresh", config.y_thresh, 0.0, f32::MAX),
            x_gap_thresh: clamp_setting("x_gap_thresh", config.x_gap_thresh, 0.0, f32::MAX),
            save_output: config.save_output,
            console_log: config.console_log,
            retry_on_error: config.retry_on_error,
            show_definition: config.show_definition,
            live_draw_boxes: config.visualization.live_draw_boxes,
            live_show_coords: config.visualization.live_show_coords,
            export: config.export.clone(),
        }
    }
}

fn clamp_setting(name: &str, value: f32, min: f32, max: f32) -> f32 {
    if !value.is_finite() {
        warn!("Invalid {} {}, using {}", name, value, min);
        return min;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!("{} {} out of range, clamped to {}", name, value, clamped);
    }
    clamped
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
