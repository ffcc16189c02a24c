//! Result export
//!
//! JSON artifacts for merged lines and image files for captured frames. All
//! writers create the destination directory when it is missing.

use image::RgbImage;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::ArtifactSettings;
use crate::error::PersistError;
use crate::vision::LineRecord;

/// Placeholder replaced by the capture timestamp in file name patterns
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// Serializes line records
pub trait ResultSink {
    /// Array of `{line_index, text, avg_conf}`
    fn write_line_json(&self, lines: &[LineRecord], path: &Path) -> Result<(), PersistError>;

    /// Array of `{id, text, confidence, bbox}`
    fn write_bbox_json(&self, lines: &[LineRecord], path: &Path) -> Result<(), PersistError>;

    /// `{results: [...], bbox: [...]}` in a single file
    fn write_merged_json(&self, lines: &[LineRecord], path: &Path) -> Result<(), PersistError>;
}

/// Bounding box entry of the bbox artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BBoxEntry {
    pub id: usize,
    pub text: String,
    pub confidence: f32,
    /// Corner points, clockwise from top-left
    pub bbox: [[i32; 2]; 4],
}

impl From<&LineRecord> for BBoxEntry {
    fn from(line: &LineRecord) -> Self {
        Self {
            id: line.line_index,
            text: line.text.clone(),
            confidence: line.avg_conf,
            bbox: line.bbox.map(|(x, y)| [x.round() as i32, y.round() as i32]),
        }
    }
}

#[derive(Serialize)]
struct MergedDocument<'a> {
    results: &'a [LineRecord],
    bbox: Vec<BBoxEntry>,
}

/// Pretty-printed, non-escaped UTF-8 JSON files
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl ResultSink for JsonExporter {
    fn write_line_json(&self, lines: &[LineRecord], path: &Path) -> Result<(), PersistError> {
        write_json(&lines, path)
    }

    fn write_bbox_json(&self, lines: &[LineRecord], path: &Path) -> Result<(), PersistError> {
        let entries: Vec<BBoxEntry> = lines.iter().map(BBoxEntry::from).collect();
        write_json(&entries, path)
    }

    fn write_merged_json(&self, lines: &[LineRecord], path: &Path) -> Result<(), PersistError> {
        let document = MergedDocument {
            results: lines,
            bbox: lines.iter().map(BBoxEntry::from).collect(),
        };
        write_json(&document, path)
    }
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), PersistError> {
    ensure_parent(path)?;

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    std::fs::write(path, buffer).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent(path: &Path) -> Result<(), PersistError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| PersistError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Write an image, format chosen from the extension
pub fn save_image(image: &RgbImage, path: &Path) -> Result<(), PersistError> {
    ensure_parent(path)?;
    image.save(path).map_err(|source| PersistError::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Capture timestamp in `YYYYMMDD_HHMMSS` form
pub fn capture_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Destination of an artifact for a capture
pub fn artifact_path(settings: &ArtifactSettings, timestamp: &str) -> PathBuf {
    settings
        .dir
        .join(settings.pattern.replace(TIMESTAMP_PLACEHOLDER, timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::merge::group_lines;
    use crate::vision::word;
    use tempfile::TempDir;

    fn sample_lines() -> Vec<LineRecord> {
        group_lines(
            vec![
                word(10.0, 10.0, 40.0, 20.0, "유통기한", 0.9),
                word(10.0, 100.0, 40.0, 20.0, "2025.01.01", 0.7),
            ],
            20.0,
            30.0,
        )
    }

    #[test]
    fn test_line_json_keeps_utf8_and_creates_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/json/out.json");

        JsonExporter.write_line_json(&sample_lines(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("유통기한"));
        assert!(content.contains("\n    {"));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[1]["line_index"], 2);
        assert!(value[0].get("bbox").is_none());
    }

    #[test]
    fn test_bbox_json_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bbox.json");

        JsonExporter.write_bbox_json(&sample_lines(), &path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["bbox"], serde_json::json!([[10, 10], [50, 10], [50, 30], [10, 30]]));
    }

    #[test]
    fn test_merged_json_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("merged.json");

        JsonExporter.write_merged_json(&sample_lines(), &path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["results"].as_array().unwrap().len(), 2);
        assert_eq!(value["bbox"][1]["text"], "2025.01.01");
    }

    #[test]
    fn test_artifact_path_expands_timestamp() {
        let settings = ArtifactSettings {
            enabled: true,
            dir: PathBuf::from("out/json"),
            pattern: "capture_{timestamp}.json".to_string(),
        };
        assert_eq!(
            artifact_path(&settings, "20250101_120000"),
            PathBuf::from("out/json/capture_20250101_120000.json")
        );
    }

    #[test]
    fn test_capture_timestamp_format() {
        let ts = capture_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_save_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("img/frame.png");
        save_image(&RgbImage::new(4, 4), &path).unwrap();
        assert!(path.is_file());
    }
}
