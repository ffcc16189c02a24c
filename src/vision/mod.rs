//! Vision/OCR Layer
//!
//! Turns raw word detections from an OCR engine into text lines:
//! - confidence filtering
//! - frame sharpness (definition score)
//! - line merging and annotation
//!
//! The engine itself is external and reached through [`DetectionEngine`].

pub mod draw;
pub mod merge;
pub mod ocr;
pub mod sharpness;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub use draw::TextPainter;
pub use merge::{merge_lines, LineRecord};
pub use ocr::{build_engines, DetectionEngine, SidecarEngine};
pub use sharpness::definition_score;

/// Four ordered corner points, not necessarily axis aligned
pub type Quad = [(f32, f32); 4];

/// Single word detection from the OCR engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding quadrilateral
    pub quad: Quad,
    /// Recognized text
    pub text: String,
    /// Recognition confidence (0.0 - 1.0)
    pub confidence: f32,
}

impl Detection {
    pub fn new(quad: Quad, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            quad,
            text: text.into(),
            confidence,
        }
    }
}

/// Keep detections whose confidence reaches `threshold`.
///
/// Detections without a comparable confidence (NaN) are dropped.
pub fn filter_by_confidence(detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.confidence >= threshold)
        .collect()
}

/// Reject engine output whose geometry cannot be merged
pub fn validate_detections(detections: &[Detection]) -> Result<(), EngineError> {
    for (i, d) in detections.iter().enumerate() {
        if d.quad.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(EngineError::Malformed(format!(
                "detection {} ({:?}) has non-finite coordinates",
                i, d.text
            )));
        }
    }
    Ok(())
}

/// Axis aligned quad spanning all given points
pub fn enclosing_quad<'a>(points: impl IntoIterator<Item = &'a (f32, f32)>) -> Quad {
    let mut min = (f32::INFINITY, f32::INFINITY);
    let mut max = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for &(x, y) in points {
        min = (min.0.min(x), min.1.min(y));
        max = (max.0.max(x), max.1.max(y));
    }
    if !min.0.is_finite() {
        return [(0.0, 0.0); 4];
    }
    [(min.0, min.1), (max.0, min.1), (max.0, max.1), (min.0, max.1)]
}

#[cfg(test)]
pub(crate) fn word(x: f32, y: f32, w: f32, h: f32, text: &str, confidence: f32) -> Detection {
    Detection::new(
        [(x, y), (x + w, y), (x + w, y + h), (x, y + h)],
        text,
        confidence,
    )
}
