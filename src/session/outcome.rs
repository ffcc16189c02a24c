//! Capture outcome classification and operator status lines

use crate::vision::LineRecord;

/// Why a capture produced no lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// Frame definition below the threshold
    Blurred,
    /// The engine found no text regions
    NoText,
    /// Every detection fell below the confidence threshold
    BelowConfidence,
}

/// Classified result of one capture trigger
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Ok { lines: Vec<LineRecord>, sharpness: f64 },
    Empty { reason: EmptyReason, sharpness: f64 },
    EngineError { message: String },
}

/// Quality verdict for a capture that produced lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityVerdict {
    Blurred,
    LowConfidence,
    Good,
}

/// Thresholds the classification is judged against
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub definition: f64,
    pub confidence: f32,
}

/// Classify a completed detection pass.
///
/// `raw_count` is the number of detections before confidence filtering. A
/// blurred frame is reported ahead of the other empty causes.
pub fn classify(
    raw_count: usize,
    lines: Vec<LineRecord>,
    sharpness: f64,
    thresholds: &Thresholds,
) -> CaptureOutcome {
    if !lines.is_empty() {
        return CaptureOutcome::Ok { lines, sharpness };
    }

    let reason = if sharpness < thresholds.definition {
        EmptyReason::Blurred
    } else if raw_count == 0 {
        EmptyReason::NoText
    } else {
        EmptyReason::BelowConfidence
    };
    CaptureOutcome::Empty { reason, sharpness }
}

/// Mean of the line confidences, 0 for no lines
pub fn overall_confidence(lines: &[LineRecord]) -> f32 {
    if lines.is_empty() {
        return 0.0;
    }
    lines.iter().map(|l| l.avg_conf).sum::<f32>() / lines.len() as f32
}

/// Sharpness is checked before confidence
pub fn quality_verdict(sharpness: f64, mean_confidence: f32, thresholds: &Thresholds) -> QualityVerdict {
    if sharpness < thresholds.definition {
        QualityVerdict::Blurred
    } else if mean_confidence < thresholds.confidence {
        QualityVerdict::LowConfidence
    } else {
        QualityVerdict::Good
    }
}

impl CaptureOutcome {
    pub fn lines(&self) -> &[LineRecord] {
        match self {
            CaptureOutcome::Ok { lines, .. } => lines,
            _ => &[],
        }
    }

    /// One-line summary for the preview window
    pub fn summary(&self, thresholds: &Thresholds) -> String {
        match self {
            CaptureOutcome::Ok { lines, sharpness } => {
                let mean = overall_confidence(lines);
                format!(
                    "{} line(s), mean confidence {:.2}, {}",
                    lines.len(),
                    mean,
                    match quality_verdict(*sharpness, mean, thresholds) {
                        QualityVerdict::Blurred => "blurred",
                        QualityVerdict::LowConfidence => "low confidence",
                        QualityVerdict::Good => "good",
                    }
                )
            }
            CaptureOutcome::Empty { reason, .. } => format!("empty ({:?})", reason),
            CaptureOutcome::EngineError { message } => format!("error: {}", message),
        }
    }

    /// Operator status lines naming the cause of the outcome
    pub fn status_lines(&self, thresholds: &Thresholds) -> Vec<String> {
        match self {
            CaptureOutcome::EngineError { message } => {
                vec![format!("OCR failed: {}", message)]
            }
            CaptureOutcome::Empty { reason, sharpness } => vec![match reason {
                EmptyReason::Blurred => format!(
                    "No text recognized (cause: blurred, definition {:.2} < {})",
                    sharpness, thresholds.definition
                ),
                EmptyReason::NoText => "No text recognized (no text regions detected)".to_string(),
                EmptyReason::BelowConfidence => format!(
                    "No text recognized (every detection below confidence threshold {})",
                    thresholds.confidence
                ),
            }],
            CaptureOutcome::Ok { lines, sharpness } => {
                let mut out: Vec<String> = lines
                    .iter()
                    .map(|l| format!("- {} ({:.2})", l.text, l.avg_conf))
                    .collect();
                let mean = overall_confidence(lines);
                out.push(format!("Overall mean confidence: {:.2}", mean));
                out.push(match quality_verdict(*sharpness, mean, thresholds) {
                    QualityVerdict::Blurred => format!(
                        "Image is somewhat blurred (definition {:.2} < {})",
                        sharpness, thresholds.definition
                    ),
                    QualityVerdict::LowConfidence => format!(
                        "Text recognized but confidence is low (avg_conf {:.2} < {})",
                        mean, thresholds.confidence
                    ),
                    QualityVerdict::Good => "Definition and confidence are both good".to_string(),
                });
                out
            }
        }
    }
}
