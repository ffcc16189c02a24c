//! Line merging
//!
//! Clusters word detections into visual lines and word groups:
//!
//! 1. Words are ordered by centroid `(y, x)`. This is the only reading order used;
//!    the engine's own output order is ignored.
//! 2. Walking that order, a word joins the open line when its centroid y is within
//!    `y_thresh` of the *previous word added* to the line. The tolerance chains, so
//!    a long, gently sloped line may span more than `y_thresh` in total. Tilted
//!    labels rely on this.
//! 3. Inside a line words are ordered by `x_min`; consecutive words whose gap is
//!    below `x_gap_thresh` form one word group.

use image::RgbImage;
use serde::Serialize;
use tracing::debug;

use super::draw::{draw_quad, palette_color, TextPainter, RED};
use super::{enclosing_quad, Detection, Quad};

const BOX_THICKNESS: u32 = 2;
const LABEL_SIZE: f32 = 22.0;

/// Per-word geometry derived from a detection, alive for one merge pass
#[derive(Debug, Clone)]
struct WordRecord {
    text: String,
    confidence: f32,
    cx: f32,
    cy: f32,
    x_min: f32,
    x_max: f32,
    quad: Quad,
}

impl WordRecord {
    fn from_detection(detection: Detection) -> Self {
        let xs = detection.quad.map(|p| p.0);
        let ys = detection.quad.map(|p| p.1);
        Self {
            text: detection.text.trim().to_string(),
            confidence: detection.confidence,
            cx: xs.iter().sum::<f32>() / 4.0,
            cy: ys.iter().sum::<f32>() / 4.0,
            x_min: xs.iter().copied().fold(f32::INFINITY, f32::min),
            x_max: xs.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            quad: detection.quad,
        }
    }
}

/// One merged text line, the unit persisted to JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineRecord {
    /// 1-based position, top to bottom
    pub line_index: usize,
    /// Word groups joined by spaces
    pub text: String,
    /// Mean confidence of the member words
    pub avg_conf: f32,
    /// Word groups in reading order
    #[serde(skip)]
    pub groups: Vec<String>,
    /// Member word quads in reading order
    #[serde(skip)]
    pub word_quads: Vec<Quad>,
    /// Mean of the member centroids
    #[serde(skip)]
    pub centroid: (f32, f32),
    /// Axis aligned box around all members
    #[serde(skip)]
    pub bbox: Quad,
}

impl LineRecord {
    /// Number of detections merged into this line
    pub fn member_count(&self) -> usize {
        self.word_quads.len()
    }
}

/// Cluster detections into ordered line records
pub fn group_lines(detections: Vec<Detection>, y_thresh: f32, x_gap_thresh: f32) -> Vec<LineRecord> {
    let mut words: Vec<WordRecord> = detections.into_iter().map(WordRecord::from_detection).collect();
    if words.is_empty() {
        return Vec::new();
    }

    words.sort_by(|a, b| a.cy.total_cmp(&b.cy).then(a.cx.total_cmp(&b.cx)));

    let mut lines: Vec<Vec<WordRecord>> = Vec::new();
    let mut current: Vec<WordRecord> = Vec::new();
    for word in words {
        let joins = current
            .last()
            .map(|last| (word.cy - last.cy).abs() <= y_thresh)
            .unwrap_or(true);
        if !joins {
            lines.push(std::mem::take(&mut current));
        }
        current.push(word);
    }
    lines.push(current);

    lines
        .into_iter()
        .enumerate()
        .map(|(i, mut line)| {
            line.sort_by(|a, b| a.x_min.total_cmp(&b.x_min));
            build_record(i + 1, line, x_gap_thresh)
        })
        .collect()
}

fn build_record(line_index: usize, line: Vec<WordRecord>, x_gap_thresh: f32) -> LineRecord {
    let mut groups: Vec<String> = Vec::new();
    let mut previous: Option<&WordRecord> = None;
    for word in &line {
        match (previous, groups.last_mut()) {
            (Some(prev), Some(group)) if word.x_min - prev.x_max < x_gap_thresh => {
                group.push(' ');
                group.push_str(&word.text);
            }
            _ => groups.push(word.text.clone()),
        }
        previous = Some(word);
    }

    let count = line.len() as f32;
    let avg_conf = (line.iter().map(|w| w.confidence as f64).sum::<f64>() / line.len() as f64) as f32;
    let centroid = (
        line.iter().map(|w| w.cx).sum::<f32>() / count,
        line.iter().map(|w| w.cy).sum::<f32>() / count,
    );
    let bbox = enclosing_quad(line.iter().flat_map(|w| w.quad.iter()));

    LineRecord {
        line_index,
        text: groups.join(" "),
        avg_conf,
        groups,
        word_quads: line.iter().map(|w| w.quad).collect(),
        centroid,
        bbox,
    }
}

/// Draw each line's word boxes and its merged text onto `image`
pub fn annotate_lines(image: &mut RgbImage, lines: &[LineRecord], painter: &TextPainter) {
    for line in lines {
        let color = palette_color(line.line_index);
        for quad in &line.word_quads {
            draw_quad(image, quad, color, BOX_THICKNESS);
        }

        // Label above the leftmost word
        if let Some(first) = line.word_quads.first() {
            let x_min = first.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
            let cy = first.iter().map(|p| p.1).sum::<f32>() / 4.0;
            let y = cy - 10.0 - LABEL_SIZE;
            painter.draw(
                image,
                &format!("{}. {}", line.line_index, line.text),
                x_min as i32,
                y as i32,
                LABEL_SIZE,
                RED,
            );
        }
    }
}

/// Merge detections into lines and return them with an annotated frame.
///
/// Empty input returns the frame untouched.
pub fn merge_lines(
    mut frame: RgbImage,
    detections: Vec<Detection>,
    y_thresh: f32,
    x_gap_thresh: f32,
    painter: &TextPainter,
) -> (Vec<LineRecord>, RgbImage) {
    if detections.is_empty() {
        return (Vec::new(), frame);
    }

    let count = detections.len();
    let lines = group_lines(detections, y_thresh, x_gap_thresh);
    annotate_lines(&mut frame, &lines, painter);
    debug!("Merged {} detections into {} lines", count, lines.len());

    (lines, frame)
}
