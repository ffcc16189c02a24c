//! Frame overlays
//!
//! Live overlays drawn on each preview frame and the debug overlay persisted
//! after a capture. Both draw on copies; the frames handed to the engine are
//! never touched.

pub mod window;

use image::RgbImage;

use crate::session::outcome::CaptureOutcome;
use crate::vision::draw::{draw_marker, draw_quad, palette_color, TextPainter, GREEN, RED, WHITE};

/// What to draw on top of a live frame
#[derive(Debug, Clone)]
pub struct LiveOverlayOptions {
    pub instructions: String,
    pub show_definition: bool,
    pub definition_threshold: f64,
    pub draw_boxes: bool,
    pub show_coords: bool,
}

/// Render instructions, definition score and the previous outcome on a live frame
pub fn render_live_overlay(
    frame: &RgbImage,
    sharpness: f64,
    last_outcome: Option<&CaptureOutcome>,
    options: &LiveOverlayOptions,
    painter: &TextPainter,
) -> RgbImage {
    let mut display = frame.clone();

    painter.draw(&mut display, &options.instructions, 10, 12, 20.0, WHITE);

    if options.show_definition {
        let color = if sharpness >= options.definition_threshold { GREEN } else { RED };
        painter.draw(
            &mut display,
            &format!("Definition: {:.1} (th={})", sharpness, options.definition_threshold),
            10,
            42,
            18.0,
            color,
        );
    }

    if options.draw_boxes {
        if let Some(CaptureOutcome::Ok { lines, .. }) = last_outcome {
            for line in lines {
                let color = palette_color(line.line_index);
                for quad in &line.word_quads {
                    draw_quad(&mut display, quad, color, 1);
                    if options.show_coords {
                        let (x, y) = quad[0];
                        painter.draw(
                            &mut display,
                            &format!("({:.0},{:.0})", x, y),
                            x as i32,
                            y as i32 - 14,
                            12.0,
                            color,
                        );
                    }
                }
            }
        }
    }

    display
}

/// Per-line index and centroid marker on a fresh copy of the annotated frame
pub fn render_debug_overlay(
    annotated: &RgbImage,
    lines: &[crate::vision::LineRecord],
    painter: &TextPainter,
) -> RgbImage {
    let mut debug = annotated.clone();
    for line in lines {
        let color = palette_color(line.line_index);
        draw_marker(&mut debug, line.centroid, 4, color);
        painter.draw(
            &mut debug,
            &format!(
                "#{} ({:.0},{:.0})",
                line.line_index, line.centroid.0, line.centroid.1
            ),
            line.centroid.0 as i32 + 6,
            line.centroid.1 as i32 + 6,
            14.0,
            color,
        );
    }
    debug
}
