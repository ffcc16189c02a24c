//! Drawing primitives shared by the line merger and the live overlays

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};
use std::path::Path;
use tracing::{info, warn};

use super::Quad;

/// Colors cycled through per line index
pub const LINE_PALETTE: [Rgb<u8>; 6] = [
    Rgb([0, 255, 0]),
    Rgb([0, 255, 255]),
    Rgb([255, 255, 0]),
    Rgb([0, 128, 255]),
    Rgb([255, 0, 255]),
    Rgb([255, 128, 0]),
];

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Palette color for a line
pub fn palette_color(line_index: usize) -> Rgb<u8> {
    LINE_PALETTE[line_index % LINE_PALETTE.len()]
}

/// Draw a closed quadrilateral outline
pub fn draw_quad(image: &mut RgbImage, quad: &Quad, color: Rgb<u8>, thickness: u32) {
    for t in 0..thickness.max(1) {
        let offset = t as f32;
        for i in 0..quad.len() {
            let a = quad[i];
            let b = quad[(i + 1) % quad.len()];
            draw_line_segment_mut(image, (a.0 + offset, a.1), (b.0 + offset, b.1), color);
            if t > 0 {
                draw_line_segment_mut(image, (a.0, a.1 + offset), (b.0, b.1 + offset), color);
            }
        }
    }
}

/// Draw a filled marker centered on a point
pub fn draw_marker(image: &mut RgbImage, center: (f32, f32), radius: i32, color: Rgb<u8>) {
    draw_filled_circle_mut(image, (center.0 as i32, center.1 as i32), radius, color);
}

/// Text renderer backed by an optional TTF font.
///
/// Without a font text calls are no-ops, so boxes are still drawn.
#[derive(Clone, Default)]
pub struct TextPainter {
    font: Option<FontArc>,
}

impl TextPainter {
    /// Painter that draws no text
    pub fn none() -> Self {
        Self { font: None }
    }

    /// Load a font file, falling back to no text on failure
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("No overlay font configured, text overlays disabled");
            return Self::none();
        };

        let font = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| FontArc::try_from_vec(bytes).map_err(|e| e.to_string()));

        match font {
            Ok(font) => {
                info!("Loaded overlay font {:?}", path);
                Self { font: Some(font) }
            }
            Err(e) => {
                warn!("Failed to load overlay font {:?}: {}", path, e);
                Self::none()
            }
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw `text` with its top-left corner at (x, y)
    pub fn draw(&self, image: &mut RgbImage, text: &str, x: i32, y: i32, size: f32, color: Rgb<u8>) {
        if let Some(font) = &self.font {
            draw_text_mut(image, color, x, y, PxScale::from(size), font, text);
        }
    }
}

impl std::fmt::Debug for TextPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextPainter")
            .field("has_font", &self.has_font())
            .finish()
    }
}
