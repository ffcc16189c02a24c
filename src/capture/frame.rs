//! Frame data structures for captured camera content

use image::RgbImage;
use std::path::PathBuf;
use std::time::Instant;

/// A captured frame from a frame source
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// RGB pixel data
    pub image: RgbImage,
    /// File the frame was decoded from, for replay sources
    pub origin: Option<PathBuf>,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl CapturedFrame {
    /// Create a new captured frame
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            origin: None,
            timestamp: Instant::now(),
        }
    }

    /// Attach the file the frame came from
    pub fn with_origin(mut self, origin: PathBuf) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
