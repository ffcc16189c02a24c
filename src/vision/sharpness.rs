//! Frame definition score
//!
//! Variance of the Laplacian of the grayscale frame. Higher means sharper.

use image::RgbImage;
use imageproc::filter::laplacian_filter;

/// Compute the definition score of a frame
pub fn definition_score(frame: &RgbImage) -> f64 {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let gray = image::imageops::grayscale(frame);
    let laplacian = laplacian_filter(&gray);

    let count = (width as f64) * (height as f64);
    let (sum, sum_sq) = laplacian.pixels().fold((0.0f64, 0.0f64), |(s, sq), p| {
        let v = p[0] as f64;
        (s + v, sq + v * v)
    });
    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}
