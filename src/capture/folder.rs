//! Image folder replay backend
//!
//! Every subdirectory of the root is one device, in name order. A root that
//! holds images directly is device 0. Reads return the images of the device
//! directory in name order, each repeated `hold_frames` times.

use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::frame::CapturedFrame;
use super::{DeviceBackend, FrameSource};
use crate::error::CaptureError;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Device backend over a directory tree of still images
#[derive(Debug, Clone)]
pub struct ImageFolderBackend {
    root: PathBuf,
    hold_frames: u32,
    looping: bool,
}

impl ImageFolderBackend {
    pub fn new(root: impl Into<PathBuf>, hold_frames: u32, looping: bool) -> Self {
        Self {
            root: root.into(),
            hold_frames: hold_frames.max(1),
            looping,
        }
    }

    fn device_dirs(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        if dirs.is_empty() && !list_images(&self.root).is_empty() {
            dirs.push(self.root.clone());
        }
        dirs
    }
}

impl DeviceBackend for ImageFolderBackend {
    fn open(&self, index: u32) -> Option<Box<dyn FrameSource>> {
        let dir = self.device_dirs().into_iter().nth(index as usize)?;
        let images = list_images(&dir);
        if images.is_empty() {
            debug!("Device directory {:?} holds no images", dir);
            return None;
        }
        Some(Box::new(FolderSource {
            images,
            next: 0,
            served: 0,
            hold_frames: self.hold_frames,
            looping: self.looping,
            size: None,
        }))
    }
}

fn list_images(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut images: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();
    images.sort();
    images
}

/// Open folder device
struct FolderSource {
    images: Vec<PathBuf>,
    next: usize,
    served: u32,
    hold_frames: u32,
    looping: bool,
    size: Option<(u32, u32)>,
}

impl FrameSource for FolderSource {
    fn configure(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            warn!("Ignoring frame size {}x{}", width, height);
            return;
        }
        self.size = Some((width, height));
    }

    fn read(&mut self) -> Result<CapturedFrame, CaptureError> {
        if self.served >= self.hold_frames {
            self.served = 0;
            self.next += 1;
        }
        if self.next >= self.images.len() {
            if !self.looping || self.images.is_empty() {
                return Err(CaptureError::FrameRead("no more frames".to_string()));
            }
            self.next = 0;
        }

        let path = &self.images[self.next];
        let mut image = image::open(path)?.to_rgb8();
        if let Some((w, h)) = self.size {
            if image.dimensions() != (w, h) {
                image = image::imageops::resize(&image, w, h, FilterType::Triangle);
            }
        }
        self.served += 1;

        Ok(CapturedFrame::new(image).with_origin(path.clone()))
    }

    fn release(&mut self) {
        self.images.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_image(path: &Path, value: u8) {
        RgbImage::from_pixel(8, 6, Rgb([value, value, value])).save(path).unwrap();
    }

    #[test]
    fn test_subdirectories_are_devices() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("a")).unwrap();
        std::fs::create_dir(root.path().join("b")).unwrap();
        write_image(&root.path().join("b/frame.png"), 10);

        let backend = ImageFolderBackend::new(root.path(), 1, false);
        // "a" is empty and does not open
        assert!(backend.open(0).is_none());
        assert!(backend.open(1).is_some());
        assert!(backend.open(2).is_none());
    }

    #[test]
    fn test_flat_root_is_device_zero() {
        let root = TempDir::new().unwrap();
        write_image(&root.path().join("frame.png"), 10);

        let backend = ImageFolderBackend::new(root.path(), 1, false);
        assert!(backend.open(0).is_some());
        assert!(backend.open(1).is_none());
    }

    #[test]
    fn test_reads_in_order_then_ends() {
        let root = TempDir::new().unwrap();
        write_image(&root.path().join("01.png"), 10);
        write_image(&root.path().join("02.png"), 20);

        let backend = ImageFolderBackend::new(root.path(), 2, false);
        let mut source = backend.open(0).unwrap();

        let values: Vec<u8> = (0..4)
            .map(|_| source.read().unwrap().image.get_pixel(0, 0)[0])
            .collect();
        assert_eq!(values, vec![10, 10, 20, 20]);
        assert!(matches!(source.read(), Err(CaptureError::FrameRead(_))));
    }

    #[test]
    fn test_looping_and_resize() {
        let root = TempDir::new().unwrap();
        write_image(&root.path().join("only.png"), 50);

        let backend = ImageFolderBackend::new(root.path(), 1, true);
        let mut source = backend.open(0).unwrap();
        source.configure(16, 12);

        for _ in 0..3 {
            let frame = source.read().unwrap();
            assert_eq!(frame.dimensions(), (16, 12));
            assert_eq!(frame.origin.as_deref(), Some(root.path().join("only.png").as_path()));
        }
    }
}
