//! Frame Source Layer
//!
//! A frame source is an external device that hands out frames on request. This
//! module defines the interface the session consumes and resolves the configured
//! device selector ("auto" or an index) into an open source.

pub mod folder;
pub mod frame;

use tracing::info;

use crate::error::CaptureError;
use frame::CapturedFrame;

pub use folder::ImageFolderBackend;

/// Which device to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSelector {
    /// Probe indices from 0 and take the first that opens
    Auto,
    /// A fixed device index
    Index(u32),
}

/// An open device delivering frames
pub trait FrameSource {
    /// Request a frame size; sources that cannot honour it keep their own
    fn configure(&mut self, width: u32, height: u32);

    /// Read the next frame
    fn read(&mut self) -> Result<CapturedFrame, CaptureError>;

    /// Release the underlying device
    fn release(&mut self);
}

/// Opens frame sources by device index
pub trait DeviceBackend {
    fn open(&self, index: u32) -> Option<Box<dyn FrameSource>>;
}

/// Collect every index in `0..max_index` that opens
pub fn scan_devices(backend: &dyn DeviceBackend, max_index: u32) -> Vec<u32> {
    (0..max_index)
        .filter(|&i| match backend.open(i) {
            Some(mut source) => {
                source.release();
                true
            }
            None => false,
        })
        .collect()
}

/// Resolve `selector` to a device, open and size it.
///
/// `None` selectors come from a malformed configuration value and are
/// reported as unavailable before any device is touched.
pub fn open_device(
    backend: &dyn DeviceBackend,
    selector: Option<CameraSelector>,
    max_index: u32,
    width: u32,
    height: u32,
) -> Result<(u32, Box<dyn FrameSource>), CaptureError> {
    let Some(selector) = selector else {
        return Err(CaptureError::DeviceUnavailable(
            "camera_index is not \"auto\" or a non-negative integer".to_string(),
        ));
    };

    let mut available = Vec::new();
    let index = match selector {
        CameraSelector::Index(i) => i,
        CameraSelector::Auto => {
            available = scan_devices(backend, max_index);
            if available.is_empty() {
                return Err(CaptureError::DeviceUnavailable(format!(
                    "no device opened in indices 0..{}",
                    max_index
                )));
            }
            info!("Detected device indices: {:?}", available);
            available[0]
        }
    };

    let Some(mut source) = backend.open(index) else {
        let hint = if available.is_empty() {
            "check the connection or the camera_index setting".to_string()
        } else {
            format!("detected indices were {:?}", available)
        };
        return Err(CaptureError::DeviceUnavailable(format!(
            "device {} could not be opened ({})",
            index, hint
        )));
    };

    source.configure(width, height);
    info!("Device {} opened ({}x{})", index, width, height);
    Ok((index, source))
}

/// Owns the frame source for the session and releases it exactly once
pub struct SourceGuard {
    source: Option<Box<dyn FrameSource>>,
}

impl SourceGuard {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self { source: Some(source) }
    }

    /// Read a frame; fails once released
    pub fn read(&mut self) -> Result<CapturedFrame, CaptureError> {
        match self.source.as_mut() {
            Some(source) => source.read(),
            None => Err(CaptureError::FrameRead("source already released".to_string())),
        }
    }

    pub fn is_released(&self) -> bool {
        self.source.is_none()
    }

    /// Release the source; later calls are no-ops
    pub fn release(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
            info!("Frame source released");
        }
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        self.release();
    }
}
