//! Application Coordinator
//!
//! Wires configuration, frame source, OCR engines, result sink and key input
//! into a capture session, then runs it in the preview window or headless.

use anyhow::{Context, Result};
use tracing::info;

use crate::capture::{open_device, scan_devices, ImageFolderBackend};
use crate::config::{AppConfig, SessionConfig};
use crate::error::SessionError;
use crate::overlay::window::run_preview;
use crate::session::{CaptureSession, KeyBindings, LineKeys};
use crate::storage::JsonExporter;
use crate::vision::{build_engines, DetectionEngine, SidecarEngine, TextPainter};

/// Main application coordinator
pub struct LabelTextApp {
    config: AppConfig,
    /// Run without the preview window even if enabled in the config
    headless: bool,
}

impl LabelTextApp {
    pub fn new(config: AppConfig, headless: bool) -> Self {
        Self { config, headless }
    }

    fn backend(&self) -> ImageFolderBackend {
        let source = &self.config.source;
        ImageFolderBackend::new(source.root.clone(), source.hold_frames, source.looping)
    }

    /// Indices of every device that opens
    pub fn list_devices(&self) -> Vec<u32> {
        scan_devices(&self.backend(), self.config.camera_probe_max)
    }

    /// One engine per configured language
    fn engines(&self) -> Vec<Box<dyn DetectionEngine>> {
        let sidecar_dir = self.config.engine.sidecar_dir.clone();
        build_engines(&self.config.ocr_langs, |lang| {
            Box::new(SidecarEngine::new(lang, sidecar_dir.clone()))
        })
    }

    /// Open the device and assemble the session
    pub fn build_session(&self) -> Result<(CaptureSession, KeyBindings)> {
        let session_config = SessionConfig::from_app_config(&self.config);
        let bindings = KeyBindings::new(&self.config.capture_key, &self.config.quit_key);

        let (index, source) = open_device(
            &self.backend(),
            self.config.camera_index.resolve(),
            self.config.camera_probe_max,
            self.config.frame_width,
            self.config.frame_height,
        )
        .map_err(SessionError::from)
        .context("Failed to open a frame source")?;
        info!("Using device {}", index);

        let mut engines = self.engines();
        if engines.len() > 1 {
            let extra: Vec<&str> = engines[1..].iter().map(|e| e.language()).collect();
            info!("Additional OCR languages loaded: {:?}", extra);
        }
        let engine = engines.remove(0);
        info!("Main OCR engine language: {}", engine.language());

        let painter = TextPainter::load(self.config.visualization.font_path.as_deref());
        let session = CaptureSession::new(
            session_config,
            source,
            engine,
            Box::new(JsonExporter),
            painter,
            &bindings,
        );

        Ok((session, bindings))
    }

    /// Run the session until quit or a fatal error
    pub fn run(self) -> Result<()> {
        let (mut session, bindings) = self.build_session()?;

        if self.config.visualization.live_preview && !self.headless {
            return run_preview(session, &bindings);
        }

        info!("Running headless: {}", bindings.instructions());
        println!("{} (type the key name and press Enter, empty line = space)", bindings.instructions());
        let mut keys = LineKeys::stdin(bindings);
        session.run(&mut keys, &mut |_| {})?;
        Ok(())
    }
}
