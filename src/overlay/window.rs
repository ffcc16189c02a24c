//! Live preview window
//!
//! Shows the rendered live frames in an eframe window and feeds the window's
//! key presses to the capture session. One session step runs per repaint.

use anyhow::Result;
use eframe::egui;
use image::RgbImage;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{error, info, warn};

use crate::error::SessionError;
use crate::session::{CaptureSession, ControlKey, KeyBindings, SessionState};

/// Map a configured key name onto an egui key
pub fn egui_key(name: &str) -> Option<egui::Key> {
    let mut chars = name.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => return None,
    };
    egui::Key::from_name(name).or_else(|| egui::Key::from_name(&capitalized))
}

/// Preview window driving a capture session
pub struct PreviewApp {
    session: CaptureSession,
    capture_key: Option<egui::Key>,
    quit_key: Option<egui::Key>,
    texture: Option<egui::TextureHandle>,
    frame_size: Option<[usize; 2]>,
    /// Fatal session error, read back after the window closes
    failure: Rc<RefCell<Option<SessionError>>>,
}

impl PreviewApp {
    pub fn new(session: CaptureSession, bindings: &KeyBindings, failure: Rc<RefCell<Option<SessionError>>>) -> Self {
        let capture_key = egui_key(bindings.capture());
        let quit_key = egui_key(bindings.quit());
        if capture_key.is_none() {
            warn!("Capture key '{}' has no window equivalent", bindings.capture());
        }
        if quit_key.is_none() {
            warn!("Quit key '{}' has no window equivalent, close the window to quit", bindings.quit());
        }

        Self {
            session,
            capture_key,
            quit_key,
            texture: None,
            frame_size: None,
            failure,
        }
    }

    pub fn options() -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([980.0, 620.0])
                .with_min_inner_size([480.0, 320.0])
                .with_title("Label Text Recognition"),
            ..Default::default()
        }
    }

    fn pressed_key(&self, ctx: &egui::Context) -> Option<ControlKey> {
        ctx.input(|i| {
            if self.quit_key.is_some_and(|k| i.key_pressed(k)) {
                Some(ControlKey::Quit)
            } else if self.capture_key.is_some_and(|k| i.key_pressed(k)) {
                Some(ControlKey::Capture)
            } else {
                None
            }
        })
    }

    fn update_texture(&mut self, ctx: &egui::Context, display: &RgbImage) {
        let size = [display.width() as usize, display.height() as usize];
        let color_image = egui::ColorImage::from_rgb(size, display.as_raw());

        match self.texture.as_mut() {
            Some(texture) if self.frame_size == Some(size) => {
                texture.set(color_image, egui::TextureOptions::LINEAR);
            }
            _ => {
                self.texture = Some(ctx.load_texture("live_preview", color_image, egui::TextureOptions::LINEAR));
                self.frame_size = Some(size);
            }
        }
    }

    /// Advance the session by one frame
    fn step(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.session.stop();
            return;
        }

        let Some(live) = self.session.next_frame() else {
            return;
        };
        self.update_texture(ctx, &live.display);

        if let Some(key) = self.pressed_key(ctx) {
            if let Err(e) = self.session.handle_key(key, &live) {
                error!("Capture session aborted: {}", e);
                self.session.stop();
                *self.failure.borrow_mut() = Some(e);
            }
        }
    }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.step(ctx);

        if self.session.state() == SessionState::Stopped {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let status = match self.session.last_outcome() {
                Some(outcome) => outcome.summary(&self.session.thresholds()),
                None => "No capture yet".to_string(),
            };
            ui.label(status);
        });

        egui::CentralPanel::default().show(ctx, |ui| match &self.texture {
            Some(texture) => {
                ui.centered_and_justified(|ui| {
                    ui.add(egui::Image::new(texture).shrink_to_fit());
                });
            }
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label("Waiting for frames...");
                });
            }
        });

        ctx.request_repaint();
    }
}

/// Run the preview window until the session stops
pub fn run_preview(session: CaptureSession, bindings: &KeyBindings) -> Result<()> {
    let failure = Rc::new(RefCell::new(None));
    let app = PreviewApp::new(session, bindings, failure.clone());

    info!("Opening live preview window");
    eframe::run_native(
        "Label Text Recognition",
        PreviewApp::options(),
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("Preview window error: {}", e))?;

    let failure = failure.borrow_mut().take();
    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
