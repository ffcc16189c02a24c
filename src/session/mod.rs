//! Capture Session
//!
//! A single cooperative loop: read a frame, render the live overlay, poll the
//! control keys. A capture key runs one complete detect → filter → merge →
//! classify → export cycle before the next frame is read, so captures never
//! overlap. The session owns the frame source and releases it exactly once,
//! whichever way the loop ends.

pub mod keys;
pub mod outcome;

use image::RgbImage;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::capture::frame::CapturedFrame;
use crate::capture::{FrameSource, SourceGuard};
use crate::config::SessionConfig;
use crate::error::{EngineError, PersistError, SessionError};
use crate::overlay::{render_debug_overlay, render_live_overlay, LiveOverlayOptions};
use crate::storage::{artifact_path, capture_timestamp, save_image, ResultSink};
use crate::vision::{
    definition_score, filter_by_confidence, merge_lines, validate_detections, Detection,
    DetectionEngine, LineRecord, TextPainter,
};

pub use keys::{ControlKey, KeyBindings, KeySource, LineKeys};
pub use outcome::{CaptureOutcome, Thresholds};

/// Key poll wait per loop iteration, also paces frames
pub const KEY_WAIT: Duration = Duration::from_millis(1);

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Reading and displaying frames, waiting for a key
    Live,
    /// Running a capture cycle
    Processing,
    /// Source released, loop finished
    Stopped,
}

/// One live frame with its definition score and rendered overlay
#[derive(Debug, Clone)]
pub struct LiveFrame {
    pub frame: CapturedFrame,
    pub sharpness: f64,
    pub display: RgbImage,
}

/// Detections that survived one engine run
#[derive(Debug, Clone)]
struct DetectionPass {
    raw_count: usize,
    kept: Vec<Detection>,
}

/// The capture session controller
pub struct CaptureSession {
    config: SessionConfig,
    source: SourceGuard,
    engine: Box<dyn DetectionEngine>,
    sink: Box<dyn ResultSink>,
    painter: TextPainter,
    overlay: LiveOverlayOptions,
    state: SessionState,
    /// Outcome of the latest capture, redrawn on live frames
    last_outcome: Option<CaptureOutcome>,
}

impl CaptureSession {
    pub fn new(
        config: SessionConfig,
        source: Box<dyn FrameSource>,
        engine: Box<dyn DetectionEngine>,
        sink: Box<dyn ResultSink>,
        painter: TextPainter,
        bindings: &KeyBindings,
    ) -> Self {
        let overlay = LiveOverlayOptions {
            instructions: bindings.instructions(),
            show_definition: config.show_definition,
            definition_threshold: config.definition_threshold,
            draw_boxes: config.live_draw_boxes,
            show_coords: config.live_show_coords,
        };

        Self {
            config,
            source: SourceGuard::new(source),
            engine,
            sink,
            painter,
            overlay,
            state: SessionState::Live,
            last_outcome: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_outcome(&self) -> Option<&CaptureOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            definition: self.config.definition_threshold,
            confidence: self.config.conf_threshold,
        }
    }

    /// Enter Stopped and release the frame source
    pub fn stop(&mut self) {
        if self.state != SessionState::Stopped {
            info!("Capture session stopping");
        }
        self.state = SessionState::Stopped;
        self.source.release();
    }

    /// Read and prepare the next live frame. `None` once stopped; a read
    /// failure stops the session.
    pub fn next_frame(&mut self) -> Option<LiveFrame> {
        if self.state == SessionState::Stopped {
            return None;
        }

        let frame = match self.source.read() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Cannot read a frame, check the device: {}", e);
                self.stop();
                return None;
            }
        };

        let sharpness = definition_score(&frame.image);
        let display = render_live_overlay(
            &frame.image,
            sharpness,
            self.last_outcome.as_ref(),
            &self.overlay,
            &self.painter,
        );

        Some(LiveFrame {
            frame,
            sharpness,
            display,
        })
    }

    /// React to a control key pressed while `live` was shown
    pub fn handle_key(&mut self, key: ControlKey, live: &LiveFrame) -> Result<Option<CaptureOutcome>, SessionError> {
        match key {
            ControlKey::Quit => {
                self.stop();
                Ok(None)
            }
            ControlKey::Capture if self.state == SessionState::Live => self.capture(live).map(Some),
            ControlKey::Capture => Ok(None),
        }
    }

    /// Run one capture cycle on `live` and return to Live.
    ///
    /// Engine failures become an outcome; persistence failures are returned.
    pub fn capture(&mut self, live: &LiveFrame) -> Result<CaptureOutcome, SessionError> {
        self.state = SessionState::Processing;
        let timestamp = capture_timestamp();
        let thresholds = self.thresholds();

        debug!("Capturing frame read {:?} ago", live.frame.timestamp.elapsed());
        if self.config.console_log {
            println!("\nCapture {} -> running OCR...", timestamp);
            println!("Definition score: {:.2}", live.sharpness);
        }

        // The engine works on its own copy, never the displayed frame
        let working = live.frame.clone();
        let (outcome, annotated) = match self.detect(&working) {
            Ok(pass) => {
                let (lines, annotated) = merge_lines(
                    working.image,
                    pass.kept,
                    self.config.y_thresh,
                    self.config.x_gap_thresh,
                    &self.painter,
                );
                (
                    outcome::classify(pass.raw_count, lines, live.sharpness, &thresholds),
                    annotated,
                )
            }
            Err(e) => {
                error!("OCR engine error: {}", e);
                (
                    CaptureOutcome::EngineError { message: e.to_string() },
                    working.image,
                )
            }
        };

        if self.config.save_output {
            let written = self.persist(&timestamp, &live.frame.image, &annotated, outcome.lines())?;
            if self.config.console_log && !written.is_empty() {
                println!("Saved:");
                for path in &written {
                    println!("- {}", path.display());
                }
            }
        }

        self.report(&outcome);
        self.last_outcome = Some(outcome.clone());
        self.state = SessionState::Live;
        Ok(outcome)
    }

    /// Run the engine, retrying once on failure when configured
    fn detect(&mut self, frame: &CapturedFrame) -> Result<DetectionPass, EngineError> {
        match self.detect_once(frame) {
            Err(e) if self.config.retry_on_error => {
                warn!("OCR failed ({}), retrying once", e);
                self.detect_once(frame)
            }
            result => result,
        }
    }

    fn detect_once(&mut self, frame: &CapturedFrame) -> Result<DetectionPass, EngineError> {
        let orientation_correction = self.config.orientation_correction;
        let engine = &mut self.engine;
        let raw = catch_unwind(AssertUnwindSafe(|| engine.recognize(frame, orientation_correction)))
            .map_err(|panic| EngineError::Failed(panic_message(panic.as_ref())))??;

        let raw_count = raw.len();
        let kept = filter_by_confidence(raw, self.config.conf_threshold);
        debug!("{} of {} detections above confidence threshold", kept.len(), raw_count);
        // Only detections headed for the merger need usable geometry
        validate_detections(&kept)?;

        Ok(DetectionPass { raw_count, kept })
    }

    fn persist(
        &self,
        timestamp: &str,
        original: &RgbImage,
        annotated: &RgbImage,
        lines: &[LineRecord],
    ) -> Result<Vec<PathBuf>, PersistError> {
        let export = &self.config.export;
        let mut written = Vec::new();

        if export.origin_image.enabled {
            let path = artifact_path(&export.origin_image, timestamp);
            save_image(original, &path)?;
            written.push(path);
        }

        if export.annotated_image.enabled {
            let path = artifact_path(&export.annotated_image, timestamp);
            save_image(annotated, &path)?;
            written.push(path);
        }

        if export.text_json.enabled {
            let path = artifact_path(&export.text_json, timestamp);
            if export.merge_bbox_into_text {
                self.sink.write_merged_json(lines, &path)?;
            } else {
                self.sink.write_line_json(lines, &path)?;
            }
            written.push(path);
        }

        if export.bbox_json.enabled {
            let path = artifact_path(&export.bbox_json, timestamp);
            self.sink.write_bbox_json(lines, &path)?;
            written.push(path);
        }

        if export.debug_image.enabled {
            let path = artifact_path(&export.debug_image, timestamp);
            save_image(&render_debug_overlay(annotated, lines, &self.painter), &path)?;
            written.push(path);
        }

        info!("Persisted {} artifact(s) for capture {}", written.len(), timestamp);
        Ok(written)
    }

    fn report(&self, outcome: &CaptureOutcome) {
        let thresholds = self.thresholds();
        match outcome {
            CaptureOutcome::Ok { lines, .. } => {
                info!("Capture recognized {} line(s)", lines.len());
                for line in lines {
                    debug!("Line {} word groups: {:?}", line.line_index, line.groups);
                }
            }
            CaptureOutcome::Empty { reason, .. } => info!("Capture empty: {:?}", reason),
            CaptureOutcome::EngineError { message } => warn!("Capture failed: {}", message),
        }

        if self.config.console_log {
            for line in outcome.status_lines(&thresholds) {
                println!("{}", line);
            }
        }
    }

    /// Drive the loop until quit or frame-read failure.
    ///
    /// `show` receives every rendered live frame.
    pub fn run(&mut self, keys: &mut dyn KeySource, show: &mut dyn FnMut(&RgbImage)) -> Result<(), SessionError> {
        info!("Capture session live");
        while let Some(live) = self.next_frame() {
            show(&live.display);

            if let Some(key) = keys.poll(KEY_WAIT) {
                if let Err(e) = self.handle_key(key, &live) {
                    error!("Capture session aborted: {}", e);
                    self.stop();
                    return Err(e);
                }
            }
        }
        self.stop();
        Ok(())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("engine panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("engine panicked: {}", s)
    } else {
        "engine panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::testing::FakeSource;
    use crate::session::outcome::{EmptyReason, QualityVerdict};
    use crate::vision::word;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::path::Path;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct ScriptedEngine {
        responses: VecDeque<Result<Vec<Detection>, EngineError>>,
        calls: Rc<Cell<u32>>,
    }

    impl DetectionEngine for ScriptedEngine {
        fn language(&self) -> &str {
            "en"
        }

        fn recognize(&mut self, _frame: &CapturedFrame, _orientation: bool) -> Result<Vec<Detection>, EngineError> {
            self.calls.set(self.calls.get() + 1);
            self.responses.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    struct PanickingEngine;

    impl DetectionEngine for PanickingEngine {
        fn language(&self) -> &str {
            "en"
        }

        fn recognize(&mut self, _frame: &CapturedFrame, _orientation: bool) -> Result<Vec<Detection>, EngineError> {
            panic!("model exploded")
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl ResultSink for RecordingSink {
        fn write_line_json(&self, lines: &[LineRecord], _path: &Path) -> Result<(), PersistError> {
            self.calls.borrow_mut().push(format!("lines:{}", lines.len()));
            Ok(())
        }

        fn write_bbox_json(&self, lines: &[LineRecord], _path: &Path) -> Result<(), PersistError> {
            self.calls.borrow_mut().push(format!("bbox:{}", lines.len()));
            Ok(())
        }

        fn write_merged_json(&self, lines: &[LineRecord], _path: &Path) -> Result<(), PersistError> {
            self.calls.borrow_mut().push(format!("merged:{}", lines.len()));
            Ok(())
        }
    }

    struct ScriptedKeys(VecDeque<Option<ControlKey>>);

    impl KeySource for ScriptedKeys {
        fn poll(&mut self, _wait: Duration) -> Option<ControlKey> {
            self.0.pop_front().flatten()
        }
    }

    struct Harness {
        session: CaptureSession,
        calls: Rc<Cell<u32>>,
        sink_calls: Rc<RefCell<Vec<String>>>,
        releases: Rc<RefCell<u32>>,
    }

    fn quiet_config() -> SessionConfig {
        let mut config = SessionConfig::default();
        config.save_output = false;
        config.console_log = false;
        config
    }

    fn harness(config: SessionConfig, responses: Vec<Result<Vec<Detection>, EngineError>>, frames: usize) -> Harness {
        let calls = Rc::new(Cell::new(0));
        let releases = Rc::new(RefCell::new(0));
        let sink = RecordingSink::default();
        let sink_calls = sink.calls.clone();

        let session = CaptureSession::new(
            config,
            Box::new(FakeSource {
                frames,
                size: (64, 48),
                releases: releases.clone(),
            }),
            Box::new(ScriptedEngine {
                responses: responses.into(),
                calls: calls.clone(),
            }),
            Box::new(sink),
            TextPainter::none(),
            &KeyBindings::default(),
        );

        Harness {
            session,
            calls,
            sink_calls,
            releases,
        }
    }

    fn capture_once(h: &mut Harness) -> CaptureOutcome {
        let live = h.session.next_frame().unwrap();
        h.session.handle_key(ControlKey::Capture, &live).unwrap().unwrap()
    }

    fn two_confidences() -> Vec<Detection> {
        vec![
            word(10.0, 10.0, 20.0, 10.0, "KEEP", 0.9),
            word(10.0, 30.0, 20.0, 10.0, "DROP", 0.3),
        ]
    }

    #[test]
    fn test_low_confidence_detection_never_reaches_merger() {
        let mut h = harness(quiet_config(), vec![Ok(two_confidences())], 5);

        match capture_once(&mut h) {
            CaptureOutcome::Ok { lines, .. } => {
                assert_eq!(lines.len(), 1);
                assert_eq!(lines[0].text, "KEEP");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(h.session.state(), SessionState::Live);
    }

    #[test]
    fn test_blurred_frame_with_lines_stays_ok() {
        // Fake frames are flat, so their definition score is 0
        let mut h = harness(quiet_config(), vec![Ok(two_confidences())], 5);
        let result = capture_once(&mut h);

        let CaptureOutcome::Ok { lines, sharpness } = &result else {
            panic!("unexpected outcome {:?}", result);
        };
        let verdict = outcome::quality_verdict(*sharpness, outcome::overall_confidence(lines), &h.session.thresholds());
        assert_eq!(verdict, QualityVerdict::Blurred);
    }

    #[test]
    fn test_blurred_frame_without_lines_is_empty_blurred() {
        let mut h = harness(quiet_config(), vec![Ok(vec![])], 5);
        assert!(matches!(
            capture_once(&mut h),
            CaptureOutcome::Empty { reason: EmptyReason::Blurred, .. }
        ));
    }

    #[test]
    fn test_sharp_empty_outcomes() {
        let mut config = quiet_config();
        config.definition_threshold = 0.0;
        let low = vec![word(0.0, 0.0, 5.0, 5.0, "x", 0.1)];
        let mut h = harness(config, vec![Ok(vec![]), Ok(low)], 5);

        assert!(matches!(
            capture_once(&mut h),
            CaptureOutcome::Empty { reason: EmptyReason::NoText, .. }
        ));
        assert!(matches!(
            capture_once(&mut h),
            CaptureOutcome::Empty { reason: EmptyReason::BelowConfidence, .. }
        ));
    }

    #[test]
    fn test_retry_recovers_from_one_failure() {
        let mut config = quiet_config();
        config.retry_on_error = true;
        let mut h = harness(
            config,
            vec![Err(EngineError::Failed("busy".to_string())), Ok(two_confidences())],
            5,
        );

        assert!(matches!(capture_once(&mut h), CaptureOutcome::Ok { .. }));
        assert_eq!(h.calls.get(), 2);
    }

    #[test]
    fn test_retry_happens_at_most_once() {
        let mut config = quiet_config();
        config.retry_on_error = true;
        let failure = || Err(EngineError::Failed("down".to_string()));
        let mut h = harness(config, vec![failure(), failure(), failure()], 5);

        assert!(matches!(capture_once(&mut h), CaptureOutcome::EngineError { .. }));
        assert_eq!(h.calls.get(), 2);
        assert_eq!(h.session.state(), SessionState::Live);
    }

    #[test]
    fn test_no_retry_when_disabled() {
        let mut h = harness(
            quiet_config(),
            vec![Err(EngineError::Failed("down".to_string())), Ok(two_confidences())],
            5,
        );

        assert!(matches!(capture_once(&mut h), CaptureOutcome::EngineError { .. }));
        assert_eq!(h.calls.get(), 1);
    }

    #[test]
    fn test_malformed_detections_become_engine_error() {
        let mut bad = word(0.0, 0.0, 5.0, 5.0, "x", 0.9);
        bad.quad[0].1 = f32::NAN;
        let mut h = harness(quiet_config(), vec![Ok(vec![bad])], 5);

        match capture_once(&mut h) {
            CaptureOutcome::EngineError { message } => assert!(message.contains("malformed")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_malformed_detection_below_threshold_is_ignored() {
        let mut bad = word(0.0, 0.0, 5.0, 5.0, "noise", 0.1);
        bad.quad[1].0 = f32::INFINITY;
        let mut h = harness(quiet_config(), vec![Ok(vec![bad, word(10.0, 10.0, 20.0, 10.0, "KEEP", 0.9)])], 5);

        match capture_once(&mut h) {
            CaptureOutcome::Ok { lines, .. } => {
                assert_eq!(lines.len(), 1);
                assert_eq!(lines[0].text, "KEEP");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_capture_leaves_live_frame_untouched() {
        let dir = TempDir::new().unwrap();
        let mut config = quiet_config();
        config.save_output = true;
        config.export.text_json.enabled = false;
        config.export.origin_image.pattern = "capture_{timestamp}.png".to_string();
        config.export.annotated_image.pattern = "capture_{timestamp}.png".to_string();
        export_into(&mut config, dir.path());

        let mut h = harness(config, vec![Ok(two_confidences())], 5);
        let live = h.session.next_frame().unwrap();
        let frame_before = live.frame.image.clone();
        let display_before = live.display.clone();

        let outcome = h.session.capture(&live).unwrap();
        assert_eq!(outcome.lines().len(), 1);
        assert_eq!(live.frame.image, frame_before);
        assert_eq!(live.display, display_before);

        // The merger drew on its own copy
        let png_in = |sub: &str| {
            let entry = std::fs::read_dir(dir.path().join(sub)).unwrap().next().unwrap().unwrap();
            image::open(entry.path()).unwrap().to_rgb8()
        };
        let origin = png_in("assets/pictures-origin");
        let annotated = png_in("assets/pictures");
        assert_eq!(origin, frame_before);
        assert_eq!(*annotated.get_pixel(20, 10), crate::vision::draw::palette_color(1));
        assert_ne!(*frame_before.get_pixel(20, 10), crate::vision::draw::palette_color(1));
    }

    #[test]
    fn test_engine_panic_is_contained() {
        let releases = Rc::new(RefCell::new(0));
        let mut session = CaptureSession::new(
            quiet_config(),
            Box::new(FakeSource {
                frames: 5,
                size: (8, 8),
                releases: releases.clone(),
            }),
            Box::new(PanickingEngine),
            Box::new(RecordingSink::default()),
            TextPainter::none(),
            &KeyBindings::default(),
        );

        let live = session.next_frame().unwrap();
        match session.capture(&live).unwrap() {
            CaptureOutcome::EngineError { message } => assert!(message.contains("model exploded")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(session.state(), SessionState::Live);
    }

    #[test]
    fn test_last_outcome_is_overwritten() {
        let mut h = harness(quiet_config(), vec![Ok(two_confidences()), Ok(vec![])], 5);
        assert!(h.session.last_outcome().is_none());

        capture_once(&mut h);
        assert!(matches!(h.session.last_outcome(), Some(CaptureOutcome::Ok { .. })));

        capture_once(&mut h);
        assert!(matches!(h.session.last_outcome(), Some(CaptureOutcome::Empty { .. })));
    }

    #[test]
    fn test_nothing_persisted_when_saving_disabled() {
        let mut h = harness(quiet_config(), vec![Ok(two_confidences())], 5);
        capture_once(&mut h);
        assert!(h.sink_calls.borrow().is_empty());
    }

    fn export_into(config: &mut SessionConfig, root: &Path) {
        for artifact in [
            &mut config.export.origin_image,
            &mut config.export.annotated_image,
            &mut config.export.text_json,
            &mut config.export.bbox_json,
            &mut config.export.debug_image,
        ] {
            artifact.dir = root.join(&artifact.dir);
        }
    }

    #[test]
    fn test_persistence_dispatch() {
        let dir = TempDir::new().unwrap();
        let mut config = quiet_config();
        config.save_output = true;
        config.export.bbox_json.enabled = true;
        config.export.debug_image.enabled = true;
        export_into(&mut config, dir.path());

        let mut h = harness(config, vec![Ok(two_confidences())], 5);
        capture_once(&mut h);

        assert_eq!(*h.sink_calls.borrow(), vec!["lines:1".to_string(), "bbox:1".to_string()]);
        for sub in ["assets/pictures-origin", "assets/pictures", "assets/pictures-debug"] {
            let count = std::fs::read_dir(dir.path().join(sub)).unwrap().count();
            assert_eq!(count, 1, "{}", sub);
        }
    }

    #[test]
    fn test_merged_text_json_when_configured() {
        let dir = TempDir::new().unwrap();
        let mut config = quiet_config();
        config.save_output = true;
        config.export.merge_bbox_into_text = true;
        config.export.origin_image.enabled = false;
        config.export.annotated_image.enabled = false;
        export_into(&mut config, dir.path());

        let mut h = harness(config, vec![Ok(two_confidences())], 5);
        capture_once(&mut h);

        assert_eq!(*h.sink_calls.borrow(), vec!["merged:1".to_string()]);
    }

    #[test]
    fn test_persistence_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let mut config = quiet_config();
        config.save_output = true;
        config.export.origin_image.dir = blocker.join("images");

        let mut h = harness(config, vec![Ok(two_confidences())], 5);
        let live = h.session.next_frame().unwrap();
        let result = h.session.handle_key(ControlKey::Capture, &live);
        assert!(matches!(result, Err(SessionError::Persistence(_))));
    }

    #[test]
    fn test_quit_stops_and_releases_once() {
        let mut h = harness(quiet_config(), vec![], 5);
        let live = h.session.next_frame().unwrap();

        assert!(h.session.handle_key(ControlKey::Quit, &live).unwrap().is_none());
        assert_eq!(h.session.state(), SessionState::Stopped);
        assert!(h.session.next_frame().is_none());

        drop(h.session);
        assert_eq!(*h.releases.borrow(), 1);
    }

    #[test]
    fn test_run_until_quit() {
        let mut h = harness(quiet_config(), vec![Ok(two_confidences())], 10);
        let mut keys = ScriptedKeys(VecDeque::from(vec![None, Some(ControlKey::Capture), None, Some(ControlKey::Quit)]));
        let mut shown = 0;

        h.session.run(&mut keys, &mut |_| shown += 1).unwrap();

        assert_eq!(shown, 4);
        assert_eq!(h.calls.get(), 1);
        assert_eq!(h.session.state(), SessionState::Stopped);
        assert_eq!(*h.releases.borrow(), 1);
    }

    #[test]
    fn test_run_stops_on_frame_read_failure() {
        let mut h = harness(quiet_config(), vec![], 3);
        let mut keys = ScriptedKeys(VecDeque::new());
        let mut shown = 0;

        h.session.run(&mut keys, &mut |_| shown += 1).unwrap();

        assert_eq!(shown, 3);
        assert_eq!(h.session.state(), SessionState::Stopped);
        assert_eq!(*h.releases.borrow(), 1);
    }

    #[test]
    fn test_run_releases_source_on_persistence_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let mut config = quiet_config();
        config.save_output = true;
        config.export.origin_image.dir = blocker.join("images");

        let mut h = harness(config, vec![Ok(two_confidences())], 10);
        let mut keys = ScriptedKeys(VecDeque::from(vec![Some(ControlKey::Capture)]));

        assert!(h.session.run(&mut keys, &mut |_| {}).is_err());
        assert_eq!(*h.releases.borrow(), 1);
    }
}
