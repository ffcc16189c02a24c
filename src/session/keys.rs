//! Control keys
//!
//! Two bindings drive the session: one starts a capture, one ends the session.
//! Headless runs read them as tokens from stdin.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use std::io::BufRead;
use std::time::Duration;
use tracing::{debug, warn};

/// Session control signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKey {
    Capture,
    Quit,
}

/// Anything the session loop can poll for control keys
pub trait KeySource {
    /// Wait at most `wait` for a key
    fn poll(&mut self, wait: Duration) -> Option<ControlKey>;
}

/// Configured key names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    capture: String,
    quit: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new("space", "q")
    }
}

impl KeyBindings {
    pub fn new(capture: &str, quit: &str) -> Self {
        let mut capture = normalize_key_name(capture);
        let quit = normalize_key_name(quit);
        if quit == capture {
            capture = if quit == "space" { "c" } else { "space" }.to_string();
            warn!("Capture and quit keys are both '{}', capture falls back to '{}'", quit, capture);
        }
        Self { capture, quit }
    }

    pub fn capture(&self) -> &str {
        &self.capture
    }

    pub fn quit(&self) -> &str {
        &self.quit
    }

    /// Map an input token to a control key
    pub fn classify(&self, token: &str) -> Option<ControlKey> {
        let name = normalize_key_name(token);
        if name == self.quit {
            Some(ControlKey::Quit)
        } else if name == self.capture {
            Some(ControlKey::Capture)
        } else {
            None
        }
    }

    /// Instruction text for overlays
    pub fn instructions(&self) -> String {
        format!(
            "Press [{}] to OCR, [{}] to quit",
            self.capture.to_uppercase(),
            self.quit
        )
    }
}

fn normalize_key_name(name: &str) -> String {
    // A bare newline or space is the space bar
    let trimmed = name.trim();
    if trimmed.is_empty() {
        "space".to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// Key source fed by a reader thread, one token per line. End of input quits.
pub struct LineKeys {
    rx: Receiver<ControlKey>,
}

impl LineKeys {
    /// Read tokens from stdin
    pub fn stdin(bindings: KeyBindings) -> Self {
        Self::spawn(std::io::BufReader::new(std::io::stdin()), bindings)
    }

    pub fn spawn<R: BufRead + Send + 'static>(reader: R, bindings: KeyBindings) -> Self {
        let (tx, rx) = unbounded();
        std::thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                match bindings.classify(&line) {
                    Some(key) => {
                        if tx.send(key).is_err() {
                            return;
                        }
                    }
                    None => debug!("Ignoring key input {:?}", line),
                }
            }
            let _ = tx.send(ControlKey::Quit);
        });
        Self { rx }
    }
}

impl KeySource for LineKeys {
    fn poll(&mut self, wait: Duration) -> Option<ControlKey> {
        match self.rx.recv_timeout(wait) {
            Ok(key) => Some(key),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(ControlKey::Quit),
        }
    }
}
