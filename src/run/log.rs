use std::sync::Mutex;
use tracing::{error, info};

const SEPARATOR: &str = "--------------------------------------------------------";

/// Transcript of one run, keyed by post id.
///
/// Every line is mirrored to `tracing`; the transcript backs
/// `generated/log.txt`.
#[derive(Debug)]
pub struct RunLog {
    post_id: String,
    post_number: u32,
    lines: Mutex<Vec<String>>,
}

impl RunLog {
    pub fn new(post_id: impl Into<String>, post_number: u32) -> Self {
        Self {
            post_id: post_id.into(),
            post_number,
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn info(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!(post_id = %self.post_id, post_number = self.post_number, "{}", message);
        self.push(format!("[INFO] #{} {}", self.post_number, message));
    }

    pub fn error(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        error!(post_id = %self.post_id, post_number = self.post_number, "{}", message);
        self.push(format!("[ERROR] #{} {}", self.post_number, message));
    }

    pub fn separator(&self) {
        self.push(SEPARATOR.to_string());
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn transcript(&self) -> String {
        self.lines().join("\n")
    }

    fn push(&self, line: String) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line);
    }
}
