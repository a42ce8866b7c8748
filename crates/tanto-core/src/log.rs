//! Session-local error log.
//!
//! Every compilation session collects human-readable error strings here.
//! No partial output is produced on failure; the caller reads the log.

/// Accumulates rendered error messages for one compilation session.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    errors: Vec<String>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.errors.clear();
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.errors.push(text.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}
