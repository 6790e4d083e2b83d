//! # Transcript Collector
//!
//! Accumulates results in arrival order. Downstream consumers join partial and
//! final segments positionally, so order is part of the contract.

use serde::Serialize;
use std::fmt;

/// One decoded result message from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptionResult {
    pub text: String,
    /// Server-reported mode, e.g. `"2pass-online"`, `"2pass-offline"`
    pub mode: String,
    pub is_final: bool,
    pub timestamp: Option<String>,
}

impl TranscriptionResult {
    pub fn new(
        text: impl Into<String>,
        mode: impl Into<String>,
        is_final: bool,
        timestamp: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            mode: mode.into(),
            is_final,
            timestamp,
        }
    }
}

/// Renders the CLI line format: `[<mode>] <text> | timestamp: <ts> [FINAL]`.
impl fmt::Display for TranscriptionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.mode, self.text)?;
        if let Some(ts) = self.timestamp.as_deref().filter(|ts| !ts.is_empty()) {
            write!(f, " | timestamp: {}", ts)?;
        }
        if self.is_final {
            f.write_str(" [FINAL]")?;
        }
        Ok(())
    }
}

/// Append-only, ordered result list owned by the receive duty.
///
/// The only way out is [`TranscriptCollector::into_results`], called once the
/// session has closed cleanly. A failed session drops the collector instead.
#[derive(Debug, Default)]
pub struct TranscriptCollector {
    results: Vec<TranscriptionResult>,
}

impl TranscriptCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: TranscriptionResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether a final result has been recorded.
    pub fn has_final(&self) -> bool {
        self.results.iter().any(|r| r.is_final)
    }

    pub fn into_results(self) -> Vec<TranscriptionResult> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_arrival_order() {
        let mut collector = TranscriptCollector::new();
        collector.push(TranscriptionResult::new("a", "2pass-online", false, None));
        collector.push(TranscriptionResult::new("b", "2pass-online", false, None));
        assert!(!collector.has_final());
        collector.push(TranscriptionResult::new("ab", "2pass-offline", true, None));
        assert!(collector.has_final());

        let texts: Vec<String> = collector.into_results().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["a", "b", "ab"]);
    }

    #[test]
    fn test_display_line_format() {
        let partial = TranscriptionResult::new("hello", "2pass-online", false, None);
        assert_eq!(partial.to_string(), "[2pass-online] hello");

        let last = TranscriptionResult::new("hello.", "2pass-offline", true, Some("[[0,500]]".into()));
        assert_eq!(
            last.to_string(),
            "[2pass-offline] hello. | timestamp: [[0,500]] [FINAL]"
        );
    }
}
