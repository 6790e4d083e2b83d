//! # Hotword Table
//!
//! Hotwords bias the recognizer toward specific vocabulary. They are read from a
//! plain-text file with one `"<phrase words> <weight>"` entry per line:
//!
//! ```text
//! machine learning 20
//! Rust 15
//! ```
//!
//! The server expects the table as a JSON object *encoded as a string* inside the
//! initialization message, so [`HotwordTable::to_json_string`] is the only output.
//! Phrases keep the order of their first appearance in the file.

use crate::error::{ClientError, ClientResult};
use serde::{Serialize, Serializer};
use std::path::Path;
use tracing::debug;

/// Phrase → boost weight mapping in file order. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotwordTable {
    entries: Vec<(String, u64)>,
}

impl HotwordTable {
    /// Load a hotword file.
    ///
    /// ## Errors:
    /// - **HotwordFileError**: file missing/unreadable, or a line whose last
    ///   token is not a non-negative integer, or a line with no phrase
    pub fn load(path: &Path) -> ClientResult<Self> {
        if !path.exists() {
            return Err(ClientError::HotwordFileError(format!(
                "Hotword file not found: {}",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClientError::HotwordFileError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let table = Self::parse(&contents)?;
        debug!("Loaded {} hotwords from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parse hotword definitions from text. Blank lines are skipped; a repeated
    /// phrase keeps its last weight.
    pub fn parse(contents: &str) -> ClientResult<Self> {
        let mut table = Self::default();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            let invalid = || ClientError::HotwordFileError(format!("Invalid hotword line: {}", line));

            let (weight, phrase) = match tokens.split_last() {
                Some((weight, phrase)) if !phrase.is_empty() => (*weight, phrase),
                _ => return Err(invalid()),
            };
            if !weight.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            let weight: u64 = weight.parse().map_err(|_| invalid())?;

            table.insert(phrase.join(" "), weight);
        }

        Ok(table)
    }

    /// Add one entry. A phrase already present keeps its position and takes the
    /// new weight.
    pub fn insert(&mut self, phrase: impl Into<String>, weight: u64) {
        let phrase = phrase.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == phrase) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((phrase, weight)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The table as a JSON object string; an empty table is `"{}"`.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Serialize for HotwordTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(phrase, weight)| (phrase, weight)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_serializes_to_empty_object() {
        assert_eq!(HotwordTable::default().to_json_string(), "{}");
    }

    #[test]
    fn test_parse_multi_word_phrases() {
        let table = HotwordTable::parse("machine   learning 20\n\n  Rust 15  \n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.to_json_string(), r#"{"machine learning":20,"Rust":15}"#);
    }

    #[test]
    fn test_file_order_is_kept() {
        let table = HotwordTable::parse("zebra 1\napple 2\nmango 3\n").unwrap();
        assert_eq!(table.to_json_string(), r#"{"zebra":1,"apple":2,"mango":3}"#);
    }

    #[test]
    fn test_later_duplicate_wins_in_first_position() {
        let table = HotwordTable::parse("tokio 10\nserde 5\ntokio 30\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.to_json_string(), r#"{"tokio":30,"serde":5}"#);
    }

    #[test]
    fn test_weights_wider_than_32_bits() {
        let table = HotwordTable::parse("big 10000000000\n").unwrap();
        assert_eq!(table.to_json_string(), r#"{"big":10000000000}"#);
    }

    #[test]
    fn test_rejects_lines_without_numeric_weight() {
        for bad in ["just words", "lonely", "phrase -5", "phrase 1.5", "phrase +3"] {
            let err = HotwordTable::parse(bad).unwrap_err();
            assert!(
                matches!(err, ClientError::HotwordFileError(_)),
                "expected HotwordFileError for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join(format!("missing-{}.txt", uuid::Uuid::new_v4()));
        assert!(matches!(
            HotwordTable::load(&path),
            Err(ClientError::HotwordFileError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("hotwords-{}.txt", uuid::Uuid::new_v4()));
        std::fs::write(&path, "阿里巴巴 20\nhello world 10\n").unwrap();

        let table = HotwordTable::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.to_json_string(), r#"{"阿里巴巴":20,"hello world":10}"#);
    }
}
