//! License key inventory import.
//!
//! Admins paste or upload keys in bulk, one per line. Parsing is strict about
//! malformed keys (so a bad paste is caught before anything reaches the API)
//! and lenient about formatting noise.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a key batch.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyImportError {
    /// A line held something that cannot be a key.
    #[error("line {line}: {reason}")]
    InvalidKey {
        /// 1-based line number in the input.
        line: usize,
        /// What is wrong with it.
        reason: String,
    },
    /// No keys were found in the input.
    #[error("no license keys found in input")]
    Empty,
}

/// A single license key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseKey(String);

impl LicenseKey {
    /// Longest key accepted.
    pub const MAX_LENGTH: usize = 128;

    /// Validate a single trimmed key.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason if the key is empty, too long, or
    /// contains whitespace.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("key is empty".to_owned());
        }
        if raw.chars().count() > Self::MAX_LENGTH {
            return Err(format!(
                "key is longer than {} characters",
                Self::MAX_LENGTH
            ));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err("key contains whitespace".to_owned());
        }
        Ok(Self(raw.to_owned()))
    }

    /// The key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A de-duplicated batch of keys ready for import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyBatch {
    keys: Vec<LicenseKey>,
    duplicates: usize,
}

impl KeyBatch {
    /// Parse keys from text, one per line.
    ///
    /// Lines are trimmed; blank lines and `#` comments are skipped. Repeated
    /// keys are dropped (first occurrence wins) and counted.
    ///
    /// # Errors
    ///
    /// Returns [`KeyImportError::InvalidKey`] for the first malformed line, or
    /// [`KeyImportError::Empty`] if no key remains.
    pub fn parse(text: &str) -> Result<Self, KeyImportError> {
        let mut seen = HashSet::new();
        let mut batch = Self::default();

        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let key = LicenseKey::parse(trimmed).map_err(|reason| KeyImportError::InvalidKey {
                line: index + 1,
                reason,
            })?;

            if seen.insert(key.clone()) {
                batch.keys.push(key);
            } else {
                batch.duplicates += 1;
            }
        }

        if batch.keys.is_empty() {
            return Err(KeyImportError::Empty);
        }
        Ok(batch)
    }

    /// Unique keys in input order.
    #[must_use]
    pub fn keys(&self) -> &[LicenseKey] {
        &self.keys
    }

    /// Number of unique keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the batch holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// How many repeated lines were dropped.
    #[must_use]
    pub const fn duplicates(&self) -> usize {
        self.duplicates
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blank_lines_and_comments() {
        let input = "# batch 7\nAAAA-BBBB-CCCC\n\n   DDDD-EEEE-FFFF  \n";
        let batch = KeyBatch::parse(input).unwrap();
        let keys: Vec<_> = batch.keys().iter().map(LicenseKey::as_str).collect();
        assert_eq!(keys, vec!["AAAA-BBBB-CCCC", "DDDD-EEEE-FFFF"]);
        assert_eq!(batch.duplicates(), 0);
    }

    #[test]
    fn test_parse_drops_duplicates() {
        let batch = KeyBatch::parse("K1\nK2\nK1\nK1\n").unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.duplicates(), 2);
    }

    #[test]
    fn test_parse_reports_line_of_bad_key() {
        let err = KeyBatch::parse("K1\n\nK2 K3\n").unwrap_err();
        assert_eq!(
            err,
            KeyImportError::InvalidKey {
                line: 3,
                reason: "key contains whitespace".to_owned(),
            }
        );
    }

    #[test]
    fn test_parse_rejects_overlong_key() {
        let input = "X".repeat(LicenseKey::MAX_LENGTH + 1);
        assert!(matches!(
            KeyBatch::parse(&input),
            Err(KeyImportError::InvalidKey { line: 1, .. })
        ));
    }

    #[test]
    fn test_length_limit_counts_characters() {
        let at_limit = "É".repeat(LicenseKey::MAX_LENGTH);
        assert!(at_limit.len() > LicenseKey::MAX_LENGTH);
        assert_eq!(LicenseKey::parse(&at_limit).unwrap().as_str(), at_limit);

        let over = "É".repeat(LicenseKey::MAX_LENGTH + 1);
        assert!(LicenseKey::parse(&over).is_err());
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(KeyBatch::parse("\n# nothing\n"), Err(KeyImportError::Empty));
    }
}
