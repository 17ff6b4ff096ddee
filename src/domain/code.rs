//! Coded identifiers: concept names and coded values

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Code value, coding scheme designator and code meaning.
///
/// Two entries denote the same concept iff code value and coding scheme match,
/// the meaning is descriptive only and takes no part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodedEntry {
    #[serde(rename = "code")]
    code_value: String,
    #[serde(rename = "scheme")]
    coding_scheme: String,
    meaning: String,
}

impl CodedEntry {
    pub fn new(
        code_value: impl Into<String>,
        coding_scheme: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Self {
        Self {
            code_value: code_value.into(),
            coding_scheme: coding_scheme.into(),
            meaning: meaning.into(),
        }
    }

    pub fn code_value(&self) -> &str {
        &self.code_value
    }

    pub fn coding_scheme(&self) -> &str {
        &self.coding_scheme
    }

    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    /// All three components present (surrounding whitespace does not count).
    pub fn is_valid(&self) -> bool {
        !self.code_value.trim().is_empty()
            && !self.coding_scheme.trim().is_empty()
            && !self.meaning.trim().is_empty()
    }

    /// Same concept as `code_value` in `coding_scheme`.
    pub fn matches(&self, code_value: &str, coding_scheme: &str) -> bool {
        self.code_value == code_value && self.coding_scheme == coding_scheme
    }
}

impl PartialEq for CodedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.code_value, &other.coding_scheme)
    }
}

impl Eq for CodedEntry {}

impl Hash for CodedEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code_value.hash(state);
        self.coding_scheme.hash(state);
    }
}

impl fmt::Display for CodedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},\"{}\")",
            self.code_value, self.coding_scheme, self.meaning
        )
    }
}
