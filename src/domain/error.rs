//! Domain-level errors (no external dependencies)

use std::fmt;

use thiserror::Error;

use crate::domain::types::{RelationshipType, ValueType};

/// Tree and value errors. All are ordinary results, none leaves a partial
/// mutation behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("relationship '{relationship}' with value type '{value_type}' not allowed here")]
    InvalidRelationshipOrValueType {
        relationship: RelationshipType,
        value_type: ValueType,
    },

    #[error("no content item given")]
    NullNode,

    #[error("operation requires a current content item")]
    EmptyCursor,

    #[error("invalid concept name: {0}")]
    InvalidConceptName(String),

    #[error("invalid {value_type} value: {reason}")]
    InvalidValue {
        value_type: ValueType,
        reason: String,
    },

    #[error("value type mismatch: expected {expected}, found {found}")]
    ValueTypeMismatch {
        expected: ValueType,
        found: ValueType,
    },
}

impl TreeError {
    pub(crate) fn invalid_value(value_type: ValueType, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            value_type,
            reason: reason.into(),
        }
    }
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Failed insertion of an owned value.
///
/// Holds the value handed back to the caller when ownership reverts, dropping
/// the rejection destroys it.
pub struct Rejected<T> {
    error: TreeError,
    value: Option<T>,
}

impl<T> Rejected<T> {
    pub(crate) fn returned(error: TreeError, value: T) -> Self {
        Self {
            error,
            value: Some(value),
        }
    }

    pub(crate) fn discarded(error: TreeError) -> Self {
        Self { error, value: None }
    }

    pub fn error(&self) -> &TreeError {
        &self.error
    }

    /// The rejected value, `None` if it was destroyed.
    pub fn into_inner(self) -> Option<T> {
        self.value
    }

    pub fn into_error(self) -> TreeError {
        self.error
    }

    pub fn is_returned(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .field("returned", &self.value.is_some())
            .finish()
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

/// Transparent over the wrapped error: same message, same source.
impl<T> std::error::Error for Rejected<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

impl<T> From<Rejected<T>> for TreeError {
    fn from(value: Rejected<T>) -> Self {
        value.error
    }
}
