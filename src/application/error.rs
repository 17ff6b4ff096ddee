//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::TreeError;

/// Application errors wrap tree errors and add description and config context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid description: {message}")]
    Description { message: String },

    #[error("{location}: {source}")]
    Item {
        location: String,
        #[source]
        source: TreeError,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    pub(crate) fn item(location: &str, source: TreeError) -> Self {
        Self::Item {
            location: location.to_string(),
            source,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
