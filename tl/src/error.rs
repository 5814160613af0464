//! Template catalog error types

use std::path::PathBuf;

use letterrender::LetterError;
use thiserror::Error;

use crate::form::FormError;

/// Errors that can occur while loading templates from disk
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("No templates found in {0}")]
    Empty(PathBuf),

    #[error("Template '{id}': {problem}")]
    InvalidEntry { id: String, problem: String },

    #[error("Duplicate template id: {0}")]
    DuplicateId(String),

    #[error("Template not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Letter(#[from] LetterError),
}

impl CatalogError {
    /// Check if the requested template id is unknown
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }
}
