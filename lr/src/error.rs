//! Letter rendering error types

use thiserror::Error;

/// Errors that can occur while parsing or rendering a letter template
///
/// Missing or malformed field values are never errors; filters fall back to
/// a pass-through or empty value instead.
#[derive(Debug, Error)]
pub enum LetterError {
    #[error("Failed to parse template {id}: {source}")]
    Parse {
        id: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("Failed to render template {id}: {source}")]
    Render {
        id: String,
        #[source]
        source: minijinja::Error,
    },
}

impl LetterError {
    /// Id of the template that failed
    pub fn template_id(&self) -> &str {
        match self {
            LetterError::Parse { id, .. } | LetterError::Render { id, .. } => id,
        }
    }

    /// Check if the template source itself is malformed
    pub fn is_parse(&self) -> bool {
        matches!(self, LetterError::Parse { .. })
    }

    /// Line in the template source the engine blamed, if known
    pub fn line(&self) -> Option<usize> {
        match self {
            LetterError::Parse { source, .. } | LetterError::Render { source, .. } => source.line(),
        }
    }
}
