//! Error types shared across Renderkit crates.

use std::path::PathBuf;

/// Top-level error type for Renderkit operations.
#[derive(Debug, thiserror::Error)]
pub enum RenderkitError {
    #[error("Composition not found: {id}")]
    CompositionNotFound { id: String },

    #[error("Invalid composition: {message}")]
    InvalidComposition { message: String },

    #[error("Invalid selection: {message}")]
    InvalidSelection { message: String },

    #[error("A render submission is already in flight")]
    SubmissionInFlight,

    #[error("The render dialog has been closed")]
    DialogClosed,

    #[error("Render queue error: {message}")]
    Queue { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using RenderkitError.
pub type RenderkitResult<T> = Result<T, RenderkitError>;

impl RenderkitError {
    pub fn composition_not_found(id: impl Into<String>) -> Self {
        Self::CompositionNotFound { id: id.into() }
    }

    pub fn invalid_composition(msg: impl Into<String>) -> Self {
        Self::InvalidComposition {
            message: msg.into(),
        }
    }

    pub fn invalid_selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection {
            message: msg.into(),
        }
    }

    pub fn queue(msg: impl Into<String>) -> Self {
        Self::Queue {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RenderkitError::composition_not_found("intro");
        assert_eq!(err.to_string(), "Composition not found: intro");

        let err = RenderkitError::invalid_selection("mp3 is not a video codec");
        assert!(err.to_string().starts_with("Invalid selection:"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RenderkitError = io.into();
        assert!(matches!(err, RenderkitError::Io(_)));
    }
}
