//! Pipeline error types.

use adsurf_media::MediaError;
use adsurf_models::{ArtifactError, PhaseState, TuningError};
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input unreadable: {0}")]
    InputUnreadable(String),

    #[error("{0}")]
    Sequence(String),

    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline cancelled")]
    Cancelled,

    #[error("Illegal phase transition from {from} to {to}")]
    InvalidTransition { from: PhaseState, to: PhaseState },

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Media error: {0}")]
    Media(MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn input_unreadable(msg: impl Into<String>) -> Self {
        Self::InputUnreadable(msg.into())
    }

    pub fn sequence(msg: impl Into<String>) -> Self {
        Self::Sequence(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Errors caused by caller input rather than by the pipeline itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::InputUnreadable(_) | PipelineError::Config(_))
    }

    /// Errors that leave the pipeline state untouched.
    pub fn is_sequence_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Sequence(_) | PipelineError::InvalidTransition { .. }
        )
    }
}

impl From<MediaError> for PipelineError {
    fn from(e: MediaError) -> Self {
        if e.is_input_unreadable() {
            return Self::InputUnreadable(e.to_string());
        }
        match e {
            MediaError::Degenerate(msg) => Self::NumericDegeneracy(msg),
            MediaError::FrameNotInContour(frame) => {
                Self::NumericDegeneracy(format!("frame {} has no stored quad", frame))
            }
            MediaError::InvalidConfig(msg) => Self::Config(msg),
            MediaError::Cancelled => Self::Cancelled,
            other => Self::Media(other),
        }
    }
}

impl From<TuningError> for PipelineError {
    fn from(e: TuningError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_media_errors_are_classified() {
        let e: PipelineError = MediaError::FileNotFound(PathBuf::from("/x.mp4")).into();
        assert!(matches!(e, PipelineError::InputUnreadable(_)));
        assert!(e.is_client_error());

        let e: PipelineError = MediaError::degenerate("zero area").into();
        assert!(matches!(e, PipelineError::NumericDegeneracy(_)));

        let e: PipelineError = MediaError::invalid_config("window").into();
        assert!(matches!(e, PipelineError::Config(_)));

        let e: PipelineError = MediaError::Timeout(5).into();
        assert!(matches!(e, PipelineError::Media(MediaError::Timeout(5))));
        assert!(!e.is_client_error());
    }

    #[test]
    fn test_sequence_errors() {
        assert!(PipelineError::sequence("run scan first").is_sequence_error());
        assert!(PipelineError::InvalidTransition {
            from: PhaseState::Idle,
            to: PhaseState::Inserting
        }
        .is_sequence_error());
        assert!(!PipelineError::Cancelled.is_sequence_error());
    }
}
