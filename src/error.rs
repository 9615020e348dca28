//! Error handling for voiceprep
//!
//! Fatal errors (an invalid input root, an unreadable config) abort a run
//! before anything is dispatched. Everything else is raised per file and
//! turned into a counted failure at the item boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the voiceprep utilities
#[derive(Debug, Error)]
pub enum PrepError {
    /// Input path missing or not usable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File could not be decoded into samples
    #[error("Decode error for {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Samples could not be written out
    #[error("Encode error for {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    /// WAV reader/writer error
    #[error("WAV codec error: {0}")]
    WavCodec(#[from] hound::Error),

    /// Sample-rate conversion failed
    #[error("Resample error: {0}")]
    Resample(String),

    /// Voice activity detector rejected the input
    #[error("VAD error: {0}")]
    Vad(String),

    /// External tool not available
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// External tool exited with a failure status
    #[error("{tool} failed: {details}")]
    ToolFailed { tool: String, details: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid regular expression built from user data
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Directory traversal error
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl PrepError {
    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PrepError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn encode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PrepError::Encode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for voiceprep
pub type Result<T> = std::result::Result<T, PrepError>;
