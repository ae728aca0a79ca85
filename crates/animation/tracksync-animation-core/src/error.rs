//! Error types for building animation configs and loading assets.
//!
//! Playback operations themselves never fail; see the tracker module.

use serde::{Deserialize, Serialize};

/// Errors raised while constructing configs or reading asset documents.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TrackSyncError {
    /// Duration must be finite and strictly positive.
    #[error("Invalid animation duration: {duration}")]
    InvalidDuration { duration: f64 },

    /// Asset document could not be parsed
    #[error("Parse error: {reason}")]
    Parse { reason: String },

    /// Asset source has nothing under this reference
    #[error("Animation asset not found: {reference}")]
    AssetNotFound { reference: String },

    /// IO error
    #[error("IO error: {reason}")]
    Io { reason: String },
}

impl TrackSyncError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidDuration { .. } => "validation",
            Self::Parse { .. } => "serialization",
            Self::AssetNotFound { .. } => "data",
            Self::Io { .. } => "io",
        }
    }
}

impl From<std::io::Error> for TrackSyncError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TrackSyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}
