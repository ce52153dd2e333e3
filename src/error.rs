//! Error types
//!
//! Gameplay never fails: invalid requests (toggling mid-transition, picking a
//! locked mission, input after a game ended) are ignored. The only fallible
//! path is loading tuning data.

use std::io;

/// Errors raised while loading or validating [`crate::Tuning`]
#[derive(thiserror::Error, Debug)]
pub enum TuningError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Tuning parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl TuningError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
