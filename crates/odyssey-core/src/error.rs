//! Generation error taxonomy.

use thiserror::Error;

/// Top-level error type for the generation pipeline.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A generation parameter is missing or out of range.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The text-generation backend call failed (transport, quota, safety
    /// filter, or deadline).
    #[error("backend error: {0}")]
    Backend(String),

    /// Backend output could not be unwrapped, parsed, or validated.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Every attempt failed. `last` holds the error of the final attempt.
    #[error("adventure generation failed after {attempts} attempts")]
    GenerationFailed {
        /// Number of attempts made.
        attempts: u32,
        /// The error that ended the last attempt.
        #[source]
        last: Box<GenerationError>,
    },

    /// The caller cancelled the generation between attempts.
    #[error("generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Returns `true` for errors that another attempt may fix.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::MalformedResponse(_))
    }
}
