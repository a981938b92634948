//! Command handlers for the generation context.
//!
//! `handle_generate_adventure` is the retry/recovery controller: it
//! validates the request, builds the prompt once, and then drives the
//! backend through a bounded number of attempts until one yields a document
//! that satisfies the adventure limits.

use std::time::Duration;

use odyssey_core::adventure::{AdventureLimits, DEFAULT_EXPOSITION_MAX_CHARS, GeneratedAdventure};
use odyssey_core::backend::{BackendOutput, GenerationBackend};
use odyssey_core::command::Command;
use odyssey_core::error::GenerationError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::application::normalizer;
use crate::domain::commands::GenerateAdventure;
use crate::domain::prompt::build_prompt;

/// Default number of attempts per generation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default deadline for a single backend call.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(90);

/// How many times, and for how long each time, the backend is tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Deadline applied to each backend call.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

/// Settings for the generation pipeline, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSettings {
    /// Retry policy.
    pub retry: RetryPolicy,
    /// Exposition length cap, in characters.
    pub exposition_max_chars: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            exposition_max_chars: DEFAULT_EXPOSITION_MAX_CHARS,
        }
    }
}

/// Result of a successfully handled generation.
#[derive(Debug)]
pub struct GenerationResult {
    /// The accepted adventure.
    pub adventure: GeneratedAdventure,
    /// The attempt that produced it (1-based).
    pub attempts: u32,
}

/// Handles the `GenerateAdventure` command.
///
/// Invalid requests fail before the backend is called. Backend and
/// malformed-response errors are logged and retried immediately until
/// `settings.retry.max_attempts` is reached. The cancellation token is
/// checked before every attempt; an attempt already in flight is not
/// interrupted by it.
///
/// # Errors
///
/// Returns `GenerationError::InvalidRequest` if the request fails
/// validation, `GenerationError::Cancelled` if `cancel` fires between
/// attempts, or `GenerationError::GenerationFailed` wrapping the last error
/// once every attempt has failed.
#[instrument(
    skip_all,
    fields(
        correlation_id = %command.correlation_id(),
        command_type = command.command_type(),
        game = %command.request.game,
    )
)]
pub async fn handle_generate_adventure(
    command: &GenerateAdventure,
    backend: &dyn GenerationBackend,
    settings: &GenerationSettings,
    cancel: &CancellationToken,
) -> Result<GenerationResult, GenerationError> {
    let limits = command
        .request
        .limits(settings.exposition_max_chars)
        .inspect_err(|e| warn!(error = %e, "rejecting generation request"))?;

    let prompt = build_prompt(&command.request, backend.wire_format());
    let max_attempts = settings.retry.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            warn!(attempt, "generation cancelled before attempt");
            return Err(GenerationError::Cancelled);
        }

        info!(attempt, max_attempts, mode = ?backend.mode(), "requesting adventure from backend");

        match run_attempt(backend, &prompt, &limits, settings.retry.attempt_timeout).await {
            Ok(adventure) => {
                info!(
                    attempt,
                    scenes = adventure.rising_action.len(),
                    "adventure accepted"
                );
                return Ok(GenerationResult {
                    adventure,
                    attempts: attempt,
                });
            }
            Err(err) if err.is_retryable() => {
                warn!(attempt, max_attempts, error = %err, "generation attempt failed");
                last_error = Some(err);
            }
            Err(err) => {
                error!(attempt, error = %err, "generation attempt failed with non-retryable error");
                return Err(err);
            }
        }
    }

    let Some(last) = last_error else {
        return Err(GenerationError::Backend("no attempt was made".to_owned()));
    };
    error!(attempts = max_attempts, error = %last, "adventure generation failed");
    Err(GenerationError::GenerationFailed {
        attempts: max_attempts,
        last: Box::new(last),
    })
}

/// One pass through the backend and, for free text, the normalizer.
async fn run_attempt(
    backend: &dyn GenerationBackend,
    prompt: &str,
    limits: &AdventureLimits,
    timeout: Duration,
) -> Result<GeneratedAdventure, GenerationError> {
    let Ok(result) = tokio::time::timeout(timeout, backend.invoke(prompt)).await else {
        return Err(GenerationError::Backend(format!(
            "backend did not respond within {}ms",
            timeout.as_millis()
        )));
    };
    let output = result?;

    match output {
        BackendOutput::Text(raw) => normalizer::normalize(&raw, limits),
        BackendOutput::Structured(adventure) => {
            limits.check(&adventure)?;
            Ok(adventure)
        }
    }
}
