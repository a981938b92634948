//! Text-generation backend abstraction.

use std::str::FromStr;

use async_trait::async_trait;

use crate::adventure::GeneratedAdventure;
use crate::error::GenerationError;
use crate::wire::WireFormat;

/// How a backend returns its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// The backend decodes straight into the schema model and fails rather
    /// than return partial data.
    Structured,
    /// The backend returns raw text, possibly fence-wrapped, that must be
    /// normalized before use.
    FreeText,
}

impl FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "structured" => Ok(Self::Structured),
            "free-text" | "freetext" => Ok(Self::FreeText),
            other => Err(format!(
                "unknown backend mode '{other}', expected 'structured' or 'free-text'"
            )),
        }
    }
}

/// Raw result of a single backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutput {
    /// Unprocessed text from a free-text backend.
    Text(String),
    /// A document already decoded by a structured backend.
    Structured(GeneratedAdventure),
}

/// Capability trait for text-generation backends.
///
/// Implementations hold their own immutable configuration and keep no state
/// between calls, so one instance can serve concurrent generations.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// The mode this backend operates in.
    fn mode(&self) -> BackendMode;

    /// Key spellings this backend expects in prompts and produces in output.
    fn wire_format(&self) -> WireFormat;

    /// Sends `prompt` to the backend. Exactly one remote call per invocation.
    async fn invoke(&self, prompt: &str) -> Result<BackendOutput, GenerationError>;
}
