//! Command abstractions.

use uuid::Uuid;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (used in log fields).
    fn command_type(&self) -> &'static str;

    /// Correlation ID shared by every log line the command produces.
    fn correlation_id(&self) -> Uuid;
}
