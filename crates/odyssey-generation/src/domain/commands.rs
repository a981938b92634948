//! Commands for the generation context.

use odyssey_core::command::Command;
use uuid::Uuid;

use super::request::GenerationRequest;

/// Command to generate a complete adventure.
#[derive(Debug, Clone)]
pub struct GenerateAdventure {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The generation parameters.
    pub request: GenerationRequest,
}

impl Command for GenerateAdventure {
    fn command_type(&self) -> &'static str {
        "generation.generate_adventure"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
