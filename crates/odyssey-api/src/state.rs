//! Shared application state.

use std::collections::HashSet;
use std::sync::Arc;

use odyssey_core::backend::GenerationBackend;
use odyssey_core::wire::WireFormat;
use odyssey_generation::application::command_handlers::GenerationSettings;
use tokio_util::sync::CancellationToken;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Text-generation backend.
    pub backend: Arc<dyn GenerationBackend>,
    /// Retry policy and adventure limits.
    pub settings: GenerationSettings,
    /// Key spellings of adventures returned to clients.
    pub response_format: WireFormat,
    /// Accepted API tokens.
    pub api_tokens: Arc<HashSet<String>>,
    /// Fires when the server begins shutting down.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        settings: GenerationSettings,
        response_format: WireFormat,
        api_tokens: HashSet<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            backend,
            settings,
            response_format,
            api_tokens: Arc::new(api_tokens),
            shutdown,
        }
    }
}
