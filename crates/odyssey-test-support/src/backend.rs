//! Stub `GenerationBackend` implementations for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use odyssey_core::backend::{BackendMode, BackendOutput, GenerationBackend};
use odyssey_core::error::GenerationError;
use odyssey_core::wire::WireFormat;

/// A backend that replays a scripted sequence of results, one per call, and
/// records every prompt it receives. Once the script runs out, every further
/// call returns a backend error.
#[derive(Debug)]
pub struct ScriptedBackend {
    mode: BackendMode,
    wire_format: WireFormat,
    script: Mutex<VecDeque<Result<BackendOutput, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    /// Create a free-text backend replaying `script`.
    #[must_use]
    pub fn free_text(script: Vec<Result<BackendOutput, GenerationError>>) -> Self {
        Self::with_mode(BackendMode::FreeText, script)
    }

    /// Create a structured backend replaying `script`.
    #[must_use]
    pub fn structured(script: Vec<Result<BackendOutput, GenerationError>>) -> Self {
        Self::with_mode(BackendMode::Structured, script)
    }

    fn with_mode(mode: BackendMode, script: Vec<Result<BackendOutput, GenerationError>>) -> Self {
        Self {
            mode,
            wire_format: WireFormat::Underscored,
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Override the wire format the backend reports.
    #[must_use]
    pub fn with_wire_format(mut self, wire_format: WireFormat) -> Self {
        self.wire_format = wire_format;
        self
    }

    /// Returns a snapshot of every prompt received, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Returns the number of calls made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn mode(&self) -> BackendMode {
        self.mode
    }

    fn wire_format(&self) -> WireFormat {
        self.wire_format
    }

    async fn invoke(&self, prompt: &str) -> Result<BackendOutput, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Backend("script exhausted".into())))
    }
}

/// A backend that always fails with a backend error. Useful for testing
/// retry exhaustion and the paths that must never reach the backend.
#[derive(Debug, Default)]
pub struct FailingBackend {
    calls: Mutex<usize>,
}

impl FailingBackend {
    /// Create a new failing backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of calls made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl GenerationBackend for FailingBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::FreeText
    }

    fn wire_format(&self) -> WireFormat {
        WireFormat::Underscored
    }

    async fn invoke(&self, _prompt: &str) -> Result<BackendOutput, GenerationError> {
        *self.calls.lock().unwrap() += 1;
        Err(GenerationError::Backend(
            "upstream returned 503 Service Unavailable".into(),
        ))
    }
}

/// A backend that sleeps for a fixed delay before failing. Used to exercise
/// per-attempt deadlines.
#[derive(Debug)]
pub struct StallingBackend {
    delay: Duration,
    calls: Mutex<usize>,
}

impl StallingBackend {
    /// Create a backend that stalls for `delay` on every call.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: Mutex::new(0),
        }
    }

    /// Returns the number of calls made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl GenerationBackend for StallingBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::FreeText
    }

    fn wire_format(&self) -> WireFormat {
        WireFormat::Underscored
    }

    async fn invoke(&self, _prompt: &str) -> Result<BackendOutput, GenerationError> {
        *self.calls.lock().unwrap() += 1;
        tokio::time::sleep(self.delay).await;
        Err(GenerationError::Backend("stalled backend woke up".into()))
    }
}
