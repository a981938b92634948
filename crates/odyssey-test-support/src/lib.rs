//! Shared test backends and fixtures for the Odyssey adventure service.

mod backend;
mod fixtures;

pub use backend::{FailingBackend, ScriptedBackend, StallingBackend};
pub use fixtures::sample_adventure;
