//! Gemini implementation of the `GenerationBackend` port.
//!
//! Supports both schema-enforced generation (JSON output decoded against a
//! response schema) and free-text generation (raw text handed back for
//! normalization).

pub mod client;
pub mod config;
pub mod schema;
