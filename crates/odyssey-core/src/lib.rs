//! Shared generation abstractions for the Odyssey adventure service.
//!
//! This crate defines the adventure schema model, the wire-format
//! translation table, the generation backend port, and the error taxonomy
//! that every other crate depends on. It contains no infrastructure code.

pub mod adventure;
pub mod backend;
pub mod command;
pub mod error;
pub mod wire;
