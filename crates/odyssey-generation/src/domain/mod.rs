//! Domain types and pure logic for adventure generation.

pub mod commands;
pub mod prompt;
pub mod request;
