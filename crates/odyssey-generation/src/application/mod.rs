//! Application services: response normalization and the retry controller.

pub mod command_handlers;
pub mod normalizer;
