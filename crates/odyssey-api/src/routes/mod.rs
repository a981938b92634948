//! Route modules.

pub mod adventures;
pub mod health;
