//! Adventure generation bounded context.
//!
//! Turns structured generation parameters into a prompt, drives a
//! text-generation backend through a bounded number of attempts, and
//! normalizes whatever comes back into a validated adventure document.

pub mod application;
pub mod domain;
