//! # upkeep-core
//!
//! Core types, errors, and shared defaults for the Upkeep appliance-care
//! assistant.
//!
//! This crate provides the domain model (saved appliances and their
//! sub-resources), the crate-wide error type, lenient deserialization
//! helpers for data read back from untrusted storage, and the structured
//! logging field constants used across every Upkeep crate.

pub mod defaults;
pub mod error;
pub mod lenient;
pub mod logging;
pub mod models;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
