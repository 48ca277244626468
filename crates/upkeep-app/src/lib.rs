//! # upkeep-app
//!
//! Application flow controller for Upkeep.
//!
//! This crate wires the durable store, the blob store, and the AI
//! collaborator into a [`Session`]: a small finite sequencer
//! (idle → analyzing → confirming → fetching → results) that drives which
//! view an embedding shell shows and invokes the collaborator at
//! well-defined transition points. All mutation entry points are
//! synchronous read-modify-write steps; operations that wait on the
//! collaborator suspend without blocking unrelated interaction.

pub mod location;
pub mod session;
pub mod telemetry;

// Re-export core types
pub use upkeep_core::*;

pub use location::{FixedLocation, LocationProvider, NoLocation};
pub use session::{AppState, Session};
