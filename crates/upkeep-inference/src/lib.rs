//! # upkeep-inference
//!
//! AI collaborator boundary for Upkeep.
//!
//! This crate provides:
//! - The [`ApplianceAssistant`] trait: every structured or free-text
//!   operation the application asks of the hosted model
//! - A Gemini `generateContent` backend over HTTP
//! - SSE stream parsing for incrementally-delivered chat replies
//! - A mock assistant for deterministic testing (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use upkeep_inference::{ApplianceAssistant, GeminiAssistant};
//!
//! #[tokio::main]
//! async fn main() {
//!     let assistant = GeminiAssistant::from_env().unwrap();
//!     let tip = assistant.pro_tip().await.unwrap();
//!     println!("{tip}");
//! }
//! ```

pub mod assistant;
pub mod client;
pub mod config;
pub mod streaming;
pub mod types;

// Mock assistant for deterministic testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use upkeep_core::*;

pub use assistant::{ApplianceAssistant, GeminiAssistant};
pub use client::GeminiClient;
pub use config::GeminiConfig;
pub use streaming::{ChatChunk, ChatStream};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockAssistant;
