//! # upkeep-store
//!
//! Durable persistence layer for Upkeep.
//!
//! This crate provides:
//! - A synchronous string-keyed storage-medium abstraction with in-memory
//!   and file-backed implementations
//! - The typed record store with corruption tolerance (a malformed stored
//!   value never reaches a caller; the supplied fallback does)
//! - A blob store for locally-held label images
//! - The appliance repository: CRUD plus field-level partial updates over
//!   the saved-appliance collection, with a single-slot delete undo
//! - Sub-resource updaters (care tasks, documents, research reports, chat
//!   history) expressed as partial-update payloads
//! - The saved-services and knowledge-base collections
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use upkeep_store::{ApplianceRepository, MemoryMedium, RecordStore};
//!
//! let store = RecordStore::new(Arc::new(MemoryMedium::new()));
//! let repo = ApplianceRepository::new(store);
//! assert!(repo.appliances().is_empty());
//! ```

pub mod alerts;
pub mod blobs;
pub mod knowledge;
pub mod medium;
pub mod ops;
pub mod record_store;
pub mod repository;
pub mod services;
pub mod subresources;

// Re-export core types
pub use upkeep_core::*;

pub use alerts::warranty_alerts;
pub use blobs::{BlobStore, MemoryBlobStore};
pub use medium::{FileMedium, MemoryMedium, StorageMedium};
pub use record_store::RecordStore;
pub use repository::{AppliancePatch, ApplianceRepository};
pub use services::{is_service_saved, toggle_service};
