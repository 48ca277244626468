//! Structured logging schema and field name constants for Upkeep.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by standardized names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Swallowed storage-write failures, state the user may lose on reload |
//! | WARN  | Corrupted persisted data recovered by falling back to a default |
//! | INFO  | Flow transitions, record commits and deletions |
//! | DEBUG | Inference calls, decision points, config choices |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "store", "inference", "app"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "load", "save", "analyze_label", "generate_profile"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Storage key being read or written.
pub const STORAGE_KEY: &str = "storage_key";

/// Appliance record id being operated on.
pub const RECORD_ID: &str = "record_id";

/// Document id within an appliance record.
pub const DOCUMENT_ID: &str = "document_id";

/// Research report id within an appliance record.
pub const REPORT_ID: &str = "report_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Byte length of a prompt or serialized payload.
pub const PAYLOAD_LEN: &str = "payload_len";

/// Number of items in a collection after an operation.
pub const ITEM_COUNT: &str = "item_count";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
