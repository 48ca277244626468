//! Centralized default constants for the Upkeep system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Other crates reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// STORAGE KEYS
// =============================================================================

/// Storage key for the saved-appliance collection.
///
/// Key names match the original persisted shapes so existing records
/// round-trip unchanged.
pub const KEY_SAVED_APPLIANCES: &str = "savedAppliances";

/// Storage key for the saved repair-service collection.
pub const KEY_SAVED_SERVICES: &str = "savedServices";

/// Storage key for the knowledge-base collection.
pub const KEY_KNOWLEDGE_BASE: &str = "knowledgeBase";

/// Storage key for the login flag.
pub const KEY_LOGGED_IN: &str = "isLoggedIn";

// =============================================================================
// RECORD IDS
// =============================================================================

/// Prefix marking an appliance record that has not been committed yet.
pub const PROVISIONAL_ID_PREFIX: &str = "temp-";

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Gemini API base URL.
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Fast model used for extraction, estimates, and chat.
pub const FLASH_MODEL: &str = "gemini-2.5-flash";

/// Stronger model used for profile generation and deep research.
pub const PRO_MODEL: &str = "gemini-2.5-pro";

/// Timeout for generation requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Environment variable for the Gemini API key.
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Environment variable overriding the Gemini base URL.
pub const ENV_GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";

/// Environment variable overriding the fast model.
pub const ENV_GEMINI_FLASH_MODEL: &str = "GEMINI_FLASH_MODEL";

/// Environment variable overriding the stronger model.
pub const ENV_GEMINI_PRO_MODEL: &str = "GEMINI_PRO_MODEL";

/// Environment variable overriding the request timeout (seconds).
pub const ENV_GEMINI_TIMEOUT: &str = "GEMINI_TIMEOUT";

// =============================================================================
// CHAT
// =============================================================================

/// Maximum characters accepted for a single chat message.
pub const CHAT_MAX_CHARS: usize = 1000;

/// Apology appended to the transcript when a chat exchange fails mid-stream.
pub const CHAT_ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

// =============================================================================
// WARRANTY ALERTS
// =============================================================================

/// Days ahead within which a warranty expiration is surfaced as an alert.
pub const WARRANTY_ALERT_WINDOW_DAYS: i64 = 30;
