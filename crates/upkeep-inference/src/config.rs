//! Configuration for the Gemini backend.

use upkeep_core::defaults;

/// Configuration for the Gemini `generateContent` backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key appended as the `key` query parameter (optional for local
    /// emulators).
    pub api_key: Option<String>,
    /// Fast model for extraction, estimates, and chat.
    pub flash_model: String,
    /// Stronger model for profile generation and deep research.
    pub pro_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::GEMINI_URL.to_string(),
            api_key: None,
            flash_model: defaults::FLASH_MODEL.to_string(),
            pro_model: defaults::PRO_MODEL.to_string(),
            timeout_seconds: defaults::GEN_TIMEOUT_SECS,
        }
    }
}

impl GeminiConfig {
    /// Create from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var(defaults::ENV_GEMINI_BASE_URL)
                .unwrap_or_else(|_| defaults::GEMINI_URL.to_string()),
            api_key: std::env::var(defaults::ENV_GEMINI_API_KEY).ok(),
            flash_model: std::env::var(defaults::ENV_GEMINI_FLASH_MODEL)
                .unwrap_or_else(|_| defaults::FLASH_MODEL.to_string()),
            pro_model: std::env::var(defaults::ENV_GEMINI_PRO_MODEL)
                .unwrap_or_else(|_| defaults::PRO_MODEL.to_string()),
            timeout_seconds: std::env::var(defaults::ENV_GEMINI_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::GEN_TIMEOUT_SECS),
        }
    }
}
