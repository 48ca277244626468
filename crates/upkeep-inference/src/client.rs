//! HTTP client for the Gemini `generateContent` endpoint family.

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use reqwest::Client;
use tracing::{debug, info};

use upkeep_core::{Error, Result};

use crate::config::GeminiConfig;
use crate::types::{GeminiErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// Thin client over the Gemini HTTP API.
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Initializing Gemini backend: url={}, flash={}, pro={}",
            config.base_url, config.flash_model, config.pro_model
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str, method: &str, sse: bool) -> String {
        let mut url = format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        );
        let mut params = Vec::new();
        if sse {
            params.push("alt=sse".to_string());
        }
        if let Some(ref key) = self.config.api_key {
            params.push(format!("key={}", key));
        }
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        url
    }

    /// One-shot generation against `model`.
    pub async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        debug!(model, "gemini generate");

        let response = self
            .client
            .post(self.endpoint(model, "generateContent", false))
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))
    }

    /// Streaming generation against `model`, returning the raw SSE byte
    /// stream for [`crate::streaming::parse_sse_stream`].
    pub async fn generate_stream(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send>>>
    {
        debug!(model, "gemini generate (streaming)");

        let response = self
            .client
            .post(self.endpoint(model, "streamGenerateContent", true))
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        Ok(Box::pin(response.bytes_stream()))
    }

    async fn status_error(response: reqwest::Response) -> Error {
        let status = response.status();
        let message = match response.json::<GeminiErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => "Unknown error".to_string(),
        };
        Error::Inference(format!("Gemini returned {}: {}", status, message))
    }
}

/// Strip a Markdown code fence the model may wrap JSON in despite
/// instructions.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    body.trim().trim_end_matches("```").trim()
}
