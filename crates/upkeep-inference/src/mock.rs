//! Mock assistant for deterministic testing.
//!
//! Provides canned responses for every assistant operation, per-operation
//! failure injection, and a call log for assertions.
//!
//! ## Usage
//!
//! ```rust
//! use upkeep_inference::mock::MockAssistant;
//! use upkeep_inference::ApplianceAssistant;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let assistant = MockAssistant::new().with_failure("generate_profile");
//! assert!(assistant.pro_tip().await.is_ok());
//! # }
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use upkeep_core::{
    ApplianceDetails, CareTask, ChatMessage, Error, ExtractedDocInfo, GeoPoint, GroundedText,
    LocalService, MaintenanceProfile, ProfileGeneration, Result, SourceRef,
};

use crate::assistant::ApplianceAssistant;
use crate::streaming::{ChatChunk, ChatStream};

/// Deterministic appliance details for tests.
pub fn sample_details() -> ApplianceDetails {
    ApplianceDetails {
        make: "Acme".to_string(),
        model: "X100".to_string(),
        kind: "Refrigerator".to_string(),
        serial_number: Some("SN-001".to_string()),
        due_date: None,
    }
}

/// A three-task profile with one local service, around the given details.
pub fn sample_profile(details: ApplianceDetails) -> MaintenanceProfile {
    let task = |name: &str, frequency: &str| CareTask {
        task: name.to_string(),
        description: format!("{} for the {}", name, details.kind),
        frequency: frequency.to_string(),
        instructions: vec!["Unplug the unit first".to_string()],
        youtube_link: None,
        reminder: None,
        last_completed: None,
        sources: Vec::new(),
    };

    MaintenanceProfile {
        care_schedule: vec![
            task("Clean condenser coils", "Every 6 months"),
            task("Replace water filter", "Every 6 months"),
            task("Check door seals", "Monthly"),
        ],
        local_services: vec![LocalService {
            name: "FixIt Co".to_string(),
            address: "1 Main St".to_string(),
            phone: Some("555-0100".to_string()),
            website: Some("https://fixit.example".to_string()),
            recommendation: Some("Factory authorized".to_string()),
        }],
        appliance_details: details,
    }
}

#[derive(Debug, Clone)]
struct MockConfig {
    details: ApplianceDetails,
    model_version: String,
    doc_info: ExtractedDocInfo,
    research: GroundedText,
    answer: GroundedText,
    tip: String,
    repairs: Vec<String>,
    chat_reply: String,
    chat_sources: Vec<SourceRef>,
    suggestions: Vec<String>,
    failing_ops: HashSet<String>,
    fail_chat_mid_stream: bool,
    latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            details: sample_details(),
            model_version: "mock-pro".to_string(),
            doc_info: ExtractedDocInfo {
                store: Some("Best Appliances".to_string()),
                purchase_date: Some("2025-11-02".to_string()),
                total_price: Some("$499.00".to_string()),
                warranty_end_date: Some("2027-11-02".to_string()),
            },
            research: GroundedText {
                text: "## Overview\nMock research findings.".to_string(),
                sources: vec![SourceRef {
                    title: "Manufacturer".to_string(),
                    uri: "https://acme.example/manual".to_string(),
                }],
            },
            answer: GroundedText {
                text: "Mock answer.".to_string(),
                sources: Vec::new(),
            },
            tip: "Flush your water heater once a year.".to_string(),
            repairs: vec!["Not cooling".to_string(), "Leaking water".to_string()],
            chat_reply: "A low hum is normal compressor noise.".to_string(),
            chat_sources: Vec::new(),
            suggestions: vec!["How loud is too loud?".to_string()],
            failing_ops: HashSet::new(),
            fail_chat_mid_stream: false,
            latency_ms: 0,
        }
    }
}

/// A logged assistant call, for assertions.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

/// Mock [`ApplianceAssistant`] with canned responses.
#[derive(Clone, Default)]
pub struct MockAssistant {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Details returned by `analyze_label`.
    pub fn with_details(mut self, details: ApplianceDetails) -> Self {
        Arc::make_mut(&mut self.config).details = details;
        self
    }

    /// Model version stamped onto generated profiles.
    pub fn with_model_version(mut self, version: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).model_version = version.into();
        self
    }

    /// Fields returned by `extract_document`.
    pub fn with_document_info(mut self, info: ExtractedDocInfo) -> Self {
        Arc::make_mut(&mut self.config).doc_info = info;
        self
    }

    /// Report returned by `deep_research`.
    pub fn with_research(mut self, research: GroundedText) -> Self {
        Arc::make_mut(&mut self.config).research = research;
        self
    }

    /// Reply streamed by `chat_stream`.
    pub fn with_chat_reply(mut self, reply: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).chat_reply = reply.into();
        self
    }

    /// Sources attached to the streamed chat reply.
    pub fn with_chat_sources(mut self, sources: Vec<SourceRef>) -> Self {
        Arc::make_mut(&mut self.config).chat_sources = sources;
        self
    }

    /// Follow-up questions returned by `chat_suggestions`.
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        Arc::make_mut(&mut self.config).suggestions = suggestions;
        self
    }

    /// Make the named operation fail. Operation names match the trait
    /// method names, with `chat` covering `chat_stream`.
    pub fn with_failure(mut self, operation: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .failing_ops
            .insert(operation.into());
        self
    }

    /// Make `chat_stream` deliver one fragment and then fail.
    pub fn with_chat_mid_stream_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_chat_mid_stream = true;
        self
    }

    /// Simulated latency before each operation resolves.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// All logged calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of calls logged for one operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn log_call(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }

    async fn begin(&self, operation: &str, input: &str) -> Result<()> {
        self.log_call(operation, input);
        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }
        if self.config.failing_ops.contains(operation) {
            return Err(Error::Inference("Simulated failure for testing".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ApplianceAssistant for MockAssistant {
    async fn analyze_label(&self, _image: &[u8], mime_type: &str) -> Result<ApplianceDetails> {
        self.begin("analyze_label", mime_type).await?;
        Ok(self.config.details.clone())
    }

    async fn generate_profile(
        &self,
        details: &ApplianceDetails,
        _location: Option<GeoPoint>,
    ) -> Result<ProfileGeneration> {
        self.begin("generate_profile", &details.display_name()).await?;
        Ok(ProfileGeneration {
            profile: sample_profile(details.clone()),
            model_version: self.config.model_version.clone(),
        })
    }

    async fn extract_document(&self, _image: &[u8], mime_type: &str) -> Result<ExtractedDocInfo> {
        self.begin("extract_document", mime_type).await?;
        Ok(self.config.doc_info.clone())
    }

    async fn deep_research(&self, topic: &str, _details: &ApplianceDetails) -> Result<GroundedText> {
        self.begin("deep_research", topic).await?;
        Ok(self.config.research.clone())
    }

    async fn cost_estimate(&self, job: &str, _location: &str) -> Result<GroundedText> {
        self.begin("cost_estimate", job).await?;
        Ok(self.config.answer.clone())
    }

    async fn knowledge_answer(
        &self,
        question: &str,
        _context: Option<&ApplianceDetails>,
    ) -> Result<GroundedText> {
        self.begin("knowledge_answer", question).await?;
        Ok(self.config.answer.clone())
    }

    async fn pro_tip(&self) -> Result<String> {
        self.begin("pro_tip", "").await?;
        Ok(self.config.tip.clone())
    }

    async fn suggested_repairs(&self, appliance_type: &str) -> Result<Vec<String>> {
        self.begin("suggested_repairs", appliance_type).await?;
        Ok(self.config.repairs.clone())
    }

    async fn chat_stream(
        &self,
        _details: &ApplianceDetails,
        _history: &[ChatMessage],
        message: &str,
    ) -> Result<ChatStream> {
        self.begin("chat", message).await?;

        if self.config.fail_chat_mid_stream {
            let items = vec![
                Ok(ChatChunk::Text("Let me check".to_string())),
                Err(Error::Inference("Simulated mid-stream failure".to_string())),
            ];
            return Ok(Box::pin(futures::stream::iter(items)));
        }

        // Split the canned reply so consumers see true incremental delivery.
        let reply = self.config.chat_reply.clone();
        let midpoint = reply.len() / 2;
        let split = reply
            .char_indices()
            .map(|(i, _)| i)
            .find(|&i| i >= midpoint)
            .unwrap_or(0);
        let (head, tail) = reply.split_at(split);

        let mut items = Vec::new();
        if !head.is_empty() {
            items.push(Ok(ChatChunk::Text(head.to_string())));
        }
        if !tail.is_empty() {
            items.push(Ok(ChatChunk::Text(tail.to_string())));
        }
        if !self.config.chat_sources.is_empty() {
            items.push(Ok(ChatChunk::Sources(self.config.chat_sources.clone())));
        }

        Ok(Box::pin(futures::stream::iter(items)))
    }

    async fn chat_suggestions(
        &self,
        user_query: &str,
        _model_response: &str,
    ) -> Result<Vec<String>> {
        self.begin("chat_suggestions", user_query).await?;
        Ok(self.config.suggestions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_mock_analyze_label() {
        let assistant = MockAssistant::new();
        let details = assistant.analyze_label(b"img", "image/jpeg").await.unwrap();
        assert_eq!(details.make, "Acme");
        assert_eq!(assistant.call_count("analyze_label"), 1);
    }

    #[tokio::test]
    async fn test_mock_profile_echoes_details() {
        let assistant = MockAssistant::new();
        let mut details = sample_details();
        details.make = "Borealis".to_string();

        let generated = assistant.generate_profile(&details, None).await.unwrap();
        assert_eq!(generated.profile.appliance_details.make, "Borealis");
        assert_eq!(generated.profile.care_schedule.len(), 3);
        assert_eq!(generated.model_version, "mock-pro");
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let assistant = MockAssistant::new().with_failure("generate_profile");

        assert!(assistant
            .generate_profile(&sample_details(), None)
            .await
            .is_err());
        // Other operations are unaffected.
        assert!(assistant.pro_tip().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_chat_streams_fragments() {
        let assistant = MockAssistant::new()
            .with_chat_reply("Hello world")
            .with_chat_sources(vec![SourceRef {
                title: "X".to_string(),
                uri: "https://x".to_string(),
            }]);

        let stream = assistant
            .chat_stream(&sample_details(), &[], "hi")
            .await
            .unwrap();
        let chunks: Vec<_> = stream.map(|c| c.unwrap()).collect().await;

        let text: String = chunks
            .iter()
            .filter_map(|c| match c {
                ChatChunk::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "Hello world");
        assert!(matches!(chunks.last().unwrap(), ChatChunk::Sources(s) if s.len() == 1));
    }

    #[tokio::test]
    async fn test_mock_chat_mid_stream_failure() {
        let assistant = MockAssistant::new().with_chat_mid_stream_failure();
        let stream = assistant
            .chat_stream(&sample_details(), &[], "hi")
            .await
            .unwrap();
        let chunks: Vec<_> = stream.collect().await;

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_ok());
        assert!(chunks[1].is_err());
    }

    #[tokio::test]
    async fn test_mock_call_log() {
        let assistant = MockAssistant::new();
        assistant.pro_tip().await.unwrap();
        assistant.suggested_repairs("Washer").await.unwrap();

        let calls = assistant.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].operation, "suggested_repairs");
        assert_eq!(calls[1].input, "Washer");
    }
}
