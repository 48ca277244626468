//! The appliance assistant: every operation the application asks of the
//! hosted model, and its Gemini implementation.

use async_trait::async_trait;
use base64::Engine;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use upkeep_core::{
    ApplianceDetails, ChatMessage, ChatRole, Error, ExtractedDocInfo, GeoPoint, GroundedText,
    MaintenanceProfile, ProfileGeneration, Result,
};

use crate::client::{strip_code_fences, GeminiClient};
use crate::config::GeminiConfig;
use crate::streaming::{parse_sse_stream, ChatStream};
use crate::types::{Content, GenerateContentRequest, GenerationConfig, Part, Tool, ToolConfig};

/// The AI collaborator boundary.
///
/// Accepts an image and/or text prompt plus a target response shape and
/// returns structured data, optionally with attribution sources. Chat is
/// the one streaming operation.
#[async_trait]
pub trait ApplianceAssistant: Send + Sync {
    /// Extract make, model, and type from a label photo.
    async fn analyze_label(&self, image: &[u8], mime_type: &str) -> Result<ApplianceDetails>;

    /// Generate the full maintenance profile for confirmed details,
    /// optionally anchored to a device location.
    async fn generate_profile(
        &self,
        details: &ApplianceDetails,
        location: Option<GeoPoint>,
    ) -> Result<ProfileGeneration>;

    /// Extract store, price, and warranty dates from a receipt image.
    async fn extract_document(&self, image: &[u8], mime_type: &str) -> Result<ExtractedDocInfo>;

    /// In-depth research report on a maintenance topic.
    async fn deep_research(&self, topic: &str, details: &ApplianceDetails) -> Result<GroundedText>;

    /// Localized cost estimate for a repair job.
    async fn cost_estimate(&self, job: &str, location: &str) -> Result<GroundedText>;

    /// Answer a general maintenance question, optionally in the context of
    /// one appliance.
    async fn knowledge_answer(
        &self,
        question: &str,
        context: Option<&ApplianceDetails>,
    ) -> Result<GroundedText>;

    /// A short, appliance-agnostic maintenance tip.
    async fn pro_tip(&self) -> Result<String>;

    /// Common repair jobs for an appliance type. Degrades to empty on a
    /// malformed model reply.
    async fn suggested_repairs(&self, appliance_type: &str) -> Result<Vec<String>>;

    /// Send one chat message and stream the reply incrementally.
    async fn chat_stream(
        &self,
        details: &ApplianceDetails,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<ChatStream>;

    /// Follow-up questions for a completed chat exchange.
    async fn chat_suggestions(
        &self,
        user_query: &str,
        model_response: &str,
    ) -> Result<Vec<String>>;
}

// =============================================================================
// RESPONSE SCHEMAS
// =============================================================================

fn appliance_details_schema() -> JsonValue {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "make": {"type": "STRING", "description": "The brand or manufacturer of the appliance."},
            "model": {"type": "STRING", "description": "The model number or name of the appliance."},
            "type": {"type": "STRING", "description": "The general type of the appliance (e.g., Refrigerator, Washing Machine, Dishwasher)."},
            "serialNumber": {"type": "STRING", "description": "The serial number of the appliance, if visible."}
        },
        "required": ["make", "model", "type"]
    })
}

fn extracted_doc_info_schema() -> JsonValue {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "store": {"type": "STRING", "description": "The name of the store where the item was purchased."},
            "purchaseDate": {"type": "STRING", "description": "The date of purchase in ISO 8601 format (YYYY-MM-DD)."},
            "totalPrice": {"type": "STRING", "description": "The total price paid, including currency symbol."},
            "warrantyEndDate": {"type": "STRING", "description": "The date the warranty expires in ISO 8601 format (YYYY-MM-DD), if mentioned."}
        }
    })
}

fn string_array_schema() -> JsonValue {
    serde_json::json!({
        "type": "ARRAY",
        "items": {"type": "STRING"}
    })
}

// =============================================================================
// GEMINI IMPLEMENTATION
// =============================================================================

/// [`ApplianceAssistant`] backed by the Gemini API.
pub struct GeminiAssistant {
    client: GeminiClient,
}

impl GeminiAssistant {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::new(config)?,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env())
    }

    fn flash(&self) -> &str {
        &self.client.config().flash_model
    }

    fn pro(&self) -> &str {
        &self.client.config().pro_model
    }

    fn encode_image(image: &[u8], mime_type: &str) -> Part {
        let data = base64::engine::general_purpose::STANDARD.encode(image);
        Part::inline(mime_type, data)
    }

    /// Run a search-grounded free-text prompt on the given model.
    async fn grounded_text(&self, model: &str, prompt: String) -> Result<GroundedText> {
        let mut request = GenerateContentRequest::single(vec![Part::text(prompt)]);
        request.tools = Some(vec![Tool::search()]);

        let response = self.client.generate(model, &request).await?;
        let text = response
            .first_text()
            .ok_or_else(|| Error::Inference("Model returned an empty response".to_string()))?;
        let sources = response.sources();
        Ok(GroundedText { text, sources })
    }
}

#[async_trait]
impl ApplianceAssistant for GeminiAssistant {
    async fn analyze_label(&self, image: &[u8], mime_type: &str) -> Result<ApplianceDetails> {
        let prompt = "Analyze the image of the appliance label and extract the make, model, \
                      type, and serial number. The type should be a common name like \
                      'Refrigerator' or 'Washing Machine'.";

        let mut request = GenerateContentRequest::single(vec![
            Self::encode_image(image, mime_type),
            Part::text(prompt),
        ]);
        request.generation_config = Some(GenerationConfig::json(appliance_details_schema()));

        let response = self.client.generate(self.flash(), &request).await?;
        let text = response
            .first_text()
            .ok_or_else(|| Error::Inference("Model returned an empty response".to_string()))?;

        serde_json::from_str(text.trim()).map_err(|e| {
            warn!(error = %e, "label extraction returned unparseable JSON");
            Error::Inference(
                "AI returned invalid data. Please try again with a clearer image.".to_string(),
            )
        })
    }

    async fn generate_profile(
        &self,
        details: &ApplianceDetails,
        location: Option<GeoPoint>,
    ) -> Result<ProfileGeneration> {
        let prompt = format!(
            "Generate a complete maintenance profile for a {} {} ({}).\n\n\
             You MUST use your search and maps tools to find the following information:\n\
             1. A detailed care schedule with specific tasks, frequencies, and instructions. \
             Find how-to guides or YouTube links if possible.\n\
             2. At least three reputable, local repair services. For each service, provide its \
             name, address, phone number, and website.\n\n\
             Your entire response must be a single, raw JSON object. Do not wrap it in markdown \
             like ```json. Do not add any introductory or concluding text.\n\
             The JSON object must contain the following top-level keys: \"applianceDetails\", \
             \"careSchedule\", and \"localServices\".\n\
             The 'applianceDetails' in the JSON should be an exact copy of the details provided \
             below.",
            details.make, details.model, details.kind
        );
        let details_json = serde_json::to_string(details)?;

        let mut request = GenerateContentRequest::single(vec![
            Part::text(prompt),
            Part::text(format!("Appliance Details to use: {}", details_json)),
        ]);
        request.tools = Some(vec![Tool::search(), Tool::maps()]);
        if let Some(point) = location {
            request.tool_config = Some(ToolConfig::at(point.latitude, point.longitude));
        }

        let model = self.pro().to_string();
        debug!(model = %model, prompt_len = details_json.len(), "generating maintenance profile");
        let response = self.client.generate(&model, &request).await?;

        fn profile_error() -> Error {
            Error::Inference(
                "The AI couldn't generate a profile for this appliance. Please try again."
                    .to_string(),
            )
        }

        let text = response.first_text().ok_or_else(profile_error)?;
        let raw = strip_code_fences(&text);
        let value: JsonValue = serde_json::from_str(raw).map_err(|e| {
            warn!(error = %e, "profile generation returned unparseable JSON");
            profile_error()
        })?;

        // The model is asked for all three keys; an incomplete structure is
        // treated as a failed generation rather than silently defaulted.
        for key in ["applianceDetails", "careSchedule", "localServices"] {
            if value.get(key).is_none() {
                warn!(missing = key, "profile generation returned an incomplete structure");
                return Err(profile_error());
            }
        }

        let mut profile: MaintenanceProfile =
            serde_json::from_value(value).map_err(|_| profile_error())?;

        // Grounding sources apply to the schedule as a whole; copy them onto
        // every task for display next to each one.
        let sources = response.sources();
        if !sources.is_empty() {
            for task in &mut profile.care_schedule {
                task.sources = sources.clone();
            }
        }

        Ok(ProfileGeneration {
            profile,
            model_version: model,
        })
    }

    async fn extract_document(&self, image: &[u8], mime_type: &str) -> Result<ExtractedDocInfo> {
        let prompt = "Analyze the provided receipt or document image. Extract the store name, \
                      purchase date, total price, and warranty expiration date. Format dates \
                      as YYYY-MM-DD.";

        let mut request = GenerateContentRequest::single(vec![
            Self::encode_image(image, mime_type),
            Part::text(prompt),
        ]);
        request.generation_config = Some(GenerationConfig::json(extracted_doc_info_schema()));

        let response = self.client.generate(self.flash(), &request).await?;
        let text = response
            .first_text()
            .ok_or_else(|| Error::Inference("Model returned an empty response".to_string()))?;

        serde_json::from_str(text.trim()).map_err(|e| {
            warn!(error = %e, "document extraction returned unparseable JSON");
            Error::Inference("AI returned invalid data from the document scan.".to_string())
        })
    }

    async fn deep_research(&self, topic: &str, details: &ApplianceDetails) -> Result<GroundedText> {
        let prompt = format!(
            "As an expert home maintenance researcher AI, generate a comprehensive, in-depth \
             research report on the following topic: \"{topic}\".\n\
             This report is for a homeowner with a \"{} {}\" ({}).\n\n\
             **Report Requirements:**\n\
             1. **Synthesize Information:** Use your search tool extensively. Do not rely on a \
             single source. Synthesize findings from manufacturer documentation, professional \
             repair forums, user manuals, and trusted DIY websites to create a complete picture.\n\
             2. **Structured Output:** Format the entire response using Markdown. Use headings \
             (##), subheadings (###), bullet points (*), and bold text (**) to create a \
             well-organized and easily scannable document.\n\
             3. **Comprehensive Coverage:** The report MUST include the following sections where \
             applicable:\n\
             - **## Overview:** A brief introduction to the topic.\n\
             - **## Common Symptoms:** A list of signs that this issue is occurring.\n\
             - **## Diagnostic Steps:** A step-by-step guide to confirm the problem. Be specific \
             and safe.\n\
             - **## Tools & Parts:** A list of necessary tools and potential replacement parts \
             (include part numbers if you can find them).\n\
             - **## Step-by-Step Repair Guide:** Detailed, numbered instructions for the repair \
             or maintenance task. Include safety warnings.\n\
             - **## Cost Analysis:** An estimated cost breakdown for both a DIY approach (parts \
             only) and a professional repair (parts + labor).\n\
             - **## Pro-Tips & Prevention:** Expert advice to make the job easier and prevent \
             future issues.\n\
             4. **Action-Oriented Tone:** Write in a clear, direct, and encouraging tone \
             suitable for a homeowner.\n\n\
             Begin the report now.",
            details.make, details.model, details.kind
        );

        self.grounded_text(self.pro(), prompt).await
    }

    async fn cost_estimate(&self, job: &str, location: &str) -> Result<GroundedText> {
        let prompt = format!(
            "Provide a detailed cost estimate for the following home repair job: \"{job}\" in \
             the location: \"{location}\".\n\n\
             Instructions:\n\
             1. Use your search tool to find current, localized pricing information.\n\
             2. Break down the estimated costs into materials and labor.\n\
             3. Provide a low, average, and high price range for the total job.\n\
             4. Conclude with a brief paragraph explaining the key factors that can influence \
             the final cost, such as the specific brand of the appliance, the extent of the \
             damage, and regional labor rates. This helps manage user expectations."
        );

        self.grounded_text(self.flash(), prompt).await
    }

    async fn knowledge_answer(
        &self,
        question: &str,
        context: Option<&ApplianceDetails>,
    ) -> Result<GroundedText> {
        let mut prompt = format!(
            "As an expert home maintenance AI, answer the following question clearly and \
             concisely: \"{question}\".\n\n\
             Instructions:\n\
             1. Use your search tool to find the most accurate and reliable information.\n\
             2. If the answer involves steps, format it as a step-by-step guide with clear \
             headings and bullet points or a numbered list for easy readability.\n\
             3. If the answer is informational, structure it with brief paragraphs.\n\
             4. Always aim to provide actionable, easy-to-understand advice for a homeowner."
        );
        if let Some(details) = context {
            prompt.push_str(&format!(
                "\n\nThe user is asking in the context of the following appliance, so tailor \
                 your answer accordingly:\n- Type: {}\n- Make: {}\n- Model: {}",
                details.kind, details.make, details.model
            ));
        }

        self.grounded_text(self.flash(), prompt).await
    }

    async fn pro_tip(&self) -> Result<String> {
        let prompt = "Provide a concise, actionable home maintenance pro-tip that is not \
                      specific to any single appliance. The tip should be interesting and easy \
                      for a homeowner to understand. Max 2-3 sentences. Do not use markdown \
                      formatting.";

        let request = GenerateContentRequest::single(vec![Part::text(prompt)]);
        let response = self.client.generate(self.flash(), &request).await?;
        let text = response
            .first_text()
            .ok_or_else(|| Error::Inference("Model returned an empty response".to_string()))?;
        Ok(text.trim().to_string())
    }

    async fn suggested_repairs(&self, appliance_type: &str) -> Result<Vec<String>> {
        let prompt = format!(
            "For a \"{appliance_type}\", list 3 common repair jobs. Examples: \"Not cooling\", \
             \"Leaking water\", \"Making a loud noise\". Return the list as a simple JSON array \
             of strings."
        );

        let mut request = GenerateContentRequest::single(vec![Part::text(prompt)]);
        request.generation_config = Some(GenerationConfig::json(string_array_schema()));

        let response = self.client.generate(self.flash(), &request).await?;
        let Some(text) = response.first_text() else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(text.trim()) {
            Ok(repairs) => Ok(repairs),
            Err(e) => {
                warn!(error = %e, "suggested repairs returned unparseable JSON");
                Ok(Vec::new())
            }
        }
    }

    async fn chat_stream(
        &self,
        details: &ApplianceDetails,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<ChatStream> {
        let system = format!(
            "You are a helpful AI assistant for home maintenance, from the app Upkeep. You are \
             chatting with a user about their {} {} {}. Be concise and helpful. When asked \
             about troubleshooting, specific parts, or error codes, you MUST use your search \
             tool to find the most accurate and up-to-date information.",
            details.make, details.model, details.kind
        );

        // The wire transcript carries text parts only; sources and
        // suggestions are local decoration.
        let mut contents: Vec<Content> = history
            .iter()
            .map(|entry| {
                let parts = entry
                    .parts
                    .iter()
                    .map(|p| Part::text(p.text.clone()))
                    .collect();
                match entry.role {
                    ChatRole::User => Content::user(parts),
                    ChatRole::Model => Content::model(parts),
                }
            })
            .collect();
        contents.push(Content::user(vec![Part::text(message)]));

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content::bare(vec![Part::text(system)])),
            generation_config: None,
            tools: Some(vec![Tool::search()]),
            tool_config: None,
        };

        let stream = self.client.generate_stream(self.flash(), &request).await?;
        Ok(parse_sse_stream(stream))
    }

    async fn chat_suggestions(
        &self,
        user_query: &str,
        model_response: &str,
    ) -> Result<Vec<String>> {
        let prompt = format!(
            "You are a helpful home maintenance expert guiding a user. Your goal is to \
             anticipate their next logical steps and provide helpful, varied follow-up \
             questions.\n\n\
             Analyze the user's question and the AI's response below:\n\
             - User Question: \"{user_query}\"\n\
             - AI Response: \"{model_response}\"\n\n\
             Based on this exchange, generate 2-3 distinct and actionable follow-up questions. \
             The questions should help the user explore the topic further. Aim for a mix of \
             question types.\n\n\
             Consider these categories for inspiration:\n\
             - **Clarification:** \"Can you explain what a 'capacitor' is?\"\n\
             - **Troubleshooting:** \"What should I do if I see sparks?\"\n\
             - **Cost/Sourcing:** \"How much does that part typically cost?\"\n\
             - **Prevention:** \"Is there a way to prevent this from happening again?\"\n\
             - **Alternative Solutions:** \"Are there any DIY alternatives to this repair?\"\n\n\
             Return the questions as a simple JSON array of strings. Do not include category \
             names in the output."
        );

        let mut request = GenerateContentRequest::single(vec![Part::text(prompt)]);
        request.generation_config = Some(GenerationConfig::json(string_array_schema()));

        let response = self.client.generate(self.flash(), &request).await?;
        let text = response
            .first_text()
            .ok_or_else(|| Error::Inference("Model returned an empty response".to_string()))?;
        serde_json::from_str(text.trim())
            .map_err(|e| Error::Inference(format!("Failed to parse suggestions: {}", e)))
    }
}
