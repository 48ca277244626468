//! Core data models for Upkeep.
//!
//! These types are shared across all Upkeep crates and represent the
//! persisted domain entities. Field names serialize in camelCase so records
//! written by earlier clients load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;
use crate::lenient;

// =============================================================================
// RECORD IDENTITY
// =============================================================================

/// Identifier of a saved-appliance record.
///
/// Stored as an opaque string. Records that have not been committed to the
/// durable collection carry a provisional id with a `temp-` prefix so they
/// are distinguishable from saved ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a permanent record id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Generate a provisional id for a record that has not been saved yet.
    pub fn provisional() -> Self {
        Self(format!(
            "{}{}",
            defaults::PROVISIONAL_ID_PREFIX,
            Uuid::new_v4()
        ))
    }

    /// Whether this id marks an uncommitted record.
    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(defaults::PROVISIONAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// ATTRIBUTION
// =============================================================================

/// Where the AI collaborator found supporting information for a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub uri: String,
}

/// Deduplicate attribution sources by uri, preserving first-seen order.
pub fn dedup_by_uri(sources: Vec<SourceRef>) -> Vec<SourceRef> {
    let mut seen = std::collections::HashSet::new();
    sources
        .into_iter()
        .filter(|s| seen.insert(s.uri.clone()))
        .collect()
}

// =============================================================================
// APPLIANCE DETAILS
// =============================================================================

/// Make, model, and type extracted from an appliance label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceDetails {
    pub make: String,
    pub model: String,
    /// General appliance type, e.g. "Refrigerator" or "Washing Machine".
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    /// User-set maintenance due date for the whole appliance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl ApplianceDetails {
    /// "Make Model" label used in alerts and listings.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.make, self.model)
    }
}

// =============================================================================
// CARE SCHEDULE
// =============================================================================

/// A single recurring maintenance task.
///
/// Tasks carry no id of their own; they are addressed positionally within
/// the owning appliance's care schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareTask {
    pub task: String,
    pub description: String,
    pub frequency: String,
    #[serde(
        default,
        deserialize_with = "lenient::seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub instructions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_link: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub reminder: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_completed: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient::seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sources: Vec<SourceRef>,
}

// =============================================================================
// LOCAL SERVICES
// =============================================================================

/// A nearby repair service suggested by the AI collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalService {
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl LocalService {
    /// Identity key for the saved-services collection. Services have no id;
    /// the name plus address pair is treated as unique.
    pub fn key(&self) -> String {
        format!("{}|{}", self.name, self.address)
    }
}

/// A repair service the user pinned, with the time it was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedService {
    #[serde(flatten)]
    pub service: LocalService,
    pub saved_at: DateTime<Utc>,
}

// =============================================================================
// MAINTENANCE PROFILE
// =============================================================================

/// The AI-produced profile for one appliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceProfile {
    pub appliance_details: ApplianceDetails,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub care_schedule: Vec<CareTask>,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub local_services: Vec<LocalService>,
}

impl MaintenanceProfile {
    /// An empty profile around confirmed details, used for provisional
    /// records before generation runs.
    pub fn stub(details: ApplianceDetails) -> Self {
        Self {
            appliance_details: details,
            care_schedule: Vec::new(),
            local_services: Vec::new(),
        }
    }
}

// =============================================================================
// CHAT
// =============================================================================

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One fragment of a chat message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePart {
    pub text: String,
}

/// A single entry in an appliance's chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub parts: Vec<MessagePart>,
    #[serde(
        default,
        deserialize_with = "lenient::seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sources: Vec<SourceRef>,
    /// Follow-up questions offered after a model reply.
    #[serde(
        default,
        deserialize_with = "lenient::seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub suggestions: Vec<String>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            parts: vec![MessagePart { text: text.into() }],
            sources: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            parts: vec![MessagePart { text: text.into() }],
            sources: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Concatenated text of all parts.
    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Fields the AI collaborator extracts from a receipt or warranty document.
///
/// Dates are kept as strings: the collaborator is asked for ISO `YYYY-MM-DD`
/// but is not trusted to deliver it, so parsing happens at the point of use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warranty_end_date: Option<String>,
}

impl ExtractedDocInfo {
    /// Whether the extraction found anything worth keeping as warranty info.
    pub fn has_dates(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        filled(&self.warranty_end_date) || filled(&self.purchase_date)
    }
}

/// Extracted document fields plus the time the scan completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyInfo {
    #[serde(flatten)]
    pub info: ExtractedDocInfo,
    pub scanned_at: DateTime<Utc>,
}

/// Lifecycle state of a document's background scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Scanning,
    Complete,
    Error,
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scanning => write!(f, "scanning"),
            Self::Complete => write!(f, "complete"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A receipt, manual, or warranty document attached to an appliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub file_url: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub scan_status: ScanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warranty_info: Option<WarrantyInfo>,
}

// =============================================================================
// RESEARCH REPORTS
// =============================================================================

/// Lifecycle state of a deep-research report. Transitions exactly once,
/// from `Pending` to either `Complete` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Complete,
    Error,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Complete => write!(f, "complete"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A deep-research report on one maintenance topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchReport {
    pub id: Uuid,
    pub topic: String,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sources: Vec<SourceRef>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResearchReport {
    /// A fresh pending report for the given topic.
    pub fn pending(topic: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            status: ReportStatus::Pending,
            content: None,
            sources: Vec::new(),
            created_at: now,
            error: None,
        }
    }
}

// =============================================================================
// SAVED APPLIANCE
// =============================================================================

/// The central entity: one photographed appliance and everything attached
/// to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAppliance {
    pub id: RecordId,
    /// Reference to the locally-held label image. Owned by the record;
    /// released when the record is discarded without being saved.
    pub image_url: String,
    pub response: MaintenanceProfile,
    /// Which model produced `response`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub chat_history: Vec<ChatMessage>,
    #[serde(
        default,
        deserialize_with = "lenient::seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub documents: Vec<Document>,
    #[serde(
        default,
        deserialize_with = "lenient::seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub research_reports: Vec<ResearchReport>,
}

impl SavedAppliance {
    /// A provisional record around freshly-extracted details, before the
    /// maintenance profile has been generated.
    pub fn provisional(details: ApplianceDetails, image_url: String) -> Self {
        Self {
            id: RecordId::provisional(),
            image_url,
            response: MaintenanceProfile::stub(details),
            model_version: None,
            chat_history: Vec::new(),
            documents: Vec::new(),
            research_reports: Vec::new(),
        }
    }

    pub fn details(&self) -> &ApplianceDetails {
        &self.response.appliance_details
    }
}

// =============================================================================
// KNOWLEDGE BASE
// =============================================================================

/// A saved question/answer pair. Top-level collection, not nested under an
/// appliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseItem {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub sources: Vec<SourceRef>,
}

// =============================================================================
// COLLABORATOR RESULTS
// =============================================================================

/// Free text plus the attribution sources that ground it.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedText {
    pub text: String,
    pub sources: Vec<SourceRef>,
}

/// Output of maintenance-profile generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileGeneration {
    pub profile: MaintenanceProfile,
    pub model_version: String,
}

/// Best-effort device location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

// =============================================================================
// WARRANTY ALERTS
// =============================================================================

/// A warranty expiring soon, derived from a scanned document.
#[derive(Debug, Clone, PartialEq)]
pub struct WarrantyAlert {
    pub appliance_id: RecordId,
    pub appliance_name: String,
    pub document_name: String,
    pub days_left: i64,
    pub end_date: chrono::NaiveDate,
}
