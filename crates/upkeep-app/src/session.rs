//! The application session: flow control, the open record, and every
//! mutation entry point.
//!
//! The session is a cheaply-cloneable handle. Mutable state lives behind
//! one lock, and every mutation is a single lock-scoped read-modify-write
//! with no suspension inside the lock, so interleaved completions from
//! background reconciliation tasks cannot tear a write. Collaborator calls
//! happen outside the lock.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use upkeep_core::{
    defaults, ApplianceDetails, ChatMessage, Document, Error, GroundedText, KnowledgeBaseItem,
    RecordId, ResearchReport, Result, SavedAppliance, SavedService, ScanStatus, SourceRef,
    WarrantyAlert,
};
use upkeep_inference::{ApplianceAssistant, ChatChunk};
use upkeep_store::{
    knowledge, subresources, toggle_service, warranty_alerts, AppliancePatch,
    ApplianceRepository, BlobStore, RecordStore, StorageMedium,
};

use crate::location::LocationProvider;

/// Which view the shell should show.
///
/// This is a linear confirmation pipeline, not a general state machine:
/// failure always returns to `Idle` and the user restarts manually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Idle,
    Analyzing,
    Confirming,
    Fetching,
    Results,
}

struct SessionInner {
    flow: AppState,
    current: Option<SavedAppliance>,
    repo: ApplianceRepository,
    services: Vec<SavedService>,
    knowledge: Vec<KnowledgeBaseItem>,
    logged_in: bool,
    online: bool,
    last_error: Option<String>,
    store: RecordStore,
}

impl SessionInner {
    fn persist_services(&self) {
        self.store.save(defaults::KEY_SAVED_SERVICES, &self.services);
    }

    fn persist_knowledge(&self) {
        self.store.save(defaults::KEY_KNOWLEDGE_BASE, &self.knowledge);
    }

    fn persist_login(&self) {
        self.store.save(defaults::KEY_LOGGED_IN, &self.logged_in);
    }
}

/// The application flow controller.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
    assistant: Arc<dyn ApplianceAssistant>,
    blobs: Arc<dyn BlobStore>,
    location: Option<Arc<dyn LocationProvider>>,
}

impl Session {
    /// Build a session over the given medium and collaborators, loading
    /// every persisted collection.
    pub fn new(
        medium: Arc<dyn StorageMedium>,
        blobs: Arc<dyn BlobStore>,
        assistant: Arc<dyn ApplianceAssistant>,
        location: Option<Arc<dyn LocationProvider>>,
    ) -> Self {
        let store = RecordStore::new(medium);
        let repo = ApplianceRepository::new(store.clone());
        let services = store.load(defaults::KEY_SAVED_SERVICES, Vec::new());
        let knowledge = store.load(defaults::KEY_KNOWLEDGE_BASE, Vec::new());
        let logged_in = store.load(defaults::KEY_LOGGED_IN, false);

        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                flow: AppState::Idle,
                current: None,
                repo,
                services,
                knowledge,
                logged_in,
                online: true,
                last_error: None,
                store,
            })),
            assistant,
            blobs,
            location,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        // No invariant spans a panic; recover the data on poisoning.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ─── View-facing accessors ─────────────────────────────────────────────

    pub fn state(&self) -> AppState {
        self.lock().flow
    }

    /// The open record, if any.
    pub fn current(&self) -> Option<SavedAppliance> {
        self.lock().current.clone()
    }

    pub fn appliances(&self) -> Vec<SavedAppliance> {
        self.lock().repo.appliances().to_vec()
    }

    /// The message of the most recent collaborator failure, cleared by the
    /// next flow action.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Warranties expiring within the alert window, soonest first.
    pub fn warranty_alerts(&self) -> Vec<WarrantyAlert> {
        let inner = self.lock();
        warranty_alerts(inner.repo.appliances(), Utc::now().date_naive())
    }

    // ─── Connectivity annotation ───────────────────────────────────────────

    /// Annotate the UI; gates nothing.
    pub fn set_online(&self, online: bool) {
        self.lock().online = online;
    }

    pub fn is_online(&self) -> bool {
        self.lock().online
    }

    // ─── Login flag ────────────────────────────────────────────────────────

    pub fn is_logged_in(&self) -> bool {
        self.lock().logged_in
    }

    pub fn log_in(&self) {
        let mut inner = self.lock();
        inner.logged_in = true;
        inner.persist_login();
    }

    pub fn log_out(&self) {
        let mut inner = self.lock();
        inner.logged_in = false;
        inner.persist_login();
    }

    // ─── Analysis flow ─────────────────────────────────────────────────────

    /// Analyze a label photo. On success the session holds a provisional
    /// record and moves to `Confirming`; on failure the image is released
    /// and the flow returns to `Idle`.
    pub async fn submit_image(&self, image: &[u8], mime_type: &str) -> Result<()> {
        let image_url = self.blobs.store(image, mime_type)?;
        {
            let mut inner = self.lock();
            inner.flow = AppState::Analyzing;
            inner.last_error = None;
        }

        match self.assistant.analyze_label(image, mime_type).await {
            Ok(details) => {
                info!(make = %details.make, model = %details.model, "label analyzed");
                let mut inner = self.lock();
                inner.current = Some(SavedAppliance::provisional(details, image_url));
                inner.flow = AppState::Confirming;
                Ok(())
            }
            Err(e) => {
                self.blobs.release(&image_url);
                let mut inner = self.lock();
                inner.flow = AppState::Idle;
                inner.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Generate the maintenance profile for user-confirmed details. The
    /// device location is acquired best-effort and its absence never blocks
    /// the flow. On success the record gets a permanent id and the session
    /// moves to `Results`; on failure the provisional record is discarded.
    pub async fn confirm(&self, details: ApplianceDetails) -> Result<()> {
        {
            let mut inner = self.lock();
            if inner.current.is_none() {
                return Err(Error::InvalidInput(
                    "no appliance awaiting confirmation".to_string(),
                ));
            }
            inner.flow = AppState::Fetching;
            inner.last_error = None;
        }

        let location = match &self.location {
            Some(provider) => provider.current_location().await,
            None => None,
        };
        debug!(has_location = location.is_some(), "generating profile");

        match self.assistant.generate_profile(&details, location).await {
            Ok(generated) => {
                let mut inner = self.lock();
                if let Some(current) = inner.current.as_mut() {
                    current.id = RecordId::generate();
                    current.response = generated.profile;
                    current.model_version = Some(generated.model_version);
                }
                inner.flow = AppState::Results;
                Ok(())
            }
            Err(e) => {
                let mut inner = self.lock();
                if let Some(discarded) = inner.current.take() {
                    self.blobs.release(&discarded.image_url);
                }
                inner.flow = AppState::Idle;
                inner.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Abandon the confirmation step, releasing the provisional image.
    pub fn cancel_confirmation(&self) {
        self.discard_current();
    }

    /// Commit the open record into the saved collection and return to the
    /// dashboard.
    pub fn save_current(&self) {
        let mut inner = self.lock();
        if let Some(current) = inner.current.take() {
            inner.repo.insert(current);
        }
        inner.flow = AppState::Idle;
    }

    /// Drop the open record. Unsaved records release their image; records
    /// that live in the saved collection keep it.
    pub fn discard_current(&self) {
        let mut inner = self.lock();
        if let Some(discarded) = inner.current.take() {
            if !inner.repo.contains(&discarded.id) {
                self.blobs.release(&discarded.image_url);
            }
        }
        inner.flow = AppState::Idle;
    }

    /// Close the open record without discarding anything.
    pub fn back_to_dashboard(&self) {
        let mut inner = self.lock();
        inner.current = None;
        inner.flow = AppState::Idle;
    }

    /// Open a previously saved record without re-invoking any collaborator.
    /// An open unsaved record is discarded, releasing its image.
    pub fn select_saved(&self, id: &RecordId) -> bool {
        let mut inner = self.lock();
        match inner.repo.get(id).cloned() {
            Some(record) => {
                if let Some(replaced) = inner.current.take() {
                    if !inner.repo.contains(&replaced.id) {
                        self.blobs.release(&replaced.image_url);
                    }
                }
                inner.current = Some(record);
                inner.flow = AppState::Results;
                true
            }
            None => false,
        }
    }

    // ─── Deletion and undo ─────────────────────────────────────────────────

    pub fn delete_saved(&self, id: &RecordId) -> bool {
        self.lock().repo.delete(id)
    }

    pub fn pending_undo(&self) -> Option<SavedAppliance> {
        self.lock().repo.pending_undo().cloned()
    }

    pub fn undo_delete(&self) -> Option<RecordId> {
        self.lock().repo.undo_delete()
    }

    pub fn dismiss_undo(&self) {
        self.lock().repo.dismiss_undo();
    }

    // ─── Partial updates ───────────────────────────────────────────────────

    /// Apply a partial update to the record with `id`, mirroring the patch
    /// onto the open record when it shares that id so the visible view
    /// reflects the change without a re-fetch.
    fn update_record(
        &self,
        id: &RecordId,
        updater: impl Fn(&SavedAppliance) -> AppliancePatch,
    ) {
        let mut inner = self.lock();
        let patch = inner.repo.update_by_id(id, &updater);
        if let Some(current) = inner.current.as_mut() {
            if &current.id == id {
                match patch {
                    Some(patch) => patch.apply(current),
                    // Provisional records live only in `current`.
                    None => updater(current).apply(current),
                }
            }
        }
    }

    fn current_id(&self) -> Option<RecordId> {
        self.lock().current.as_ref().map(|c| c.id.clone())
    }

    /// Set or clear a care-task reminder on the open record.
    pub fn set_reminder(&self, task_index: usize, reminder: Option<DateTime<Utc>>) {
        if let Some(id) = self.current_id() {
            self.update_record(&id, |r| subresources::set_reminder(r, task_index, reminder));
        }
    }

    /// Stamp a care task on the open record as completed now.
    pub fn mark_task_complete(&self, task_index: usize) {
        if let Some(id) = self.current_id() {
            let now = Utc::now();
            self.update_record(&id, |r| subresources::mark_task_complete(r, task_index, now));
        }
    }

    /// Set or clear the open record's maintenance due date.
    pub fn set_due_date(&self, due_date: Option<String>) {
        if let Some(id) = self.current_id() {
            self.update_record(&id, |r| subresources::set_due_date(r, due_date.clone()));
        }
    }

    /// Delete a document from the open record.
    pub fn delete_document(&self, document_id: Uuid) {
        if let Some(id) = self.current_id() {
            self.update_record(&id, |r| subresources::remove_document(r, document_id));
        }
    }

    /// Delete a research report from the open record.
    pub fn delete_research_report(&self, report_id: Uuid) {
        if let Some(id) = self.current_id() {
            self.update_record(&id, |r| subresources::remove_report(r, report_id));
        }
    }

    /// Wholesale-replace a record's chat transcript, e.g. on view close.
    pub fn save_chat_history(&self, id: &RecordId, history: Vec<ChatMessage>) {
        self.update_record(id, |_| subresources::replace_chat_history(history.clone()));
    }

    // ─── Documents: optimistic add + async enrichment ──────────────────────

    /// Attach a document to the open record. The entry is visible in
    /// `Scanning` state immediately; image uploads are then enriched by the
    /// collaborator in the background, while other files complete at once.
    /// The eventual completion targets the document by id and tolerates it
    /// having been deleted in the interim.
    pub fn add_document(&self, name: &str, data: &[u8], mime_type: &str) -> Result<Uuid> {
        let record_id = self
            .current_id()
            .ok_or_else(|| Error::InvalidInput("no open appliance".to_string()))?;

        let file_url = self.blobs.store(data, mime_type)?;
        let document = Document {
            id: Uuid::new_v4(),
            name: name.to_string(),
            file_url,
            file_type: mime_type.to_string(),
            uploaded_at: Utc::now(),
            scan_status: ScanStatus::Scanning,
            warranty_info: None,
        };
        let document_id = document.id;

        self.update_record(&record_id, |r| {
            subresources::add_document(r, document.clone())
        });

        if !is_image(mime_type, data) {
            // Nothing to extract from non-image files.
            let now = Utc::now();
            self.update_record(&record_id, |r| {
                subresources::resolve_document(r, document_id, None, now)
            });
            return Ok(document_id);
        }

        let session = self.clone();
        let data = data.to_vec();
        let mime_type = mime_type.to_string();
        tokio::spawn(async move {
            match session.assistant.extract_document(&data, &mime_type).await {
                Ok(extracted) => {
                    let now = Utc::now();
                    session.update_record(&record_id, |r| {
                        subresources::resolve_document(r, document_id, Some(extracted.clone()), now)
                    });
                }
                Err(e) => {
                    warn!(document_id = %document_id, error = %e, "document scan failed");
                    session.update_record(&record_id, |r| {
                        subresources::fail_document(r, document_id)
                    });
                }
            }
        });

        Ok(document_id)
    }

    // ─── Research reports: optimistic start + async completion ─────────────

    /// Start a deep-research report on the open record. The report is
    /// visible as `Pending` immediately and transitions exactly once to
    /// `Complete` or `Error` when the collaborator resolves.
    pub fn start_research(&self, topic: &str) -> Result<Uuid> {
        let (record_id, details) = {
            let inner = self.lock();
            let current = inner
                .current
                .as_ref()
                .ok_or_else(|| Error::InvalidInput("no open appliance".to_string()))?;
            (current.id.clone(), current.details().clone())
        };

        let report = ResearchReport::pending(topic, Utc::now());
        let report_id = report.id;
        self.update_record(&record_id, |r| subresources::start_report(r, report.clone()));

        let session = self.clone();
        let topic = topic.to_string();
        tokio::spawn(async move {
            match session.assistant.deep_research(&topic, &details).await {
                Ok(result) => {
                    session.update_record(&record_id, |r| {
                        subresources::complete_report(
                            r,
                            report_id,
                            result.text.clone(),
                            result.sources.clone(),
                        )
                    });
                }
                Err(e) => {
                    warn!(report_id = %report_id, error = %e, "deep research failed");
                    let message = e.to_string();
                    session.update_record(&record_id, |r| {
                        subresources::fail_report(r, report_id, message.clone())
                    });
                }
            }
        });

        Ok(report_id)
    }

    // ─── Chat ──────────────────────────────────────────────────────────────

    /// Send one chat message about the open record. Reply fragments are
    /// delivered through `on_fragment` as they arrive; the completed
    /// transcript (with attribution sources and, best-effort, follow-up
    /// suggestions) is persisted and returned. A failed exchange persists
    /// the transcript with an apology reply and returns the error.
    pub async fn send_chat_message(
        &self,
        text: &str,
        mut on_fragment: impl FnMut(&str),
    ) -> Result<Vec<ChatMessage>> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("empty chat message".to_string()));
        }
        if text.chars().count() > defaults::CHAT_MAX_CHARS {
            return Err(Error::InvalidInput(format!(
                "chat message exceeds {} characters",
                defaults::CHAT_MAX_CHARS
            )));
        }

        let (record_id, details, prior) = {
            let inner = self.lock();
            let current = inner
                .current
                .as_ref()
                .ok_or_else(|| Error::InvalidInput("no open appliance".to_string()))?;
            (
                current.id.clone(),
                current.details().clone(),
                current.chat_history.clone(),
            )
        };

        let mut transcript = prior.clone();
        transcript.push(ChatMessage::user(text));

        let outcome = self.stream_reply(&details, &prior, text, &mut on_fragment).await;

        match outcome {
            Ok((reply, sources)) => {
                let mut model_message = ChatMessage::model(reply.clone());
                model_message.sources = sources;
                transcript.push(model_message);
                self.save_chat_history(&record_id, transcript.clone());

                // Follow-up suggestions are decoration; failures are logged
                // and the exchange still counts.
                match self.assistant.chat_suggestions(text, &reply).await {
                    Ok(suggestions) if !suggestions.is_empty() => {
                        if let Some(last) = transcript.last_mut() {
                            last.suggestions = suggestions;
                        }
                        self.save_chat_history(&record_id, transcript.clone());
                    }
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, "chat suggestions failed"),
                }

                Ok(transcript)
            }
            Err(e) => {
                transcript.push(ChatMessage::model(defaults::CHAT_ERROR_REPLY));
                self.save_chat_history(&record_id, transcript);
                Err(e)
            }
        }
    }

    async fn stream_reply(
        &self,
        details: &ApplianceDetails,
        history: &[ChatMessage],
        text: &str,
        on_fragment: &mut impl FnMut(&str),
    ) -> Result<(String, Vec<SourceRef>)> {
        let mut stream = self.assistant.chat_stream(details, history, text).await?;

        let mut reply = String::new();
        let mut sources = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk? {
                ChatChunk::Text(fragment) => {
                    on_fragment(&fragment);
                    reply.push_str(&fragment);
                }
                ChatChunk::Sources(s) => sources = s,
            }
        }
        Ok((reply, sources))
    }

    // ─── Saved services ────────────────────────────────────────────────────

    pub fn saved_services(&self) -> Vec<SavedService> {
        self.lock().services.clone()
    }

    /// Toggle a repair service in the saved collection, keyed by name plus
    /// address.
    pub fn toggle_saved_service(&self, service: &upkeep_core::LocalService) {
        let mut inner = self.lock();
        inner.services = toggle_service(&inner.services, service, Utc::now());
        inner.persist_services();
    }

    // ─── Knowledge base ────────────────────────────────────────────────────

    pub fn knowledge_base(&self) -> Vec<KnowledgeBaseItem> {
        self.lock().knowledge.clone()
    }

    /// Ask a maintenance question, using the open record's details as
    /// context when present. The answered item is prepended to the
    /// knowledge base and returned.
    pub async fn ask_knowledge_base(&self, question: &str) -> Result<KnowledgeBaseItem> {
        if question.trim().is_empty() {
            return Err(Error::InvalidInput("empty question".to_string()));
        }

        let context = self.lock().current.as_ref().map(|c| c.details().clone());
        let answer = self
            .assistant
            .knowledge_answer(question, context.as_ref())
            .await?;

        let item = KnowledgeBaseItem {
            id: Uuid::new_v4(),
            question: question.to_string(),
            answer: answer.text,
            sources: answer.sources,
        };

        let mut inner = self.lock();
        inner.knowledge = knowledge::prepend_item(&inner.knowledge, item.clone());
        inner.persist_knowledge();
        Ok(item)
    }

    pub fn remove_knowledge_item(&self, id: Uuid) {
        let mut inner = self.lock();
        inner.knowledge = knowledge::remove_item(&inner.knowledge, id);
        inner.persist_knowledge();
    }

    pub fn clear_knowledge_base(&self) {
        let mut inner = self.lock();
        inner.knowledge = Vec::new();
        inner.persist_knowledge();
    }

    // ─── Collaborator passthroughs ─────────────────────────────────────────

    /// Localized cost estimate for a repair job.
    pub async fn cost_estimate(&self, job: &str, location: &str) -> Result<GroundedText> {
        self.assistant.cost_estimate(job, location).await
    }

    /// A short maintenance tip for the dashboard.
    pub async fn pro_tip(&self) -> Result<String> {
        self.assistant.pro_tip().await
    }

    /// Common repair jobs for an appliance type.
    pub async fn suggested_repairs(&self, appliance_type: &str) -> Result<Vec<String>> {
        self.assistant.suggested_repairs(appliance_type).await
    }
}

/// Whether an upload should go through image extraction. Falls back to
/// magic-byte sniffing when the host supplied no usable MIME type.
fn is_image(mime_type: &str, data: &[u8]) -> bool {
    if mime_type.starts_with("image/") {
        return true;
    }
    if mime_type.is_empty() || mime_type == "application/octet-stream" {
        return infer::get(data)
            .map(|kind| kind.mime_type().starts_with("image/"))
            .unwrap_or(false);
    }
    false
}
