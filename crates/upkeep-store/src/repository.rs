//! Appliance repository: the single writer of the saved-appliance
//! collection.
//!
//! The repository owns the in-memory collection, loads it once at
//! construction, and writes through the record store after every mutation.
//! Deletions park the removed record in a single-slot undo buffer; starting
//! a second delete before undoing the first makes the first permanent.

use tracing::info;

use upkeep_core::{
    defaults, ChatMessage, Document, MaintenanceProfile, RecordId, ResearchReport, SavedAppliance,
};

use crate::ops;
use crate::record_store::RecordStore;

/// A subset of a record's fields, shallow-merged onto the existing record.
///
/// This is the single mutation primitive: all sub-resource updates are
/// expressed through it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliancePatch {
    pub response: Option<MaintenanceProfile>,
    pub model_version: Option<String>,
    pub chat_history: Option<Vec<ChatMessage>>,
    pub documents: Option<Vec<Document>>,
    pub research_reports: Option<Vec<ResearchReport>>,
}

impl AppliancePatch {
    /// Shallow-merge this patch onto `record`. Absent fields are left
    /// untouched.
    pub fn apply(&self, record: &mut SavedAppliance) {
        if let Some(response) = &self.response {
            record.response = response.clone();
        }
        if let Some(model_version) = &self.model_version {
            record.model_version = Some(model_version.clone());
        }
        if let Some(chat_history) = &self.chat_history {
            record.chat_history = chat_history.clone();
        }
        if let Some(documents) = &self.documents {
            record.documents = documents.clone();
        }
        if let Some(research_reports) = &self.research_reports {
            record.research_reports = research_reports.clone();
        }
    }

    /// Whether applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

struct UndoEntry {
    record: SavedAppliance,
    index: usize,
}

/// CRUD plus partial updates over the saved-appliance collection.
pub struct ApplianceRepository {
    store: RecordStore,
    appliances: Vec<SavedAppliance>,
    undo: Option<UndoEntry>,
}

impl ApplianceRepository {
    /// Load the collection from the store. Malformed stored data loads as
    /// an empty collection.
    pub fn new(store: RecordStore) -> Self {
        let appliances = store.load(defaults::KEY_SAVED_APPLIANCES, Vec::new());
        Self {
            store,
            appliances,
            undo: None,
        }
    }

    pub fn appliances(&self) -> &[SavedAppliance] {
        &self.appliances
    }

    pub fn get(&self, id: &RecordId) -> Option<&SavedAppliance> {
        self.appliances.iter().find(|a| &a.id == id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Commit a record, most-recent-first.
    pub fn insert(&mut self, record: SavedAppliance) {
        info!(record_id = %record.id, "appliance saved");
        self.appliances = ops::insert(&self.appliances, record);
        self.persist();
    }

    /// Remove a record, parking it for undo. A pending undo from an earlier
    /// delete is discarded. Returns false when the id is unknown.
    pub fn delete(&mut self, id: &RecordId) -> bool {
        match ops::remove_by_id(&self.appliances, id) {
            Some((updated, removed, index)) => {
                info!(record_id = %id, "appliance deleted");
                self.appliances = updated;
                self.undo = Some(UndoEntry { record: removed, index });
                self.persist();
                true
            }
            None => false,
        }
    }

    /// The record a pending undo would restore, if any.
    pub fn pending_undo(&self) -> Option<&SavedAppliance> {
        self.undo.as_ref().map(|u| &u.record)
    }

    /// Restore the most recently deleted record at its original index.
    /// Returns the restored id, or `None` when no undo is pending.
    pub fn undo_delete(&mut self) -> Option<RecordId> {
        let UndoEntry { record, index } = self.undo.take()?;
        let id = record.id.clone();
        info!(record_id = %id, "appliance delete undone");
        self.appliances = ops::restore(&self.appliances, record, index);
        self.persist();
        Some(id)
    }

    /// Let the pending deletion lapse, making it permanent.
    pub fn dismiss_undo(&mut self) {
        self.undo = None;
    }

    /// Apply a partial update to the record with `id`. Returns the applied
    /// patch so callers can mirror it onto an open in-memory copy; `None`
    /// when no record matches.
    pub fn update_by_id(
        &mut self,
        id: &RecordId,
        updater: impl FnOnce(&SavedAppliance) -> AppliancePatch,
    ) -> Option<AppliancePatch> {
        let (updated, patch) = ops::update_by_id(&self.appliances, id, updater);
        if patch.is_some() {
            self.appliances = updated;
            self.persist();
        }
        patch
    }

    fn persist(&self) {
        self.store
            .save(defaults::KEY_SAVED_APPLIANCES, &self.appliances);
    }
}
