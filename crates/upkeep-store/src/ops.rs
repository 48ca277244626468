//! Pure operations over the saved-appliance collection.
//!
//! Every function returns a new collection and leaves the argument
//! untouched, so callers can diff, persist, or discard the result freely.

use upkeep_core::{RecordId, SavedAppliance};

use crate::repository::AppliancePatch;

/// Prepend a record: the collection is kept most-recent-first.
pub fn insert(collection: &[SavedAppliance], record: SavedAppliance) -> Vec<SavedAppliance> {
    let mut updated = Vec::with_capacity(collection.len() + 1);
    updated.push(record);
    updated.extend_from_slice(collection);
    updated
}

/// Remove the record with `id`, returning the new collection together with
/// the removed record and its original index for undo. `None` when no
/// record matches.
pub fn remove_by_id(
    collection: &[SavedAppliance],
    id: &RecordId,
) -> Option<(Vec<SavedAppliance>, SavedAppliance, usize)> {
    let index = collection.iter().position(|a| &a.id == id)?;
    let mut updated = collection.to_vec();
    let removed = updated.remove(index);
    Some((updated, removed, index))
}

/// Re-insert a previously removed record at its original index. Indexes
/// past the end append, so a shrunken collection still restores.
pub fn restore(
    collection: &[SavedAppliance],
    record: SavedAppliance,
    index: usize,
) -> Vec<SavedAppliance> {
    let mut updated = collection.to_vec();
    let index = index.min(updated.len());
    updated.insert(index, record);
    updated
}

/// Apply a partial update to the record with `id`, leaving every other
/// record untouched. Returns the new collection and the patch that was
/// applied; an unmatched id returns the collection unchanged and `None`.
pub fn update_by_id(
    collection: &[SavedAppliance],
    id: &RecordId,
    updater: impl FnOnce(&SavedAppliance) -> AppliancePatch,
) -> (Vec<SavedAppliance>, Option<AppliancePatch>) {
    let mut updated = collection.to_vec();
    match updated.iter_mut().find(|a| &a.id == id) {
        Some(record) => {
            let patch = updater(record);
            patch.apply(record);
            (updated, Some(patch))
        }
        None => (updated, None),
    }
}
