//! Integration tests: persistence round-trips through the record store,
//! including records written by the original client format.

use std::sync::Arc;

use upkeep_store::{
    defaults, ApplianceRepository, FileMedium, MemoryMedium, RecordId, RecordStore, SavedAppliance,
    SavedService, StorageMedium,
};

/// A record as the original client persisted it: camelCase keys, optional
/// sub-resources absent, a `type` field on the details.
const LEGACY_RECORD: &str = r#"[{
    "id": "8e7c4b1a-3f2d-4e5a-9b8c-7d6e5f4a3b2c",
    "imageUrl": "blob:https://app.example/1234",
    "response": {
        "applianceDetails": {
            "make": "Acme",
            "model": "X100",
            "type": "Refrigerator",
            "serialNumber": "SN-001"
        },
        "careSchedule": [{
            "task": "Clean condenser coils",
            "description": "Vacuum dust from the rear coils",
            "frequency": "Every 6 months",
            "instructions": ["Unplug the unit", "Vacuum the coils"],
            "sources": [{"title": "Acme manual", "uri": "https://acme.example/manual"}]
        }],
        "localServices": [{
            "name": "FixIt Co",
            "address": "1 Main St",
            "phone": "555-0100"
        }]
    },
    "modelVersion": "gemini-2.5-pro",
    "chatHistory": [{
        "role": "user",
        "parts": [{"text": "Why is it humming?"}]
    }]
}]"#;

#[test]
fn legacy_record_loads_and_round_trips() {
    let medium = MemoryMedium::new();
    medium.set(defaults::KEY_SAVED_APPLIANCES, LEGACY_RECORD).unwrap();
    let store = RecordStore::new(Arc::new(medium));

    let mut repo = ApplianceRepository::new(store.clone());
    assert_eq!(repo.appliances().len(), 1);

    let record = &repo.appliances()[0];
    assert_eq!(record.details().kind, "Refrigerator");
    assert_eq!(record.response.care_schedule.len(), 1);
    assert_eq!(record.response.care_schedule[0].instructions.len(), 2);
    assert_eq!(record.chat_history.len(), 1);
    assert!(record.documents.is_empty());

    // A mutation writes the collection back in the same camelCase shape.
    let id = record.id.clone();
    repo.update_by_id(&id, |r| {
        upkeep_store::subresources::set_due_date(r, Some("2026-12-01".to_string()))
    });

    let raw = store.medium().get(defaults::KEY_SAVED_APPLIANCES).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["response"]["applianceDetails"]["type"], "Refrigerator");
    assert_eq!(value[0]["response"]["applianceDetails"]["dueDate"], "2026-12-01");
    assert_eq!(value[0]["imageUrl"], "blob:https://app.example/1234");
}

#[test]
fn corrupted_collection_degrades_to_empty_not_panic() {
    for corrupt in [
        "not json at all",
        "42",
        r#"{"a": 1}"#,
        r#"[{"id": 3}]"#,
        "null",
    ] {
        let medium = MemoryMedium::new();
        medium.set(defaults::KEY_SAVED_APPLIANCES, corrupt).unwrap();
        let repo = ApplianceRepository::new(RecordStore::new(Arc::new(medium)));
        assert!(repo.appliances().is_empty(), "corrupt input: {corrupt}");
    }
}

#[test]
fn file_medium_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let medium = FileMedium::new(dir.path()).unwrap();
        let store = RecordStore::new(Arc::new(medium));
        let mut repo = ApplianceRepository::new(store);
        let mut record = sample_record("washer-1");
        record.id = RecordId::from("washer-1");
        repo.insert(record);
    }

    let medium = FileMedium::new(dir.path()).unwrap();
    let repo = ApplianceRepository::new(RecordStore::new(Arc::new(medium)));
    assert_eq!(repo.appliances().len(), 1);
    assert_eq!(repo.appliances()[0].id, RecordId::from("washer-1"));
}

#[test]
fn saved_services_persist_under_their_own_key() {
    let store = RecordStore::new(Arc::new(MemoryMedium::new()));

    let service = upkeep_store::LocalService {
        name: "FixIt Co".to_string(),
        address: "1 Main St".to_string(),
        phone: None,
        website: None,
        recommendation: None,
    };

    let saved: Vec<SavedService> = store.load(defaults::KEY_SAVED_SERVICES, Vec::new());
    let saved = upkeep_store::toggle_service(&saved, &service, chrono::Utc::now());
    store.save(defaults::KEY_SAVED_SERVICES, &saved);

    let reloaded: Vec<SavedService> = store.load(defaults::KEY_SAVED_SERVICES, Vec::new());
    assert_eq!(reloaded.len(), 1);
    assert!(upkeep_store::is_service_saved(&reloaded, &service));
}

fn sample_record(model: &str) -> SavedAppliance {
    SavedAppliance::provisional(
        upkeep_store::ApplianceDetails {
            make: "Acme".to_string(),
            model: model.to_string(),
            kind: "Washer".to_string(),
            serial_number: None,
            due_date: None,
        },
        "blob:img".to_string(),
    )
}
