//! End-to-end flow tests: the session driven against the mock assistant
//! and in-memory media, from photo to saved record and back.

use std::sync::Arc;
use std::time::Duration;

use upkeep_app::{AppState, FixedLocation, Session};
use upkeep_core::{GeoPoint, RecordId, ReportStatus, ScanStatus};
use upkeep_inference::mock::MockAssistant;
use upkeep_store::{BlobStore, MemoryBlobStore, MemoryMedium, StorageMedium};

struct Harness {
    session: Session,
    medium: Arc<MemoryMedium>,
    blobs: Arc<MemoryBlobStore>,
    assistant: MockAssistant,
}

fn harness(assistant: MockAssistant) -> Harness {
    let medium = Arc::new(MemoryMedium::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let session = Session::new(
        medium.clone(),
        blobs.clone(),
        Arc::new(assistant.clone()),
        Some(Arc::new(FixedLocation(GeoPoint {
            latitude: 37.77,
            longitude: -122.42,
        }))),
    );
    Harness {
        session,
        medium,
        blobs,
        assistant,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not reached within the wait budget");
}

#[tokio::test]
async fn photo_to_saved_appliance() {
    let h = harness(MockAssistant::new());

    // Submit a photo: the provisional record appears for confirmation.
    h.session.submit_image(b"jpeg-bytes", "image/jpeg").await.unwrap();
    assert_eq!(h.session.state(), AppState::Confirming);

    let current = h.session.current().unwrap();
    assert!(current.id.is_provisional());
    let provisional_id = current.id.clone();
    assert_eq!(current.details().make, "Acme");
    assert_eq!(current.details().model, "X100");
    assert_eq!(current.details().kind, "Refrigerator");
    assert!(current.response.care_schedule.is_empty());

    // Confirm without edits: profile arrives, id becomes permanent.
    h.session.confirm(current.details().clone()).await.unwrap();
    assert_eq!(h.session.state(), AppState::Results);

    let current = h.session.current().unwrap();
    assert!(!current.id.is_provisional());
    assert_ne!(current.id, provisional_id);
    assert_eq!(current.response.care_schedule.len(), 3);
    assert_eq!(current.model_version.as_deref(), Some("mock-pro"));

    // Save: the record joins the collection, the session returns to idle.
    let saved_id = current.id.clone();
    h.session.save_current();
    assert_eq!(h.session.state(), AppState::Idle);
    assert!(h.session.current().is_none());

    let appliances = h.session.appliances();
    assert_eq!(appliances.len(), 1);
    assert_eq!(appliances[0].id, saved_id);

    // The committed record keeps its image.
    assert!(h.blobs.contains(&appliances[0].image_url));
}

#[tokio::test]
async fn analysis_failure_returns_to_idle_and_releases_image() {
    let h = harness(MockAssistant::new().with_failure("analyze_label"));

    let err = h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap_err();
    assert!(err.to_string().contains("Simulated failure"));

    assert_eq!(h.session.state(), AppState::Idle);
    assert!(h.session.current().is_none());
    assert!(h.session.last_error().is_some());
    assert!(h.blobs.is_empty());
}

#[tokio::test]
async fn profile_failure_discards_the_provisional_record() {
    let h = harness(MockAssistant::new().with_failure("generate_profile"));

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();

    assert!(h.session.confirm(details).await.is_err());
    assert_eq!(h.session.state(), AppState::Idle);
    assert!(h.session.current().is_none());
    assert!(h.session.last_error().is_some());
    assert!(h.blobs.is_empty());
}

#[tokio::test]
async fn cancel_confirmation_releases_the_image() {
    let h = harness(MockAssistant::new());

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    assert_eq!(h.blobs.len(), 1);

    h.session.cancel_confirmation();
    assert_eq!(h.session.state(), AppState::Idle);
    assert!(h.session.current().is_none());
    assert!(h.blobs.is_empty());
}

#[tokio::test]
async fn selecting_a_saved_record_does_not_reinvoke_the_collaborator() {
    let h = harness(MockAssistant::new());

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();
    let id = h.session.current().unwrap().id.clone();
    h.session.save_current();

    let analyze_calls = h.assistant.call_count("analyze_label");
    let profile_calls = h.assistant.call_count("generate_profile");

    assert!(h.session.select_saved(&id));
    assert_eq!(h.session.state(), AppState::Results);
    assert_eq!(h.session.current().unwrap().id, id);

    assert_eq!(h.assistant.call_count("analyze_label"), analyze_calls);
    assert_eq!(h.assistant.call_count("generate_profile"), profile_calls);

    assert!(!h.session.select_saved(&RecordId::from("unknown")));
}

#[tokio::test]
async fn selecting_a_saved_record_discards_an_open_unsaved_one() {
    let h = harness(MockAssistant::new());

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();
    let saved_id = h.session.current().unwrap().id.clone();
    h.session.save_current();

    // A second photo is in flight, unsaved, when the user opens the first.
    h.session.submit_image(b"jpeg-2", "image/jpeg").await.unwrap();
    assert_eq!(h.blobs.len(), 2);

    assert!(h.session.select_saved(&saved_id));
    assert_eq!(h.session.current().unwrap().id, saved_id);

    // The abandoned provisional record released its image; the saved one kept its own.
    assert_eq!(h.blobs.len(), 1);
    assert!(h.blobs.contains(&h.session.current().unwrap().image_url));
}

#[tokio::test]
async fn delete_undo_round_trip() {
    let h = harness(MockAssistant::new());

    for _ in 0..3 {
        h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
        let details = h.session.current().unwrap().details().clone();
        h.session.confirm(details).await.unwrap();
        h.session.save_current();
    }

    let before = h.session.appliances();
    let middle = before[1].id.clone();

    // Delete: it disappears and an undo affordance appears.
    assert!(h.session.delete_saved(&middle));
    assert_eq!(h.session.appliances().len(), 2);
    assert_eq!(h.session.pending_undo().unwrap().id, middle);

    // Undo restores it at its original position.
    assert_eq!(h.session.undo_delete(), Some(middle.clone()));
    assert_eq!(h.session.appliances(), before);

    // Dismissing makes a later delete permanent.
    assert!(h.session.delete_saved(&middle));
    h.session.dismiss_undo();
    assert!(h.session.undo_delete().is_none());
    assert_eq!(h.session.appliances().len(), 2);
}

#[tokio::test]
async fn document_scan_enriches_in_the_background() {
    let h = harness(MockAssistant::new());

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();

    let doc_id = h.session.add_document("receipt.jpg", b"jpeg", "image/jpeg").unwrap();

    // Optimistically visible in scanning state.
    let docs = h.session.current().unwrap().documents;
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, doc_id);

    let session = h.session.clone();
    wait_until(move || {
        session.current().unwrap().documents[0].scan_status == ScanStatus::Complete
    })
    .await;

    let current = h.session.current().unwrap();
    let warranty = current.documents[0].warranty_info.as_ref().unwrap();
    assert_eq!(warranty.info.warranty_end_date.as_deref(), Some("2027-11-02"));

    // Save and reload through a fresh session: the enrichment persisted.
    h.session.save_current();
    let reloaded = Session::new(
        h.medium.clone(),
        Arc::new(MemoryBlobStore::new()),
        Arc::new(MockAssistant::new()),
        None,
    );
    let appliances = reloaded.appliances();
    assert_eq!(appliances[0].documents.len(), 1);
    assert!(appliances[0].documents[0].warranty_info.is_some());
}

#[tokio::test]
async fn non_image_documents_skip_extraction() {
    let h = harness(MockAssistant::new());

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();

    h.session.add_document("manual.pdf", b"%PDF-1.4", "application/pdf").unwrap();

    let docs = h.session.current().unwrap().documents;
    assert_eq!(docs[0].scan_status, ScanStatus::Complete);
    assert!(docs[0].warranty_info.is_none());
    assert_eq!(h.assistant.call_count("extract_document"), 0);
}

#[tokio::test]
async fn failed_scan_marks_the_document() {
    let h = harness(MockAssistant::new().with_failure("extract_document"));

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();

    h.session.add_document("receipt.jpg", b"jpeg", "image/jpeg").unwrap();

    let session = h.session.clone();
    wait_until(move || {
        session.current().unwrap().documents[0].scan_status == ScanStatus::Error
    })
    .await;
}

#[tokio::test]
async fn document_deleted_mid_scan_stays_deleted() {
    let h = harness(MockAssistant::new().with_latency_ms(30));

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();

    let doc_id = h.session.add_document("receipt.jpg", b"jpeg", "image/jpeg").unwrap();
    h.session.delete_document(doc_id);
    assert!(h.session.current().unwrap().documents.is_empty());

    // Give the outstanding scan time to resolve; the lost update must not
    // resurrect the document.
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(h.session.current().unwrap().documents.is_empty());
}

#[tokio::test]
async fn research_report_lifecycle() {
    let h = harness(MockAssistant::new());

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();

    let report_id = h.session.start_research("noisy compressor").unwrap();

    // Visible immediately as pending.
    let reports = h.session.current().unwrap().research_reports;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].id, report_id);
    assert_eq!(reports[0].status, ReportStatus::Pending);
    assert_eq!(reports[0].topic, "noisy compressor");

    let session = h.session.clone();
    wait_until(move || {
        session.current().unwrap().research_reports[0].status == ReportStatus::Complete
    })
    .await;

    let reports = h.session.current().unwrap().research_reports;
    assert_eq!(reports.len(), 1, "exactly one report with that id, never two");
    assert!(reports[0].content.as_deref().unwrap().contains("Overview"));
    assert!(!reports[0].sources.is_empty());
}

#[tokio::test]
async fn failed_research_reports_the_error() {
    let h = harness(MockAssistant::new().with_failure("deep_research"));

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();

    h.session.start_research("noisy compressor").unwrap();

    let session = h.session.clone();
    wait_until(move || {
        session.current().unwrap().research_reports[0].status == ReportStatus::Error
    })
    .await;

    let reports = h.session.current().unwrap().research_reports;
    assert_eq!(reports.len(), 1);
    let message = reports[0].error.as_deref().unwrap();
    assert!(!message.is_empty());
}

#[tokio::test]
async fn chat_streams_and_persists_the_transcript() {
    let assistant = MockAssistant::new()
        .with_chat_reply("A low hum is normal.")
        .with_chat_sources(vec![upkeep_core::SourceRef {
            title: "Service manual".to_string(),
            uri: "https://acme.example/manual".to_string(),
        }]);
    let h = harness(assistant);

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();
    let id = h.session.current().unwrap().id.clone();
    h.session.save_current();
    h.session.select_saved(&id);

    let mut streamed = String::new();
    let transcript = h
        .session
        .send_chat_message("Why is it humming?", |fragment| streamed.push_str(fragment))
        .await
        .unwrap();

    // Fragments arrived incrementally and reassemble the full reply.
    assert_eq!(streamed, "A low hum is normal.");
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].text(), "Why is it humming?");
    assert_eq!(transcript[1].text(), "A low hum is normal.");
    assert_eq!(transcript[1].sources.len(), 1);
    assert!(!transcript[1].suggestions.is_empty());

    // Persisted on the saved record and mirrored onto the open one.
    assert_eq!(h.session.current().unwrap().chat_history.len(), 2);
    assert_eq!(h.session.appliances()[0].chat_history.len(), 2);
}

#[tokio::test]
async fn failed_chat_persists_an_apology_reply() {
    let h = harness(MockAssistant::new().with_chat_mid_stream_failure());

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();
    let id = h.session.current().unwrap().id.clone();
    h.session.save_current();
    h.session.select_saved(&id);

    assert!(h
        .session
        .send_chat_message("Why is it humming?", |_| {})
        .await
        .is_err());

    let history = h.session.appliances()[0].chat_history.clone();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].text(), "Why is it humming?");
    assert!(history[1].text().contains("Sorry, I encountered an error"));
}

#[tokio::test]
async fn reminder_and_completion_mirror_onto_the_open_record() {
    let h = harness(MockAssistant::new());

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();
    let id = h.session.current().unwrap().id.clone();
    h.session.save_current();
    h.session.select_saved(&id);

    let when = chrono::Utc::now();
    h.session.set_reminder(1, Some(when));
    h.session.mark_task_complete(0);

    let current = h.session.current().unwrap();
    assert_eq!(current.response.care_schedule[1].reminder, Some(when));
    assert!(current.response.care_schedule[0].last_completed.is_some());

    // Out-of-range index leaves the schedule unchanged.
    let before = current.response.care_schedule.clone();
    h.session.set_reminder(before.len(), Some(when));
    assert_eq!(
        h.session.current().unwrap().response.care_schedule,
        before
    );

    // The saved collection reflects the same updates.
    let appliances = h.session.appliances();
    assert_eq!(appliances[0].response.care_schedule[1].reminder, Some(when));
}

#[tokio::test]
async fn services_and_knowledge_base_persist_across_sessions() {
    let h = harness(MockAssistant::new());

    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();

    let service = h.session.current().unwrap().response.local_services[0].clone();
    h.session.toggle_saved_service(&service);
    assert_eq!(h.session.saved_services().len(), 1);

    let item = h.session.ask_knowledge_base("How do I descale?").await.unwrap();
    assert_eq!(h.session.knowledge_base().len(), 1);

    // Toggling the same name+address pair removes the saved entry.
    h.session.toggle_saved_service(&service);
    assert!(h.session.saved_services().is_empty());
    h.session.toggle_saved_service(&service);

    let reloaded = Session::new(
        h.medium.clone(),
        Arc::new(MemoryBlobStore::new()),
        Arc::new(MockAssistant::new()),
        None,
    );
    assert_eq!(reloaded.saved_services().len(), 1);
    assert_eq!(reloaded.knowledge_base().len(), 1);
    assert_eq!(reloaded.knowledge_base()[0].question, "How do I descale?");

    reloaded.remove_knowledge_item(item.id);
    assert!(reloaded.knowledge_base().is_empty());
}

#[tokio::test]
async fn corrupted_storage_still_boots_a_usable_session() {
    let medium = Arc::new(MemoryMedium::new());
    medium.set("savedAppliances", "definitely not json").unwrap();
    medium.set("savedServices", "42").unwrap();
    medium.set("knowledgeBase", r#"{"wrong": "shape"}"#).unwrap();
    medium.set("isLoggedIn", r#"["array"]"#).unwrap();

    let session = Session::new(
        medium,
        Arc::new(MemoryBlobStore::new()),
        Arc::new(MockAssistant::new()),
        None,
    );

    assert!(session.appliances().is_empty());
    assert!(session.saved_services().is_empty());
    assert!(session.knowledge_base().is_empty());
    assert!(!session.is_logged_in());

    // And the session remains fully usable.
    session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    assert_eq!(session.state(), AppState::Confirming);
}

#[tokio::test]
async fn dashboard_passthroughs_delegate_to_the_collaborator() {
    let h = harness(MockAssistant::new());

    let tip = h.session.pro_tip().await.unwrap();
    assert!(!tip.is_empty());

    let estimate = h.session.cost_estimate("Not cooling", "Portland, OR").await.unwrap();
    assert!(!estimate.text.is_empty());

    let repairs = h.session.suggested_repairs("Refrigerator").await.unwrap();
    assert_eq!(repairs.len(), 2);

    assert_eq!(h.assistant.call_count("pro_tip"), 1);
    assert_eq!(h.assistant.call_count("cost_estimate"), 1);
    assert_eq!(h.assistant.call_count("suggested_repairs"), 1);
}

#[tokio::test]
async fn warranty_alerts_surface_expiring_documents() {
    // The default mock extraction dates the warranty well in the future;
    // use one expiring soon so the alert window catches it.
    let soon = (chrono::Utc::now().date_naive() + chrono::Duration::days(10))
        .format("%Y-%m-%d")
        .to_string();
    let assistant = MockAssistant::new().with_document_info(upkeep_core::ExtractedDocInfo {
        store: None,
        purchase_date: None,
        total_price: None,
        warranty_end_date: Some(soon),
    });

    let h = harness(assistant);
    h.session.submit_image(b"jpeg", "image/jpeg").await.unwrap();
    let details = h.session.current().unwrap().details().clone();
    h.session.confirm(details).await.unwrap();
    h.session.add_document("receipt.jpg", b"jpeg", "image/jpeg").unwrap();

    let session = h.session.clone();
    wait_until(move || {
        session.current().unwrap().documents[0].scan_status == ScanStatus::Complete
    })
    .await;
    h.session.save_current();

    let alerts = h.session.warranty_alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].days_left, 10);
    assert_eq!(alerts[0].document_name, "receipt.jpg");
}
