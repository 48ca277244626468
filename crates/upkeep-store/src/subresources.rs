//! Sub-resource updaters: thin transforms producing partial-update payloads.
//!
//! Each function reads the relevant sequence off the current record,
//! produces a new sequence, and returns it as an [`AppliancePatch`] for
//! [`ops::update_by_id`](crate::ops::update_by_id). Replace-by-id
//! operations tolerate the entry having been deleted in the interim: an
//! unmatched id yields the empty patch and the update simply has no effect.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use upkeep_core::{
    ChatMessage, Document, ExtractedDocInfo, ReportStatus, ResearchReport, SavedAppliance,
    ScanStatus, SourceRef, WarrantyInfo,
};

use crate::repository::AppliancePatch;

fn schedule_patch(record: &SavedAppliance, schedule: Vec<upkeep_core::CareTask>) -> AppliancePatch {
    let mut response = record.response.clone();
    response.care_schedule = schedule;
    AppliancePatch {
        response: Some(response),
        ..Default::default()
    }
}

/// Set or clear the reminder on the task at `task_index`. An out-of-range
/// index is a no-op.
pub fn set_reminder(
    record: &SavedAppliance,
    task_index: usize,
    reminder: Option<DateTime<Utc>>,
) -> AppliancePatch {
    let mut schedule = record.response.care_schedule.clone();
    match schedule.get_mut(task_index) {
        Some(task) => {
            task.reminder = reminder;
            schedule_patch(record, schedule)
        }
        None => AppliancePatch::default(),
    }
}

/// Stamp the task at `task_index` as completed now. An out-of-range index
/// is a no-op.
pub fn mark_task_complete(
    record: &SavedAppliance,
    task_index: usize,
    now: DateTime<Utc>,
) -> AppliancePatch {
    let mut schedule = record.response.care_schedule.clone();
    match schedule.get_mut(task_index) {
        Some(task) => {
            task.last_completed = Some(now);
            schedule_patch(record, schedule)
        }
        None => AppliancePatch::default(),
    }
}

/// Set or clear the appliance-level maintenance due date.
pub fn set_due_date(record: &SavedAppliance, due_date: Option<String>) -> AppliancePatch {
    let mut response = record.response.clone();
    response.appliance_details.due_date = due_date;
    AppliancePatch {
        response: Some(response),
        ..Default::default()
    }
}

// ─── Documents ─────────────────────────────────────────────────────────────

/// Append a freshly-uploaded document, in `Scanning` state.
pub fn add_document(record: &SavedAppliance, document: Document) -> AppliancePatch {
    let mut documents = record.documents.clone();
    documents.push(document);
    AppliancePatch {
        documents: Some(documents),
        ..Default::default()
    }
}

/// Mark the document's scan complete, attaching warranty info when the
/// extraction found a purchase or warranty-end date. No-op when the
/// document was deleted while the scan was outstanding.
pub fn resolve_document(
    record: &SavedAppliance,
    document_id: Uuid,
    extracted: Option<ExtractedDocInfo>,
    now: DateTime<Utc>,
) -> AppliancePatch {
    replace_document(record, document_id, |doc| {
        doc.scan_status = ScanStatus::Complete;
        doc.warranty_info = extracted.filter(|info| info.has_dates()).map(|info| WarrantyInfo {
            info,
            scanned_at: now,
        });
    })
}

/// Mark the document's scan failed. Same interim-deletion tolerance as
/// [`resolve_document`].
pub fn fail_document(record: &SavedAppliance, document_id: Uuid) -> AppliancePatch {
    replace_document(record, document_id, |doc| {
        doc.scan_status = ScanStatus::Error;
    })
}

fn replace_document(
    record: &SavedAppliance,
    document_id: Uuid,
    edit: impl FnOnce(&mut Document),
) -> AppliancePatch {
    let mut documents = record.documents.clone();
    match documents.iter_mut().find(|d| d.id == document_id) {
        Some(doc) => {
            edit(doc);
            AppliancePatch {
                documents: Some(documents),
                ..Default::default()
            }
        }
        None => AppliancePatch::default(),
    }
}

/// Drop the document with `document_id`.
pub fn remove_document(record: &SavedAppliance, document_id: Uuid) -> AppliancePatch {
    let documents: Vec<Document> = record
        .documents
        .iter()
        .filter(|d| d.id != document_id)
        .cloned()
        .collect();
    AppliancePatch {
        documents: Some(documents),
        ..Default::default()
    }
}

// ─── Research reports ──────────────────────────────────────────────────────

/// Prepend a pending report so it is visible before the collaborator call
/// begins.
pub fn start_report(record: &SavedAppliance, report: ResearchReport) -> AppliancePatch {
    let mut reports = Vec::with_capacity(record.research_reports.len() + 1);
    reports.push(report);
    reports.extend_from_slice(&record.research_reports);
    AppliancePatch {
        research_reports: Some(reports),
        ..Default::default()
    }
}

/// Transition the report to `Complete` with its content and sources. No-op
/// when the report was deleted while the research was outstanding.
pub fn complete_report(
    record: &SavedAppliance,
    report_id: Uuid,
    content: String,
    sources: Vec<SourceRef>,
) -> AppliancePatch {
    replace_report(record, report_id, |report| {
        report.status = ReportStatus::Complete;
        report.content = Some(content);
        report.sources = sources;
    })
}

/// Transition the report to `Error` with a message. Same tolerance as
/// [`complete_report`].
pub fn fail_report(record: &SavedAppliance, report_id: Uuid, message: String) -> AppliancePatch {
    replace_report(record, report_id, |report| {
        report.status = ReportStatus::Error;
        report.error = Some(message);
    })
}

fn replace_report(
    record: &SavedAppliance,
    report_id: Uuid,
    edit: impl FnOnce(&mut ResearchReport),
) -> AppliancePatch {
    let mut reports = record.research_reports.clone();
    match reports.iter_mut().find(|r| r.id == report_id) {
        Some(report) => {
            edit(report);
            AppliancePatch {
                research_reports: Some(reports),
                ..Default::default()
            }
        }
        None => AppliancePatch::default(),
    }
}

/// Drop the report with `report_id`.
pub fn remove_report(record: &SavedAppliance, report_id: Uuid) -> AppliancePatch {
    let reports: Vec<ResearchReport> = record
        .research_reports
        .iter()
        .filter(|r| r.id != report_id)
        .cloned()
        .collect();
    AppliancePatch {
        research_reports: Some(reports),
        ..Default::default()
    }
}

// ─── Chat ──────────────────────────────────────────────────────────────────

/// Wholesale replacement of the stored chat transcript.
pub fn replace_chat_history(history: Vec<ChatMessage>) -> AppliancePatch {
    AppliancePatch {
        chat_history: Some(history),
        ..Default::default()
    }
}
