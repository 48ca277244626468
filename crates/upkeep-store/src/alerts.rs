//! Warranty expiration alerts derived from scanned documents.

use chrono::NaiveDate;

use upkeep_core::{defaults, SavedAppliance, WarrantyAlert};

/// Collect warranties expiring within the alert window (today inclusive),
/// sorted soonest first. Already-expired warranties are not alerted.
pub fn warranty_alerts(appliances: &[SavedAppliance], today: NaiveDate) -> Vec<WarrantyAlert> {
    let mut alerts: Vec<WarrantyAlert> = appliances
        .iter()
        .flat_map(|appliance| {
            appliance.documents.iter().filter_map(move |doc| {
                let raw = doc.warranty_info.as_ref()?.info.warranty_end_date.as_deref()?;
                let end_date = parse_date(raw)?;
                let days_left = (end_date - today).num_days();
                if !(0..=defaults::WARRANTY_ALERT_WINDOW_DAYS).contains(&days_left) {
                    return None;
                }
                Some(WarrantyAlert {
                    appliance_id: appliance.id.clone(),
                    appliance_name: appliance.details().display_name(),
                    document_name: doc.name.clone(),
                    days_left,
                    end_date,
                })
            })
        })
        .collect();

    alerts.sort_by_key(|a| a.days_left);
    alerts
}

/// Parse an AI-extracted date string. ISO `YYYY-MM-DD` is the promised
/// format; a leading date inside a longer timestamp is accepted too.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}
