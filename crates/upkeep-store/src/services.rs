//! Saved repair services: a top-level collection keyed by name plus
//! address, separate from any appliance.

use chrono::{DateTime, Utc};

use upkeep_core::{LocalService, SavedService};

/// Whether a service with the same name and address is already saved.
pub fn is_service_saved(saved: &[SavedService], service: &LocalService) -> bool {
    let key = service.key();
    saved.iter().any(|s| s.service.key() == key)
}

/// Toggle a service in the saved collection: remove the existing entry
/// with the same name and address, or append a new one stamped `now`.
pub fn toggle_service(
    saved: &[SavedService],
    service: &LocalService,
    now: DateTime<Utc>,
) -> Vec<SavedService> {
    let key = service.key();
    if is_service_saved(saved, service) {
        saved
            .iter()
            .filter(|s| s.service.key() != key)
            .cloned()
            .collect()
    } else {
        let mut updated = saved.to_vec();
        updated.push(SavedService {
            service: service.clone(),
            saved_at: now,
        });
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str, address: &str) -> LocalService {
        LocalService {
            name: name.to_string(),
            address: address.to_string(),
            phone: None,
            website: None,
            recommendation: None,
        }
    }

    #[test]
    fn test_toggle_saves_then_removes() {
        let fixit = service("FixIt Co", "1 Main St");
        let now = Utc::now();

        let saved = toggle_service(&[], &fixit, now);
        assert_eq!(saved.len(), 1);
        assert!(is_service_saved(&saved, &fixit));
        assert_eq!(saved[0].saved_at, now);

        let saved = toggle_service(&saved, &fixit, Utc::now());
        assert!(saved.is_empty());
    }

    #[test]
    fn test_toggle_twice_returns_original_contents() {
        let other = SavedService {
            service: service("Other", "9 Side St"),
            saved_at: Utc::now(),
        };
        let original = vec![other];
        let fixit = service("FixIt Co", "1 Main St");

        let once = toggle_service(&original, &fixit, Utc::now());
        let twice = toggle_service(&once, &fixit, Utc::now());
        assert_eq!(twice, original);
    }

    #[test]
    fn test_same_name_different_address_is_distinct() {
        let a = service("FixIt Co", "1 Main St");
        let b = service("FixIt Co", "2 Oak Ave");

        let saved = toggle_service(&[], &a, Utc::now());
        let saved = toggle_service(&saved, &b, Utc::now());
        assert_eq!(saved.len(), 2);

        let saved = toggle_service(&saved, &a, Utc::now());
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].service.address, "2 Oak Ave");
    }
}
