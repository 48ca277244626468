//! Best-effort device location.
//!
//! Absence of permission or capability must never block a flow: every
//! failure mode collapses to `None` and the caller proceeds without a
//! location.

use async_trait::async_trait;

use upkeep_core::GeoPoint;

/// Source of the device's current location.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// The current location, or `None` when unavailable or denied.
    async fn current_location(&self) -> Option<GeoPoint>;
}

/// A provider pinned to one location, for tests and kiosk deployments.
pub struct FixedLocation(pub GeoPoint);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Option<GeoPoint> {
        Some(self.0)
    }
}

/// A provider that never yields a location.
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_location(&self) -> Option<GeoPoint> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_location() {
        let provider = FixedLocation(GeoPoint {
            latitude: 37.77,
            longitude: -122.42,
        });
        let point = provider.current_location().await.unwrap();
        assert_eq!(point.latitude, 37.77);
    }

    #[tokio::test]
    async fn test_no_location() {
        assert!(NoLocation.current_location().await.is_none());
    }
}
