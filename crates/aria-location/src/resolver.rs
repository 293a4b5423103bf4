//! The location resolution fallback chain.

use std::sync::Arc;

use tracing::{debug, warn};

use aria_providers::{GeoFix, GeoIpProvider};
use aria_store::{LocationSource, LocationStore, ResolvedLocation, StoreResult};

/// The outcome of a resolution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A location was found (and persisted, unless it was a cache hit).
    Located(ResolvedLocation),
    /// Nothing resolved; the calling flow must ask the user for a city and
    /// re-enter with it as the explicit city.
    NeedsPrompt,
}

/// Resolves "current location" for a user.
///
/// Owns all mutation of [`ResolvedLocation`]; the engine only requests
/// resolution or an explicit override.
#[derive(Clone)]
pub struct LocationResolver {
    store: LocationStore,
    geoip: Arc<dyn GeoIpProvider>,
}

impl LocationResolver {
    pub fn new(store: LocationStore, geoip: Arc<dyn GeoIpProvider>) -> Self {
        Self { store, geoip }
    }

    /// Run the fallback chain.  Store failures propagate; a geolocation
    /// failure is not an error, it just falls through to `NeedsPrompt`.
    pub async fn resolve(
        &self,
        user_id: &str,
        explicit_city: Option<&str>,
    ) -> StoreResult<Resolution> {
        // 1. Explicit override this turn.
        if let Some(city) = explicit_city.map(str::trim).filter(|c| !c.is_empty()) {
            let location = ResolvedLocation {
                user_id: user_id.to_string(),
                city: city.to_string(),
                region: String::new(),
                country: String::new(),
                latitude: None,
                longitude: None,
                timezone: String::new(),
                zip: String::new(),
                source: LocationSource::UserSet,
            };
            self.store.upsert(&location).await?;
            debug!(user_id, city, "location set by user");
            return Ok(Resolution::Located(location));
        }

        // 2. Previously persisted value.
        if let Some(mut cached) = self.store.load(user_id).await? {
            cached.source = LocationSource::Cache;
            debug!(user_id, city = %cached.city, "location from cache");
            return Ok(Resolution::Located(cached));
        }

        // 3. IP-based detection, persisted for future turns.
        match self.geoip.locate().await {
            Ok(fix) if !fix.city.is_empty() => {
                let location = from_fix(user_id, fix);
                self.store.upsert(&location).await?;
                debug!(user_id, city = %location.city, "location detected via IP");
                Ok(Resolution::Located(location))
            }
            Ok(_) => {
                warn!(user_id, "geolocation returned an empty city");
                Ok(Resolution::NeedsPrompt)
            }
            Err(e) => {
                warn!(user_id, error = %e, "geolocation lookup failed");
                Ok(Resolution::NeedsPrompt)
            }
        }
    }

    /// Read-only view of the user's location: the full chain, with
    /// `NeedsPrompt` flattened to `None`.
    pub async fn current(&self, user_id: &str) -> StoreResult<Option<ResolvedLocation>> {
        match self.resolve(user_id, None).await? {
            Resolution::Located(loc) => Ok(Some(loc)),
            Resolution::NeedsPrompt => Ok(None),
        }
    }
}

fn from_fix(user_id: &str, fix: GeoFix) -> ResolvedLocation {
    ResolvedLocation {
        user_id: user_id.to_string(),
        city: fix.city,
        region: fix.region,
        country: fix.country,
        latitude: fix.latitude,
        longitude: fix.longitude,
        timezone: fix.timezone,
        zip: fix.zip,
        source: LocationSource::IpDetected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use aria_providers::{ProviderError, Result as ProviderResult};
    use aria_store::Database;

    struct FakeGeoIp {
        calls: AtomicU32,
        fail: bool,
    }

    impl FakeGeoIp {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl GeoIpProvider for FakeGeoIp {
        async fn locate(&self) -> ProviderResult<GeoFix> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Failed("service unreachable".into()));
            }
            Ok(GeoFix {
                city: "Jaipur".into(),
                region: "Rajasthan".into(),
                country: "India".into(),
                latitude: Some(26.9),
                longitude: Some(75.8),
                timezone: "Asia/Kolkata".into(),
                zip: "302001".into(),
            })
        }
    }

    async fn resolver(geoip: Arc<FakeGeoIp>) -> LocationResolver {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        LocationResolver::new(LocationStore::new(db), geoip)
    }

    #[tokio::test]
    async fn explicit_city_wins_and_persists() {
        let geoip = FakeGeoIp::new(false);
        let r = resolver(Arc::clone(&geoip)).await;

        let Resolution::Located(loc) = r.resolve("me", Some("Delhi")).await.unwrap() else {
            panic!("expected Located");
        };
        assert_eq!(loc.city, "Delhi");
        assert_eq!(loc.source, LocationSource::UserSet);
        assert_eq!(geoip.calls.load(Ordering::SeqCst), 0);

        // Subsequent plain resolve hits the cache.
        let Resolution::Located(loc) = r.resolve("me", None).await.unwrap() else {
            panic!("expected Located");
        };
        assert_eq!(loc.city, "Delhi");
        assert_eq!(loc.source, LocationSource::Cache);
        assert_eq!(geoip.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ip_detection_runs_once_then_caches() {
        let geoip = FakeGeoIp::new(false);
        let r = resolver(Arc::clone(&geoip)).await;

        let Resolution::Located(first) = r.resolve("me", None).await.unwrap() else {
            panic!("expected Located");
        };
        assert_eq!(first.source, LocationSource::IpDetected);

        let Resolution::Located(second) = r.resolve("me", None).await.unwrap() else {
            panic!("expected Located");
        };
        assert_eq!(second.city, first.city);
        assert_eq!(second.source, LocationSource::Cache);

        // Exactly one lookup across the pair of calls.
        assert_eq!(geoip.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lookup_failure_yields_needs_prompt() {
        let geoip = FakeGeoIp::new(true);
        let r = resolver(Arc::clone(&geoip)).await;

        assert_eq!(r.resolve("me", None).await.unwrap(), Resolution::NeedsPrompt);
        assert!(r.current("me").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_explicit_city_is_ignored() {
        let geoip = FakeGeoIp::new(true);
        let r = resolver(geoip).await;

        assert_eq!(
            r.resolve("me", Some("   ")).await.unwrap(),
            Resolution::NeedsPrompt
        );
    }
}
