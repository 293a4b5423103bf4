//! Persistence for resolved user locations.
//!
//! One row per user, written with atomic upsert semantics so concurrent
//! writers degrade to last-writer-wins instead of corrupting a reader.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// How a location value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationSource {
    /// Returned from a previously persisted row.
    Cache,
    /// Looked up via IP geolocation.
    IpDetected,
    /// Explicitly supplied by the user.
    UserSet,
}

impl LocationSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::IpDetected => "ip-detected",
            Self::UserSet => "user-set",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "ip-detected" => Self::IpDetected,
            "user-set" => Self::UserSet,
            _ => Self::Cache,
        }
    }
}

/// A user's resolved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub user_id: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: String,
    pub zip: String,
    pub source: LocationSource,
}

impl ResolvedLocation {
    /// City alone, or "city, region, country" when the extra parts exist.
    pub fn describe(&self) -> String {
        [&self.city, &self.region, &self.country]
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// CRUD operations on persisted locations.
#[derive(Clone)]
pub struct LocationStore {
    db: Database,
}

impl LocationStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert or replace the location for a user.  Last writer wins.
    pub async fn upsert(&self, location: &ResolvedLocation) -> StoreResult<()> {
        let loc = location.clone();
        let now = Utc::now().timestamp();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO locations
                         (user_id, city, region, country, latitude, longitude, timezone, zip, source, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                     ON CONFLICT(user_id) DO UPDATE SET
                         city = excluded.city,
                         region = excluded.region,
                         country = excluded.country,
                         latitude = excluded.latitude,
                         longitude = excluded.longitude,
                         timezone = excluded.timezone,
                         zip = excluded.zip,
                         source = excluded.source,
                         updated_at = excluded.updated_at",
                    rusqlite::params![
                        loc.user_id,
                        loc.city,
                        loc.region,
                        loc.country,
                        loc.latitude,
                        loc.longitude,
                        loc.timezone,
                        loc.zip,
                        loc.source.as_str(),
                        now,
                    ],
                )?;
                Ok(())
            })
            .await?;
        debug!(user_id = %location.user_id, city = %location.city, "location persisted");
        Ok(())
    }

    /// Load the persisted location for a user, if any.
    pub async fn load(&self, user_id: &str) -> StoreResult<Option<ResolvedLocation>> {
        let user_id = user_id.to_string();
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT user_id, city, region, country, latitude, longitude, timezone, zip, source
                     FROM locations WHERE user_id = ?1",
                    rusqlite::params![user_id],
                    |row| {
                        Ok(ResolvedLocation {
                            user_id: row.get(0)?,
                            city: row.get(1)?,
                            region: row.get(2)?,
                            country: row.get(3)?,
                            latitude: row.get(4)?,
                            longitude: row.get(5)?,
                            timezone: row.get(6)?,
                            zip: row.get(7)?,
                            source: LocationSource::parse(&row.get::<_, String>(8)?),
                        })
                    },
                );
                match result {
                    Ok(loc) => Ok(Some(loc)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// Remove the persisted location for a user.
    pub async fn delete(&self, user_id: &str) -> StoreResult<bool> {
        let user_id = user_id.to_string();
        let n = self
            .db
            .execute(move |conn| {
                let n = conn.execute(
                    "DELETE FROM locations WHERE user_id = ?1",
                    rusqlite::params![user_id],
                )?;
                Ok(n)
            })
            .await?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(user: &str, city: &str, source: LocationSource) -> ResolvedLocation {
        ResolvedLocation {
            user_id: user.to_string(),
            city: city.to_string(),
            region: "Rajasthan".to_string(),
            country: "India".to_string(),
            latitude: Some(26.9),
            longitude: Some(75.8),
            timezone: "Asia/Kolkata".to_string(),
            zip: "302001".to_string(),
            source,
        }
    }

    async fn store() -> LocationStore {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        LocationStore::new(db)
    }

    #[tokio::test]
    async fn load_missing_returns_none() {
        let store = store().await;
        assert!(store.load("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_then_load_round_trips() {
        let store = store().await;
        let loc = sample("me", "jaipur", LocationSource::IpDetected);
        store.upsert(&loc).await.unwrap();

        let loaded = store.load("me").await.unwrap().unwrap();
        assert_eq!(loaded, loc);
    }

    #[tokio::test]
    async fn upsert_overwrites_last_writer_wins() {
        let store = store().await;
        store
            .upsert(&sample("me", "jaipur", LocationSource::IpDetected))
            .await
            .unwrap();
        store
            .upsert(&sample("me", "delhi", LocationSource::UserSet))
            .await
            .unwrap();

        let loaded = store.load("me").await.unwrap().unwrap();
        assert_eq!(loaded.city, "delhi");
        assert_eq!(loaded.source, LocationSource::UserSet);
    }

    #[tokio::test]
    async fn users_are_independent() {
        let store = store().await;
        store
            .upsert(&sample("a", "jaipur", LocationSource::UserSet))
            .await
            .unwrap();
        store
            .upsert(&sample("b", "delhi", LocationSource::UserSet))
            .await
            .unwrap();

        assert_eq!(store.load("a").await.unwrap().unwrap().city, "jaipur");
        assert_eq!(store.load("b").await.unwrap().unwrap().city, "delhi");
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let store = store().await;
        store
            .upsert(&sample("me", "jaipur", LocationSource::UserSet))
            .await
            .unwrap();
        assert!(store.delete("me").await.unwrap());
        assert!(store.load("me").await.unwrap().is_none());
        assert!(!store.delete("me").await.unwrap());
    }

    #[test]
    fn describe_skips_empty_parts() {
        let mut loc = sample("me", "jaipur", LocationSource::Cache);
        assert_eq!(loc.describe(), "jaipur, Rajasthan, India");
        loc.region.clear();
        assert_eq!(loc.describe(), "jaipur, India");
    }
}
