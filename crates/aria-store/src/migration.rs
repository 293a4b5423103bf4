//! Schema migrations, versioned through `PRAGMA user_version`.

use rusqlite::Connection;
use tracing::info;

use crate::error::{StoreError, StoreResult};

/// Ordered list of migrations; index + 1 is the target user_version.
const MIGRATIONS: &[&str] = &[
    // v1: resolved user locations, one row per user.
    "CREATE TABLE IF NOT EXISTS locations (
        user_id    TEXT PRIMARY KEY,
        city       TEXT NOT NULL,
        region     TEXT NOT NULL DEFAULT '',
        country    TEXT NOT NULL DEFAULT '',
        latitude   REAL,
        longitude  REAL,
        timezone   TEXT NOT NULL DEFAULT '',
        zip        TEXT NOT NULL DEFAULT '',
        source     TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );",
];

/// Apply every migration newer than the database's current version.
pub fn run_all(conn: &Connection) -> StoreResult<()> {
    let current: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let version = (idx + 1) as i32;
        if version <= current {
            continue;
        }
        conn.execute_batch(sql)
            .map_err(|e| StoreError::Migration {
                version,
                reason: e.to_string(),
            })?;
        conn.pragma_update(None, "user_version", version)?;
        info!(version, "schema migrated");
    }

    Ok(())
}
