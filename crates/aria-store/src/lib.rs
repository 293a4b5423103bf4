//! Persistence layer for Aria.
//!
//! The engine keeps session state in memory; the only durable state is the
//! resolved location per user, stored in SQLite.

pub mod db;
pub mod error;
pub mod location;
pub mod migration;

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use location::{LocationSource, LocationStore, ResolvedLocation};
