//! Current-location resolution for Aria.
//!
//! Resolution order, short-circuiting on first success:
//!
//! 1. an explicit city supplied this turn (persisted, `user-set`)
//! 2. the previously persisted location (`cache`)
//! 3. IP-based geolocation (persisted, `ip-detected`)
//! 4. none of the above — the caller must prompt the user
//!
//! Every successful resolution other than a cache hit writes through, so
//! the prompt path occurs at most once per user unless the user overrides.

pub mod resolver;

pub use aria_store::{LocationSource, ResolvedLocation};
pub use resolver::{LocationResolver, Resolution};
