//! Natural-language utilities for Aria — utterance normalization and
//! pattern-based slot extraction.
//!
//! Everything in this crate is deterministic and side-effect free: slot
//! extraction signals absence by returning `None` so callers can re-prompt,
//! and never panics on malformed input.

pub mod datetime;
pub mod email;
pub mod slots;
pub mod utterance;

pub use datetime::parse_datetime_at;
pub use email::{is_valid_email, normalize_email_from_speech, parse_email};
pub use slots::{SlotExtractor, SlotKind, SlotValue};
pub use utterance::{Utterance, normalize};
