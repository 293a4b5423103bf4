//! The immutable utterance value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One piece of user input, captured once and never mutated.
///
/// `normalized_text` is lowercased, trimmed, with runs of whitespace
/// collapsed to single spaces.  All matching in the engine runs against the
/// normalized form; the raw form is kept for echoing back to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    /// The text exactly as the transport delivered it.
    pub raw_text: String,
    /// Lowercased, trimmed, whitespace-collapsed form.
    pub normalized_text: String,
    /// When the utterance was received.
    pub received_at: DateTime<Utc>,
}

impl Utterance {
    /// Capture a new utterance, normalizing it immediately.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw_text = raw.into();
        let normalized_text = normalize(&raw_text);
        Self {
            raw_text,
            normalized_text,
            received_at: Utc::now(),
        }
    }

    /// True when nothing intelligible was captured (silence or noise).
    pub fn is_empty(&self) -> bool {
        self.normalized_text.is_empty()
    }
}

/// Lowercase, trim, and collapse internal whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_lowercases_and_collapses() {
        let u = Utterance::new("  Write Me   An EMAIL  ");
        assert_eq!(u.normalized_text, "write me an email");
        assert_eq!(u.raw_text, "  Write Me   An EMAIL  ");
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(Utterance::new("   ").is_empty());
        assert!(!Utterance::new("hi").is_empty());
    }
}
