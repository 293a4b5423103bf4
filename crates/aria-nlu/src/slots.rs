//! Pattern-based slot extraction.
//!
//! `SlotExtractor::extract` is the single entry point used by both the
//! intent classifier and the action flows.  It is a pure function over its
//! inputs: no I/O, no panics, and absence is always `None` so the caller
//! can re-prompt.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::datetime::parse_datetime_at;
use crate::email::parse_email;

/// The kinds of values an action flow may need from a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// An email address (or a display name left for contact lookup).
    Recipient,
    /// A point in time, resolved against the session timezone.
    DateTime,
    /// A city name.
    City,
    /// The reply verbatim, trimmed.
    FreeText,
}

/// A successfully extracted slot value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotValue {
    Text(String),
    When(DateTime<FixedOffset>),
}

impl SlotValue {
    /// Borrow the textual form, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::When(_) => None,
        }
    }

    /// The datetime, if this is a temporal value.
    pub fn as_when(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::When(t) => Some(*t),
            Self::Text(_) => None,
        }
    }
}

impl std::fmt::Display for SlotValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::When(t) => write!(f, "{}", t.format("%A %d %b, %I:%M %p")),
        }
    }
}

// City extraction: preposition-anchored first, possessive second.
static CITY_PREPOSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:weather|temperature|climate|forecast)\s+(?:in|of|for|at)\s+([\w\s]+?)(?:\s+is|\s+like|\?|\.|$)",
    )
    .expect("city preposition regex")
});

static CITY_POSSESSIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\w\s]+?)\s+(?:weather|temperature|climate|forecast)\b")
        .expect("city possessive regex")
});

// "s" shows up when an apostrophe splits "what's" across the \w boundary.
const CITY_FILLERS: &[&str] = &[
    "the", "is", "like", "today", "tomorrow", "now", "what", "whats", "s", "tell", "me", "about",
    "how", "hot", "cold", "my", "current", "a", "an", "in", "of", "for", "at", "please",
];

/// Rule-based extractor, parameterized by the session timezone.
#[derive(Debug, Clone)]
pub struct SlotExtractor {
    tz: FixedOffset,
}

impl SlotExtractor {
    pub fn new(tz: FixedOffset) -> Self {
        Self { tz }
    }

    /// Extract a value of `kind` from `text`, resolving times against the
    /// current instant.
    pub fn extract(&self, kind: SlotKind, text: &str) -> Option<SlotValue> {
        self.extract_at(kind, text, Utc::now().with_timezone(&self.tz))
    }

    /// Deterministic variant with an injected "now", used by the datetime
    /// path and by tests.
    pub fn extract_at(
        &self,
        kind: SlotKind,
        text: &str,
        now: DateTime<FixedOffset>,
    ) -> Option<SlotValue> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        match kind {
            SlotKind::Recipient => extract_recipient(trimmed).map(SlotValue::Text),
            SlotKind::DateTime => parse_datetime_at(trimmed, now).map(SlotValue::When),
            SlotKind::City => extract_city(trimmed).map(SlotValue::Text),
            SlotKind::FreeText => Some(SlotValue::Text(trimmed.to_string())),
        }
    }
}

/// Email address first; otherwise treat the reply as a display name to be
/// resolved by a contact lookup downstream.
fn extract_recipient(text: &str) -> Option<String> {
    if let Some(email) = parse_email(text) {
        return Some(email);
    }
    // A display name is plausible only if it is short and has no digits.
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || words.len() > 4 || text.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(text.to_string())
}

/// Two strategies against the same text; first non-empty capture wins.
fn extract_city(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    for re in [&*CITY_PREPOSITION, &*CITY_POSSESSIVE] {
        if let Some(caps) = re.captures(&lowered)
            && let Some(city) = clean_city(&caps[1])
        {
            return Some(city);
        }
    }
    None
}

/// Trim trailing punctuation and drop filler words; `None` when nothing
/// city-like remains.
fn clean_city(capture: &str) -> Option<String> {
    let cleaned: Vec<&str> = capture
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .split_whitespace()
        .filter(|w| !CITY_FILLERS.contains(w))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Some(cleaned.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn extractor() -> SlotExtractor {
        SlotExtractor::new(FixedOffset::east_opt(5 * 3600 + 1800).unwrap())
    }

    fn noon() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2026, 8, 27, 12, 0, 0)
            .unwrap()
    }

    #[test]
    fn city_from_preposition() {
        let v = extractor().extract(SlotKind::City, "weather in Jaipur").unwrap();
        assert_eq!(v.as_text(), Some("jaipur"));
    }

    #[test]
    fn city_from_possessive() {
        let v = extractor().extract(SlotKind::City, "Delhi weather").unwrap();
        assert_eq!(v.as_text(), Some("delhi"));
    }

    #[test]
    fn city_strips_fillers_and_punctuation() {
        let v = extractor()
            .extract(SlotKind::City, "what's the weather in New York today?")
            .unwrap();
        assert_eq!(v.as_text(), Some("new york"));
    }

    #[test]
    fn bare_weather_word_has_no_city() {
        assert!(extractor().extract(SlotKind::City, "weather").is_none());
        assert!(
            extractor()
                .extract(SlotKind::City, "what's the weather like")
                .is_none()
        );
    }

    #[test]
    fn recipient_prefers_email() {
        let v = extractor()
            .extract(SlotKind::Recipient, "john at gmail dot com")
            .unwrap();
        assert_eq!(v.as_text(), Some("john@gmail.com"));
    }

    #[test]
    fn recipient_falls_back_to_display_name() {
        let v = extractor().extract(SlotKind::Recipient, "John Smith").unwrap();
        assert_eq!(v.as_text(), Some("John Smith"));
        assert!(
            extractor()
                .extract(SlotKind::Recipient, "call 555 0199 now please yes")
                .is_none()
        );
    }

    #[test]
    fn datetime_resolves_against_session_tz() {
        let v = extractor()
            .extract_at(SlotKind::DateTime, "tomorrow at 5 pm", noon())
            .unwrap();
        assert_eq!(
            v.as_when().unwrap().to_rfc3339(),
            "2026-08-28T17:00:00+05:30"
        );
    }

    #[test]
    fn free_text_is_trimmed_verbatim() {
        let v = extractor()
            .extract(SlotKind::FreeText, "  the quarterly report  ")
            .unwrap();
        assert_eq!(v.as_text(), Some("the quarterly report"));
        assert!(extractor().extract(SlotKind::FreeText, "   ").is_none());
    }
}
