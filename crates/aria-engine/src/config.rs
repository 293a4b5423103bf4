//! Engine tuning knobs.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// Behavioural configuration for the dialog engine.
///
/// Every field has a default so a bare `[engine]` table (or none at all)
/// yields a working engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Phrases that wake a sleeping session.  Matched as case-insensitive
    /// substrings of the utterance.
    pub wake_words: Vec<String>,
    /// Offset from UTC, in minutes, used for greetings, spoken times and
    /// date parsing.
    pub utc_offset_minutes: i32,
    /// An awake session with no active flow goes back to sleep after this
    /// much inactivity.
    pub idle_timeout_secs: u64,
    /// How many times a slot prompt is repeated before the flow gives up.
    pub max_slot_retries: u8,
    /// How many consecutive empty utterances before the session sleeps.
    pub max_silent_turns: u32,
    /// Default messaging channel (chat id) for outgoing Telegram sends and
    /// meeting-link forwarding.  `None` disables both.
    pub messaging_channel: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wake_words: [
                "hey aria",
                "hello aria",
                "aria",
                "hey assistant",
                "hello assistant",
                "hey buddy",
                "hello buddy",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            utc_offset_minutes: 330,
            idle_timeout_secs: 300,
            max_slot_retries: 3,
            max_silent_turns: 3,
            messaging_channel: None,
        }
    }
}

impl EngineConfig {
    /// The configured offset as a chrono timezone.  Out-of-range offsets
    /// fall back to UTC rather than panicking, and the seconds conversion
    /// saturates so extreme values cannot overflow.
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = EngineConfig::default();
        assert!(cfg.wake_words.iter().any(|w| w == "aria"));
        assert_eq!(cfg.timezone().local_minus_utc(), 330 * 60);
        assert_eq!(cfg.max_slot_retries, 3);
    }

    #[test]
    fn absurd_offset_degrades_to_utc() {
        for minutes in [100_000, i32::MAX, i32::MIN] {
            let cfg = EngineConfig {
                utc_offset_minutes: minutes,
                ..EngineConfig::default()
            };
            assert_eq!(cfg.timezone().local_minus_utc(), 0, "offset {minutes}");
        }
    }

    #[test]
    fn empty_toml_table_deserializes() {
        let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.idle_timeout_secs, 300);
    }
}
