//! The fixed intent set.

use serde::{Deserialize, Serialize};

/// The classified purpose of one utterance.
///
/// Exactly one tag per utterance; there is no ranking or scoring.  The
/// classifier assigns the first matching rule's tag (see
/// [`crate::classifier`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SmallTalk,
    AskTime,
    Joke,
    Question,
    Email,
    MeetInstant,
    MeetScheduled,
    Calendar,
    TelegramSend,
    TelegramRead,
    Weather,
    SetLocation,
    GetLocation,
    Flights,
    News,
    Stocks,
    Spotify,
    Sleep,
    Exit,
    Unknown,
}

impl Intent {
    /// True for intents whose external operation mutates something and
    /// therefore must pass the confirmation gate.
    pub fn is_side_effecting(self) -> bool {
        matches!(
            self,
            Self::Email
                | Self::MeetInstant
                | Self::MeetScheduled
                | Self::Calendar
                | Self::TelegramSend
        )
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SmallTalk => "small_talk",
            Self::AskTime => "ask_time",
            Self::Joke => "joke",
            Self::Question => "question",
            Self::Email => "email",
            Self::MeetInstant => "meet_instant",
            Self::MeetScheduled => "meet_scheduled",
            Self::Calendar => "calendar",
            Self::TelegramSend => "telegram_send",
            Self::TelegramRead => "telegram_read",
            Self::Weather => "weather",
            Self::SetLocation => "set_location",
            Self::GetLocation => "get_location",
            Self::Flights => "flights",
            Self::News => "news",
            Self::Stocks => "stocks",
            Self::Spotify => "spotify",
            Self::Sleep => "sleep",
            Self::Exit => "exit",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The flow gate is derived from this predicate; changing the set
    // changes which flows confirm before acting.
    #[test]
    fn mutating_intents_are_flagged() {
        for intent in [
            Intent::Email,
            Intent::Calendar,
            Intent::MeetScheduled,
            Intent::MeetInstant,
            Intent::TelegramSend,
        ] {
            assert!(intent.is_side_effecting(), "{intent} must gate");
        }
        for intent in [
            Intent::Weather,
            Intent::Flights,
            Intent::News,
            Intent::Stocks,
            Intent::Spotify,
            Intent::SetLocation,
            Intent::TelegramRead,
        ] {
            assert!(!intent.is_side_effecting(), "{intent} must not gate");
        }
    }
}
