//! Deterministic, rule-ordered intent classification.
//!
//! Classification is a first-match walk over [`RULES`].  The table order is
//! part of the contract: session-control phrases outrank action triggers,
//! action triggers outrank the broad question catch-all, and the catch-all
//! outranks `Unknown`.  Reordering rules changes routing behaviour.

use crate::intent::Intent;

/// How a rule inspects the (already normalized) utterance.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Any of the phrases appears as a substring.
    AnyPhrase(&'static [&'static str]),
    /// Every phrase appears as a substring.
    AllPhrases(&'static [&'static str]),
    /// Any of the words appears as a whole token (punctuation-trimmed).
    AnyWord(&'static [&'static str]),
    /// The whole utterance equals one of the phrases.
    Exact(&'static [&'static str]),
    /// A word from `verbs` and a word from `nouns` both appear as tokens.
    Cooccur {
        verbs: &'static [&'static str],
        nouns: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub matcher: Matcher,
    pub intent: Intent,
}

const fn rule(matcher: Matcher, intent: Intent) -> Rule {
    Rule { matcher, intent }
}

/// The classification table, highest precedence first.
pub const RULES: &[Rule] = &[
    // Session control dominates everything, including active flows.
    rule(Matcher::AnyWord(&["exit"]), Intent::Exit),
    rule(
        Matcher::AnyPhrase(&[
            "thank you",
            "sleep mode",
            "go to sleep",
            "sleep now",
            "good night",
            "take rest",
        ]),
        Intent::Sleep,
    ),
    rule(
        Matcher::AnyWord(&["thanks", "bye", "goodbye", "stop"]),
        Intent::Sleep,
    ),
    // A bare "sleep" only counts when it is the entire utterance, so that
    // "I couldn't sleep last night" stays a conversational remark.
    rule(Matcher::Exact(&["sleep", "sleep please"]), Intent::Sleep),
    // Email requires a composition verb; a bare mention of the noun is not
    // a request to write one.
    rule(
        Matcher::Cooccur {
            verbs: &["write", "draft", "compose", "send"],
            nouns: &["email", "mail"],
        },
        Intent::Email,
    ),
    rule(
        Matcher::AllPhrases(&["schedule", "meet"]),
        Intent::MeetScheduled,
    ),
    rule(Matcher::AllPhrases(&["start", "meet"]), Intent::MeetInstant),
    rule(
        Matcher::AnyWord(&["calendar", "event", "reminder"]),
        Intent::Calendar,
    ),
    rule(
        Matcher::AllPhrases(&["telegram", "send"]),
        Intent::TelegramSend,
    ),
    rule(
        Matcher::AllPhrases(&["telegram", "read"]),
        Intent::TelegramRead,
    ),
    rule(
        Matcher::AnyWord(&["flight", "flights", "fly", "flying"]),
        Intent::Flights,
    ),
    rule(
        Matcher::AnyWord(&["weather", "temperature", "climate", "forecast"]),
        Intent::Weather,
    ),
    rule(Matcher::AnyPhrase(&["how hot", "how cold"]), Intent::Weather),
    rule(
        Matcher::AnyPhrase(&["set location", "set my location", "change my location"]),
        Intent::SetLocation,
    ),
    rule(
        Matcher::AnyPhrase(&[
            "where am i",
            "what is my location",
            "what's my location",
            "my current location",
            "current location",
        ]),
        Intent::GetLocation,
    ),
    rule(Matcher::AnyWord(&["news", "headlines"]), Intent::News),
    rule(
        Matcher::AnyWord(&["stock", "stocks", "market"]),
        Intent::Stocks,
    ),
    rule(Matcher::AnyPhrase(&["share price"]), Intent::Stocks),
    rule(Matcher::AnyWord(&["spotify"]), Intent::Spotify),
    rule(
        Matcher::AnyPhrase(&[
            "play music",
            "play some music",
            "play a song",
            "play song",
            "play something",
        ]),
        Intent::Spotify,
    ),
    rule(Matcher::AnyWord(&["joke", "jokes"]), Intent::Joke),
    rule(Matcher::AnyWord(&["time"]), Intent::AskTime),
    rule(
        Matcher::AnyWord(&["hello", "hi", "hey", "namaste"]),
        Intent::SmallTalk,
    ),
    rule(
        Matcher::AnyPhrase(&["good morning", "good afternoon", "good evening", "how are you"]),
        Intent::SmallTalk,
    ),
    // Broad question catch-all; must stay below every action trigger.
    rule(
        Matcher::AnyWord(&[
            "what",
            "who",
            "when",
            "where",
            "why",
            "how",
            "which",
            "information",
            "info",
            "details",
        ]),
        Intent::Question,
    ),
    rule(
        Matcher::AnyPhrase(&["tell me", "explain", "describe", "can you", "could you"]),
        Intent::Question,
    ),
];

/// Classify a normalized utterance.  Always returns a tag; the fallback is
/// [`Intent::Unknown`].
pub fn classify(text: &str) -> Intent {
    let tokens: Vec<&str> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|w| !w.is_empty())
        .collect();

    for rule in RULES {
        if matches(&rule.matcher, text, &tokens) {
            return rule.intent;
        }
    }
    Intent::Unknown
}

fn matches(matcher: &Matcher, text: &str, tokens: &[&str]) -> bool {
    match matcher {
        Matcher::AnyPhrase(phrases) => phrases.iter().any(|p| text.contains(p)),
        Matcher::AllPhrases(phrases) => phrases.iter().all(|p| text.contains(p)),
        Matcher::AnyWord(words) => tokens.iter().any(|t| words.contains(t)),
        Matcher::Exact(phrases) => phrases.iter().any(|p| *p == text),
        Matcher::Cooccur { verbs, nouns } => {
            tokens.iter().any(|t| verbs.contains(t)) && tokens.iter().any(|t| nouns.contains(t))
        }
    }
}
