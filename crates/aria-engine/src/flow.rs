//! Multi-turn slot-filling flows.
//!
//! A [`FlowState`] is a small synchronous state machine: it consumes one
//! user reply at a time and tells the caller what to do next (speak a
//! prompt, run the action, or give up).  All provider I/O lives in the
//! dispatch layer; this module never awaits anything.

use std::collections::HashMap;

use tracing::debug;

use aria_nlu::{SlotExtractor, SlotKind, SlotValue};

use crate::intent::Intent;

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

/// What to do when a reply fails to produce a value for the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissPolicy {
    /// Re-ask, up to the retry cap.
    Reprompt,
    /// Store a fixed fallback and move on.
    Default(&'static str),
    /// Move on without storing anything.
    Skip,
}

#[derive(Debug, Clone, Copy)]
pub struct SlotSpec {
    pub name: &'static str,
    pub kind: SlotKind,
    pub prompt: &'static str,
    pub reprompt: &'static str,
    pub on_miss: MissPolicy,
    /// Read the extracted value back and require a yes before storing it.
    /// Used for values that are error-prone over voice, like addresses.
    pub confirm_value: bool,
}

const fn slot(name: &'static str, kind: SlotKind, prompt: &'static str) -> SlotSpec {
    SlotSpec {
        name,
        kind,
        prompt,
        reprompt: prompt,
        on_miss: MissPolicy::Reprompt,
        confirm_value: false,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FlowSchema {
    pub intent: Intent,
    pub slots: &'static [SlotSpec],
}

impl FlowSchema {
    /// Whether a final yes/no gate runs before execution.  Derived from
    /// the intent: off for read-only lookups, mandatory for anything
    /// that mutates.
    pub fn requires_gate(&self) -> bool {
        self.intent.is_side_effecting()
    }
}

const EMAIL: FlowSchema = FlowSchema {
    intent: Intent::Email,
    slots: &[
        SlotSpec {
            name: "recipient",
            kind: SlotKind::Recipient,
            prompt: "Whom should I write the email to? You can say the address like 'john at gmail dot com'.",
            reprompt: "I didn't catch a valid recipient. Please say the address again, like 'john at gmail dot com'.",
            on_miss: MissPolicy::Reprompt,
            confirm_value: true,
        },
        slot("purpose", SlotKind::FreeText, "What should the email be about?"),
    ],
};

const CALENDAR: FlowSchema = FlowSchema {
    intent: Intent::Calendar,
    slots: &[
        slot("title", SlotKind::FreeText, "What's the event title?"),
        SlotSpec {
            name: "start",
            kind: SlotKind::DateTime,
            prompt: "When should it start?",
            reprompt: "I couldn't understand that time. You can say 'tomorrow at 10 pm' or 'in 2 hours'.",
            on_miss: MissPolicy::Reprompt,
            confirm_value: false,
        },
        SlotSpec {
            name: "end",
            kind: SlotKind::DateTime,
            prompt: "And when should it end?",
            reprompt: "I couldn't understand that time. You can say 'tomorrow at 11 pm' or 'in 3 hours'.",
            on_miss: MissPolicy::Reprompt,
            confirm_value: false,
        },
    ],
};

const MEET_SCHEDULED: FlowSchema = FlowSchema {
    intent: Intent::MeetScheduled,
    slots: &[
        slot("title", SlotKind::FreeText, "What should the meeting be called?"),
        SlotSpec {
            name: "start",
            kind: SlotKind::DateTime,
            prompt: "When should the meeting start?",
            reprompt: "I couldn't understand that time. You can say 'tomorrow at 10 pm' or an exact date and time.",
            on_miss: MissPolicy::Reprompt,
            confirm_value: false,
        },
        SlotSpec {
            name: "end",
            kind: SlotKind::DateTime,
            prompt: "And when should it end?",
            reprompt: "I couldn't understand that time. Please say it again.",
            on_miss: MissPolicy::Reprompt,
            confirm_value: false,
        },
    ],
};

const MEET_INSTANT: FlowSchema = FlowSchema {
    intent: Intent::MeetInstant,
    slots: &[],
};

const TELEGRAM_SEND: FlowSchema = FlowSchema {
    intent: Intent::TelegramSend,
    slots: &[slot(
        "message",
        SlotKind::FreeText,
        "What message should I send?",
    )],
};

const WEATHER: FlowSchema = FlowSchema {
    intent: Intent::Weather,
    // Only reached when automatic location resolution failed.
    slots: &[slot(
        "city",
        SlotKind::FreeText,
        "I couldn't detect your location automatically. Which city should I check? You can also say 'my location' to retry detection.",
    )],
};

const SET_LOCATION: FlowSchema = FlowSchema {
    intent: Intent::SetLocation,
    slots: &[slot(
        "city",
        SlotKind::FreeText,
        "What city should I set as your location?",
    )],
};

const FLIGHTS: FlowSchema = FlowSchema {
    intent: Intent::Flights,
    slots: &[
        slot("origin", SlotKind::FreeText, "Where are you flying from?"),
        slot("destination", SlotKind::FreeText, "Where are you flying to?"),
        SlotSpec {
            name: "date",
            kind: SlotKind::DateTime,
            prompt: "What date are you travelling? Say a date, 'tomorrow', or 'skip' for today.",
            reprompt: "",
            on_miss: MissPolicy::Skip,
            confirm_value: false,
        },
    ],
};

const NEWS: FlowSchema = FlowSchema {
    intent: Intent::News,
    slots: &[SlotSpec {
        name: "topic",
        kind: SlotKind::FreeText,
        prompt: "What topic would you like news about?",
        reprompt: "",
        on_miss: MissPolicy::Default("technology"),
        confirm_value: false,
    }],
};

const STOCKS: FlowSchema = FlowSchema {
    intent: Intent::Stocks,
    slots: &[slot(
        "symbol",
        SlotKind::FreeText,
        "Which stock would you like to check?",
    )],
};

const SPOTIFY: FlowSchema = FlowSchema {
    intent: Intent::Spotify,
    slots: &[slot(
        "query",
        SlotKind::FreeText,
        "What would you like to listen to?",
    )],
};

/// Look up the slot schema for a flow-bearing intent.  `None` means the
/// intent is answered in a single turn and never opens a flow.
pub fn schema_for(intent: Intent) -> Option<&'static FlowSchema> {
    match intent {
        Intent::Email => Some(&EMAIL),
        Intent::Calendar => Some(&CALENDAR),
        Intent::MeetScheduled => Some(&MEET_SCHEDULED),
        Intent::MeetInstant => Some(&MEET_INSTANT),
        Intent::TelegramSend => Some(&TELEGRAM_SEND),
        Intent::Weather => Some(&WEATHER),
        Intent::SetLocation => Some(&SET_LOCATION),
        Intent::Flights => Some(&FLIGHTS),
        Intent::News => Some(&NEWS),
        Intent::Stocks => Some(&STOCKS),
        Intent::Spotify => Some(&SPOTIFY),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// What the caller should do after feeding a reply to the flow.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowStep {
    /// Speak this and wait for the next reply.
    Prompt(String),
    /// All slots are filled and (if gated) confirmed; run the action and
    /// clear the flow.
    Execute,
    /// The user declined at the final gate.  The dispatcher decides what a
    /// decline means for this intent (for email it becomes a saved draft).
    Decline,
    /// The flow gave up; speak this and clear.
    Abort(String),
}

const AFFIRMATIVE: &[&str] = &[
    "yes", "yeah", "yep", "yup", "sure", "correct", "right", "ok", "okay", "confirm", "go ahead",
    "do it", "send it", "sounds good",
];
const NEGATIVE: &[&str] = &["no", "nope", "cancel", "don't", "do not", "wrong", "not yet"];

fn contains_any(reply: &str, set: &[&str]) -> bool {
    let tokens: Vec<&str> = reply
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
        .collect();
    set.iter()
        .any(|p| if p.contains(' ') { reply.contains(p) } else { tokens.contains(p) })
}

fn is_affirmative(reply: &str) -> bool {
    contains_any(reply, AFFIRMATIVE)
}

fn is_negative(reply: &str) -> bool {
    contains_any(reply, NEGATIVE)
}

/// One in-progress multi-turn flow.
#[derive(Debug, Clone)]
pub struct FlowState {
    schema: &'static FlowSchema,
    slots: HashMap<&'static str, SlotValue>,
    /// Index into `schema.slots` of the slot currently being asked for.
    pending: usize,
    /// Waiting on the final yes/no before execution.
    awaiting_confirmation: bool,
    /// Waiting on a yes/no for `candidate` before storing it.
    confirming_value: bool,
    candidate: Option<SlotValue>,
    retries: u8,
    max_retries: u8,
}

impl FlowState {
    /// Open a flow.  Returns the state plus the first line to speak.
    pub fn start(intent: Intent, max_retries: u8) -> Option<(FlowState, String)> {
        let schema = schema_for(intent)?;
        let mut state = FlowState {
            schema,
            slots: HashMap::new(),
            pending: 0,
            awaiting_confirmation: false,
            confirming_value: false,
            candidate: None,
            retries: 0,
            max_retries,
        };
        let opening = if schema.slots.is_empty() {
            // Zero-slot flows go straight to the gate.
            state.awaiting_confirmation = true;
            state.confirmation_prompt()
        } else {
            schema.slots[0].prompt.to_string()
        };
        Some((state, opening))
    }

    pub fn intent(&self) -> Intent {
        self.schema.intent
    }

    /// Filled slot values, by schema name.
    pub fn slots(&self) -> &HashMap<&'static str, SlotValue> {
        &self.slots
    }

    pub fn value(&self, name: &str) -> Option<&SlotValue> {
        self.slots.get(name)
    }

    /// Feed one normalized user reply into the flow.
    pub fn resume(&mut self, reply: &str, extractor: &SlotExtractor) -> FlowStep {
        if self.awaiting_confirmation {
            return self.resume_confirmation(reply);
        }
        if self.confirming_value {
            return self.resume_value_confirmation(reply);
        }
        self.resume_slot(reply, extractor)
    }

    fn resume_confirmation(&mut self, reply: &str) -> FlowStep {
        // Negatives first, so "no, that's right out" never executes.
        if is_negative(reply) {
            debug!(intent = %self.schema.intent, "flow declined");
            return FlowStep::Decline;
        }
        if is_affirmative(reply) {
            debug!(intent = %self.schema.intent, "flow confirmed");
            return FlowStep::Execute;
        }
        self.retries += 1;
        if self.retries >= self.max_retries {
            return FlowStep::Abort(
                "I'll leave it for now. Ask me again whenever you're ready.".to_string(),
            );
        }
        FlowStep::Prompt(format!("Please say yes or no. {}", self.confirmation_prompt()))
    }

    fn resume_value_confirmation(&mut self, reply: &str) -> FlowStep {
        if is_negative(reply) {
            // Re-collect the same slot.
            self.confirming_value = false;
            self.candidate = None;
            return FlowStep::Prompt(self.schema.slots[self.pending].reprompt.to_string());
        }
        // Anything that is not an explicit no counts as assent; voice
        // replies here are frequently just the value repeated.
        self.confirming_value = false;
        let value = self.candidate.take().unwrap_or(SlotValue::Text(String::new()));
        self.commit(value)
    }

    fn resume_slot(&mut self, reply: &str, extractor: &SlotExtractor) -> FlowStep {
        let spec = &self.schema.slots[self.pending];
        match extractor.extract(spec.kind, reply) {
            Some(value) => {
                // Read back only when the reply was reinterpreted (spoken
                // address forms); a verbatim value needs no confirmation.
                let reinterpreted = value.as_text() != Some(reply);
                if spec.confirm_value && reinterpreted {
                    let readback = format!("I heard {value}. Is that correct?");
                    self.candidate = Some(value);
                    self.confirming_value = true;
                    FlowStep::Prompt(readback)
                } else {
                    self.commit(value)
                }
            }
            None => match spec.on_miss {
                MissPolicy::Default(fallback) => self.commit(SlotValue::Text(fallback.to_string())),
                MissPolicy::Skip => self.advance(),
                MissPolicy::Reprompt => {
                    self.retries += 1;
                    if self.retries >= self.max_retries {
                        debug!(intent = %self.schema.intent, slot = spec.name, "retry cap hit");
                        FlowStep::Abort(
                            "I'm having trouble getting that. Let's try again later.".to_string(),
                        )
                    } else if spec.kind == SlotKind::Recipient && !reply.is_empty() {
                        // Echo what was heard so the user can tell what went
                        // wrong with the transcription.
                        FlowStep::Prompt(format!("I heard '{reply}'. {}", spec.reprompt))
                    } else {
                        FlowStep::Prompt(spec.reprompt.to_string())
                    }
                }
            },
        }
    }

    fn commit(&mut self, value: SlotValue) -> FlowStep {
        let spec = &self.schema.slots[self.pending];
        debug!(intent = %self.schema.intent, slot = spec.name, value = %value, "slot filled");
        self.slots.insert(spec.name, value);
        self.advance()
    }

    fn advance(&mut self) -> FlowStep {
        self.retries = 0;
        self.pending += 1;
        if self.pending < self.schema.slots.len() {
            return FlowStep::Prompt(self.schema.slots[self.pending].prompt.to_string());
        }
        if self.schema.requires_gate() {
            self.awaiting_confirmation = true;
            FlowStep::Prompt(self.confirmation_prompt())
        } else {
            FlowStep::Execute
        }
    }

    fn text(&self, name: &str) -> &str {
        self.slots
            .get(name)
            .and_then(SlotValue::as_text)
            .unwrap_or("")
    }

    fn when(&self, name: &str) -> String {
        self.slots
            .get(name)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    fn confirmation_prompt(&self) -> String {
        match self.schema.intent {
            Intent::Email => format!(
                "I'll write to {} about {}. Should I send it?",
                self.text("recipient"),
                self.text("purpose")
            ),
            Intent::Calendar => format!(
                "I'll add '{}' from {} to {}. Shall I go ahead?",
                self.text("title"),
                self.when("start"),
                self.when("end")
            ),
            Intent::MeetScheduled => format!(
                "I'll schedule '{}' from {} to {}. Shall I go ahead?",
                self.text("title"),
                self.when("start"),
                self.when("end")
            ),
            Intent::MeetInstant => "I'll create an instant meeting now. Shall I go ahead?".to_string(),
            Intent::TelegramSend => format!(
                "I'll send this on Telegram: \"{}\". Shall I go ahead?",
                self.text("message")
            ),
            _ => {
                let mut parts: Vec<String> = self
                    .schema
                    .slots
                    .iter()
                    .filter_map(|s| self.slots.get(s.name).map(|v| format!("{}: {v}", s.name)))
                    .collect();
                parts.push("Shall I go ahead?".to_string());
                parts.join(". ")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn extractor() -> SlotExtractor {
        SlotExtractor::new(FixedOffset::east_opt(330 * 60).unwrap())
    }

    fn start(intent: Intent) -> (FlowState, String) {
        FlowState::start(intent, 3).expect("flow intent")
    }

    #[test]
    fn email_happy_path_reaches_the_gate() {
        let ex = extractor();
        let (mut flow, opening) = start(Intent::Email);
        assert!(opening.contains("Whom should I write"));

        // Spoken address is normalized and read back first.
        let step = flow.resume("john at gmail dot com", &ex);
        let FlowStep::Prompt(p) = step else { panic!("expected read-back") };
        assert!(p.contains("john@gmail.com"));

        // Assent stores it and moves to the next slot.
        let FlowStep::Prompt(p) = flow.resume("yes", &ex) else { panic!() };
        assert!(p.contains("about"));

        let FlowStep::Prompt(gate) = flow.resume("the quarterly report", &ex) else { panic!() };
        assert!(gate.contains("john@gmail.com"));
        assert!(gate.contains("Should I send it?"));

        assert_eq!(flow.resume("yes, send it", &ex), FlowStep::Execute);
    }

    #[test]
    fn literal_address_skips_the_readback() {
        let ex = extractor();
        let (mut flow, _) = start(Intent::Email);
        // A verbatim address goes straight to the next slot.
        let FlowStep::Prompt(p) = flow.resume("sam@example.com", &ex) else { panic!() };
        assert!(p.contains("about"));
        assert_eq!(flow.value("recipient").and_then(SlotValue::as_text), Some("sam@example.com"));
    }

    #[test]
    fn email_decline_at_gate() {
        let ex = extractor();
        let (mut flow, _) = start(Intent::Email);
        flow.resume("sam@example.com", &ex);
        flow.resume("lunch on friday", &ex);
        assert_eq!(flow.resume("no", &ex), FlowStep::Decline);
    }

    #[test]
    fn recipient_readback_rejection_reasks() {
        let ex = extractor();
        let (mut flow, _) = start(Intent::Email);
        flow.resume("john at gmail dot com", &ex);
        let FlowStep::Prompt(p) = flow.resume("no that's wrong", &ex) else { panic!() };
        assert!(p.contains("say the address again"));
        // The slot is still unfilled.
        assert!(flow.value("recipient").is_none());
    }

    #[test]
    fn retry_cap_aborts() {
        let ex = extractor();
        let (mut flow, _) = start(Intent::Email);
        assert!(matches!(flow.resume("", &ex), FlowStep::Prompt(_)));
        assert!(matches!(flow.resume("", &ex), FlowStep::Prompt(_)));
        assert!(matches!(flow.resume("", &ex), FlowStep::Abort(_)));
    }

    #[test]
    fn zero_slot_flow_opens_at_the_gate() {
        let ex = extractor();
        let (mut flow, opening) = start(Intent::MeetInstant);
        assert!(opening.contains("instant meeting"));
        assert_eq!(flow.resume("sure", &ex), FlowStep::Execute);
    }

    #[test]
    fn gate_runs_exactly_for_mutating_flows() {
        let ex = extractor();
        // One-slot mutating flow: last slot leads to the gate.
        let (mut send, _) = start(Intent::TelegramSend);
        let FlowStep::Prompt(gate) = send.resume("on my way", &ex) else { panic!() };
        assert!(gate.contains("Shall I go ahead?"));

        // One-slot non-mutating flow: last slot executes directly.
        let (mut set_loc, _) = start(Intent::SetLocation);
        assert_eq!(set_loc.resume("jaipur", &ex), FlowStep::Execute);
    }

    #[test]
    fn read_only_flow_skips_the_gate() {
        let ex = extractor();
        let (mut flow, opening) = start(Intent::Stocks);
        assert!(opening.contains("Which stock"));
        assert_eq!(flow.resume("apple", &ex), FlowStep::Execute);
        assert_eq!(flow.value("symbol").and_then(SlotValue::as_text), Some("apple"));
    }

    #[test]
    fn news_topic_defaults_on_empty_reply() {
        let ex = extractor();
        let (mut flow, _) = start(Intent::News);
        assert_eq!(flow.resume("", &ex), FlowStep::Execute);
        assert_eq!(flow.value("topic").and_then(SlotValue::as_text), Some("technology"));
    }

    #[test]
    fn flight_date_is_skippable() {
        let ex = extractor();
        let (mut flow, _) = start(Intent::Flights);
        flow.resume("jaipur", &ex);
        flow.resume("mumbai", &ex);
        // "skip" parses as no datetime, and the policy says move on.
        assert_eq!(flow.resume("skip", &ex), FlowStep::Execute);
        assert!(flow.value("date").is_none());
    }

    #[test]
    fn unclear_gate_reply_reprompts_then_gives_up() {
        let ex = extractor();
        let (mut flow, _) = start(Intent::MeetInstant);
        assert!(matches!(flow.resume("hmm what", &ex), FlowStep::Prompt(_)));
        assert!(matches!(flow.resume("ehh", &ex), FlowStep::Prompt(_)));
        assert!(matches!(flow.resume("banana", &ex), FlowStep::Abort(_)));
    }
}
