//! Session lifecycle and the engine front door.
//!
//! One [`Session`] per user id, created lazily.  A session is either
//! sleeping (only wake words get a response) or awake (utterances are
//! classified and routed).  "In a flow" is simply awake with an active
//! [`FlowState`].  Sessions are keyed in a concurrent map, and each one is
//! guarded by its own async mutex, so two utterances from the same user
//! are processed in arrival order while different users never contend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use aria_location::{LocationResolver, Resolution};
use aria_nlu::{SlotExtractor, SlotKind, SlotValue, Utterance};

use crate::classifier::classify;
use crate::config::EngineConfig;
use crate::dispatch::{Collaborators, Dispatcher};
use crate::flow::{FlowState, FlowStep};
use crate::intent::Intent;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// What the caller should do with the engine's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Speak the lines and keep listening.
    Continue,
    /// Say nothing; keep listening.
    Silent,
    /// Speak the lines, then the host should terminate.
    Shutdown,
}

/// The engine's reply to one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub lines: Vec<String>,
    pub disposition: Disposition,
}

impl Response {
    fn speak(lines: Vec<String>) -> Self {
        Self {
            lines,
            disposition: Disposition::Continue,
        }
    }

    fn say(line: impl Into<String>) -> Self {
        Self::speak(vec![line.into()])
    }

    fn silent() -> Self {
        Self {
            lines: Vec::new(),
            disposition: Disposition::Silent,
        }
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Sleeping,
    Awake,
}

struct Session {
    state: SessionState,
    flow: Option<FlowState>,
    last_activity: Instant,
    silent_turns: u32,
    greeted_once: bool,
}

impl Session {
    fn new(now: Instant) -> Self {
        Self {
            state: SessionState::Sleeping,
            flow: None,
            last_activity: now,
            silent_turns: 0,
            greeted_once: false,
        }
    }

    fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The dialog engine.  Cheap to share behind an `Arc`; `handle` takes
/// `&self`.
pub struct Engine {
    config: EngineConfig,
    tz: FixedOffset,
    extractor: SlotExtractor,
    wake: AhoCorasick,
    dispatcher: Dispatcher,
    sessions: DashMap<String, Arc<Mutex<Session>>>,
}

impl Engine {
    pub fn new(config: EngineConfig, providers: Collaborators, resolver: LocationResolver) -> Self {
        let tz = config.timezone();
        let wake = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(&config.wake_words)
            .expect("wake word automaton");
        let dispatcher = Dispatcher::new(providers, resolver, tz, config.messaging_channel.clone());
        Self {
            config,
            tz,
            extractor: SlotExtractor::new(tz),
            wake,
            dispatcher,
            sessions: DashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process one utterance for one user.
    pub async fn handle(&self, user_id: &str, text: &str) -> Response {
        self.handle_at(user_id, text, Instant::now()).await
    }

    /// Deterministic variant with an injected "now", used by the idle
    /// timeout path and by tests.
    pub async fn handle_at(&self, user_id: &str, text: &str, now: Instant) -> Response {
        let utterance = Utterance::new(text);
        let cell = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(now))))
            .clone();
        let mut session = cell.lock().await;

        // Lazy idle timeout: an awake session with nothing in flight goes
        // back to sleep quietly once the window has passed.
        if session.state == SessionState::Awake
            && session.flow.is_none()
            && now.duration_since(session.last_activity)
                >= Duration::from_secs(self.config.idle_timeout_secs)
        {
            debug!(user_id, "session idled back to sleep");
            session.state = SessionState::Sleeping;
        }

        if session.state == SessionState::Sleeping {
            return self.handle_sleeping(user_id, &mut session, &utterance, now);
        }

        session.touch(now);

        if utterance.is_empty() {
            session.silent_turns += 1;
            if session.silent_turns >= self.config.max_silent_turns {
                debug!(user_id, "too many silent turns, sleeping");
                session.state = SessionState::Sleeping;
                session.flow = None;
                session.silent_turns = 0;
                return Response::say("It's gone quiet, so I'll rest. Call my name when you need me.");
            }
            return Response::silent();
        }
        session.silent_turns = 0;

        let text = utterance.normalized_text.clone();

        let intent = classify(&text);

        // Session control outranks everything, including an active flow: a
        // goodbye mid-flow drops the flow without executing anything.
        match intent {
            Intent::Exit => {
                info!(user_id, "exit requested");
                session.flow = None;
                session.state = SessionState::Sleeping;
                return Response {
                    lines: vec!["Goodbye! Shutting down now.".to_string()],
                    disposition: Disposition::Shutdown,
                };
            }
            Intent::Sleep => {
                if session.flow.take().is_some() {
                    debug!(user_id, "flow dropped by dismissal");
                }
                session.state = SessionState::Sleeping;
                return Response::say("Okay, I'll go quiet now. Say my name when you need me.");
            }
            _ => {}
        }

        if let Some(mut flow) = session.flow.take() {
            return match flow.resume(&text, &self.extractor) {
                FlowStep::Prompt(line) => {
                    session.flow = Some(flow);
                    Response::say(line)
                }
                FlowStep::Execute => {
                    Response::speak(self.dispatcher.finish_flow(user_id, &flow).await)
                }
                FlowStep::Decline => Response::speak(self.dispatcher.decline_flow(&flow).await),
                FlowStep::Abort(line) => Response::say(line),
            };
        }

        self.handle_intent(user_id, &mut session, &text, intent).await
    }

    fn handle_sleeping(
        &self,
        user_id: &str,
        session: &mut Session,
        utterance: &Utterance,
        now: Instant,
    ) -> Response {
        if utterance.is_empty() || !self.wake.is_match(&utterance.normalized_text) {
            return Response::silent();
        }
        info!(user_id, "session woken");
        session.state = SessionState::Awake;
        session.silent_turns = 0;
        session.touch(now);
        let line = if session.greeted_once {
            "Hey, welcome back! What can I do for you this time?".to_string()
        } else {
            session.greeted_once = true;
            greeting(Utc::now().with_timezone(&self.tz))
        };
        Response::say(line)
    }

    async fn handle_intent(
        &self,
        user_id: &str,
        session: &mut Session,
        text: &str,
        intent: Intent,
    ) -> Response {
        debug!(user_id, %intent, "utterance classified");

        match intent {
            Intent::Weather => self.handle_weather(user_id, session, text).await,
            Intent::SetLocation => {
                if let Some(city) = inline_location(text) {
                    Response::speak(self.dispatcher.set_user_location(user_id, &city).await)
                } else {
                    self.open_flow(session, intent)
                }
            }
            Intent::Email
            | Intent::Calendar
            | Intent::MeetScheduled
            | Intent::MeetInstant
            | Intent::TelegramSend
            | Intent::Flights
            | Intent::News
            | Intent::Stocks
            | Intent::Spotify => self.open_flow(session, intent),
            direct => Response::speak(self.dispatcher.answer_direct(user_id, direct, text).await),
        }
    }

    /// Weather is a degenerate flow: a city in the trigger answers
    /// immediately, otherwise the resolution chain runs, and only when
    /// that comes up empty does a one-slot flow open to ask for a city.
    async fn handle_weather(&self, user_id: &str, session: &mut Session, text: &str) -> Response {
        if let Some(SlotValue::Text(city)) = self.extractor.extract(SlotKind::City, text) {
            return Response::speak(self.dispatcher.weather_for_city(&city).await);
        }
        match self.dispatcher.resolver().resolve(user_id, None).await {
            Ok(Resolution::Located(loc)) => {
                Response::speak(self.dispatcher.weather_for_city(&loc.city).await)
            }
            Ok(Resolution::NeedsPrompt) => self.open_flow(session, Intent::Weather),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "location store unavailable");
                Response::say(crate::dispatch::store_trouble())
            }
        }
    }

    fn open_flow(&self, session: &mut Session, intent: Intent) -> Response {
        match FlowState::start(intent, self.config.max_slot_retries) {
            Some((flow, opening)) => {
                debug!(%intent, "flow opened");
                session.flow = Some(flow);
                Response::say(opening)
            }
            None => Response::say("I'm not sure I caught that. Could you say it another way?"),
        }
    }
}

/// First-wake greeting, keyed to the local hour.
fn greeting(now: DateTime<FixedOffset>) -> String {
    let part = match now.hour() {
        5..=11 => "Good morning",
        12..=16 => "Good afternoon",
        _ => "Good evening",
    };
    format!("{part}! What can I take care of for you today?")
}

static INLINE_LOCATION: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
    regex::Regex::new(r"(?:set|change)\s+(?:my\s+)?location\s+(?:to|as)\s+(.+)")
        .expect("inline location regex")
});

/// "set my location to delhi" carries the city inline; pull it out so the
/// one-slot flow is skipped.
fn inline_location(text: &str) -> Option<String> {
    let caps = INLINE_LOCATION.captures(text)?;
    let city = caps[1].trim().trim_matches(|c: char| c.is_ascii_punctuation());
    if city.is_empty() {
        None
    } else {
        Some(city.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn greeting_tracks_the_hour() {
        let tz = FixedOffset::east_opt(330 * 60).unwrap();
        let at = |h| tz.with_ymd_and_hms(2026, 8, 27, h, 0, 0).unwrap();
        assert!(greeting(at(6)).starts_with("Good morning"));
        assert!(greeting(at(13)).starts_with("Good afternoon"));
        assert!(greeting(at(21)).starts_with("Good evening"));
        assert!(greeting(at(2)).starts_with("Good evening"));
    }

    #[test]
    fn inline_location_extraction() {
        assert_eq!(inline_location("set my location to delhi"), Some("delhi".into()));
        assert_eq!(
            inline_location("change location to new york."),
            Some("new york".into())
        );
        assert_eq!(inline_location("set my location"), None);
    }
}
