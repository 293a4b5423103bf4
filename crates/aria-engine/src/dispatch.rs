//! Turning finished flows and one-shot intents into provider calls.
//!
//! Every entry point here returns lines to speak, never an error: a
//! provider failure becomes a spoken report and the dialog goes on.  Side
//! effecting calls are made exactly once per confirmed flow; a failure is
//! reported, not retried.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{info, warn};

use aria_location::{LocationResolver, Resolution};
use aria_providers::{
    AnswerProvider, CalendarProvider, EmailDisposition, FlightsProvider, MailProvider,
    MeetingProvider, MeetingRequest, MessagingProvider, MusicProvider, NewsProvider, ProviderError,
    StocksProvider, WeatherProvider, WeatherReport,
};

use crate::flow::FlowState;
use crate::intent::Intent;

/// The full set of external collaborators the engine can call.
#[derive(Clone)]
pub struct Collaborators {
    pub mail: Arc<dyn MailProvider>,
    pub calendar: Arc<dyn CalendarProvider>,
    pub meetings: Arc<dyn MeetingProvider>,
    pub messaging: Arc<dyn MessagingProvider>,
    pub weather: Arc<dyn WeatherProvider>,
    pub answers: Arc<dyn AnswerProvider>,
    pub music: Arc<dyn MusicProvider>,
    pub flights: Arc<dyn FlightsProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub stocks: Arc<dyn StocksProvider>,
}

impl Collaborators {
    /// A bundle where every capability reports itself as unconfigured.
    /// Callers overwrite the fields they can actually serve.
    pub fn unconfigured() -> Self {
        let stub = Arc::new(aria_providers::Unconfigured);
        Self {
            mail: stub.clone(),
            calendar: stub.clone(),
            meetings: stub.clone(),
            messaging: stub.clone(),
            weather: stub.clone(),
            answers: stub.clone(),
            music: stub.clone(),
            flights: stub.clone(),
            news: stub.clone(),
            stocks: stub,
        }
    }
}

const TELEGRAM_READ_LIMIT: usize = 5;
const NEWS_LIMIT: usize = 5;
const FLIGHT_OPTIONS_SHOWN: usize = 3;

const JOKES: &[&str] = &[
    "Why do programmers prefer dark mode? Because light attracts bugs.",
    "I told my computer I needed a break, and it said 'no problem, I'll go to sleep.'",
    "Why did the developer go broke? Because they used up all their cache.",
    "There are only 10 kinds of people: those who understand binary and those who don't.",
    "Why was the JavaScript developer sad? Because they didn't know how to null their feelings.",
];

/// Executes intents against the collaborators.  Holds no conversational
/// state of its own.
pub struct Dispatcher {
    providers: Collaborators,
    resolver: LocationResolver,
    tz: FixedOffset,
    /// Default messaging channel for sends and link forwarding.
    channel: Option<String>,
}

impl Dispatcher {
    pub fn new(
        providers: Collaborators,
        resolver: LocationResolver,
        tz: FixedOffset,
        channel: Option<String>,
    ) -> Self {
        Self {
            providers,
            resolver,
            tz,
            channel,
        }
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    // -----------------------------------------------------------------------
    // Confirmed / finished flows
    // -----------------------------------------------------------------------

    /// Run the action for a flow whose slots are complete (and confirmed,
    /// where the schema requires it).
    pub async fn finish_flow(&self, user_id: &str, flow: &FlowState) -> Vec<String> {
        match flow.intent() {
            Intent::Email => self.send_email(flow).await,
            Intent::Calendar => self.create_event(flow).await,
            Intent::MeetScheduled => self.schedule_meeting(flow).await,
            Intent::MeetInstant => self.instant_meeting().await,
            Intent::TelegramSend => self.telegram_send(flow).await,
            Intent::Weather => self.weather_from_flow(user_id, flow).await,
            Intent::SetLocation => self.set_location(user_id, flow).await,
            Intent::Flights => self.search_flights(flow).await,
            Intent::News => self.fetch_news(flow).await,
            Intent::Stocks => self.fetch_quote(flow).await,
            Intent::Spotify => self.play_music(flow).await,
            other => {
                warn!(intent = %other, "finish_flow called for a non-flow intent");
                vec![cant_do_that()]
            }
        }
    }

    /// The user said no at the final gate.  For email that means keeping
    /// the work as a draft; everything else is simply dropped.
    pub async fn decline_flow(&self, flow: &FlowState) -> Vec<String> {
        match flow.intent() {
            Intent::Email => {
                let (to, subject, body) = self.drafted_email(flow);
                match self.providers.mail.save_draft(&to, &subject, &body).await {
                    Ok(receipt) => {
                        info!(disposition = ?receipt.disposition, "email kept as draft");
                        vec!["Okay, I won't send it. I've saved it as a draft instead.".to_string()]
                    }
                    Err(e) => vec![report(&e)],
                }
            }
            _ => vec!["Okay, I've cancelled that.".to_string()],
        }
    }

    fn drafted_email(&self, flow: &FlowState) -> (String, String, String) {
        let to = flow
            .value("recipient")
            .and_then(|v| v.as_text())
            .unwrap_or_default()
            .to_string();
        let purpose = flow
            .value("purpose")
            .and_then(|v| v.as_text())
            .unwrap_or_default();
        let today = Utc::now().with_timezone(&self.tz);
        let (subject, body) = compose_email(&to, purpose, today);
        (to, subject, body)
    }

    async fn send_email(&self, flow: &FlowState) -> Vec<String> {
        let (to, subject, body) = self.drafted_email(flow);
        match self.providers.mail.send_email(&to, &subject, &body).await {
            Ok(receipt) => {
                info!(to, id = ?receipt.id, "email dispatched");
                match receipt.disposition {
                    EmailDisposition::Sent => vec!["Email sent successfully!".to_string()],
                    EmailDisposition::Draft => {
                        vec!["I couldn't send it directly, so I saved it as a draft.".to_string()]
                    }
                }
            }
            Err(e) => vec![report(&e)],
        }
    }

    async fn create_event(&self, flow: &FlowState) -> Vec<String> {
        let title = flow
            .value("title")
            .and_then(|v| v.as_text())
            .unwrap_or("Untitled event")
            .to_string();
        let (Some(start), Some(end)) = (
            flow.value("start").and_then(|v| v.as_when()),
            flow.value("end").and_then(|v| v.as_when()),
        ) else {
            return vec![cant_do_that()];
        };
        match self.providers.calendar.create_event(&title, start, end).await {
            Ok(event) => {
                info!(event_id = %event.id, "calendar event created");
                let mut lines = vec![format!("Event '{title}' added to your calendar!")];
                if let Some(link) = event.link {
                    lines.push(format!("Here's the link: {link}"));
                }
                lines
            }
            Err(e) => vec![report(&e)],
        }
    }

    async fn schedule_meeting(&self, flow: &FlowState) -> Vec<String> {
        let title = flow
            .value("title")
            .and_then(|v| v.as_text())
            .unwrap_or("Meeting")
            .to_string();
        let request = MeetingRequest {
            title,
            instant: false,
            start: flow.value("start").and_then(|v| v.as_when()),
            end: flow.value("end").and_then(|v| v.as_when()),
        };
        match self.providers.meetings.create_meeting(&request).await {
            Ok(meeting) => vec![format!(
                "Your meeting is scheduled. Here's the link: {}",
                meeting.link
            )],
            Err(e) => vec![report(&e)],
        }
    }

    async fn instant_meeting(&self) -> Vec<String> {
        let request = MeetingRequest {
            title: "Instant meeting".to_string(),
            instant: true,
            start: None,
            end: None,
        };
        match self.providers.meetings.create_meeting(&request).await {
            Ok(meeting) => {
                let mut lines = vec![format!("Here's your meeting link: {}", meeting.link)];
                // Forwarding the link is best-effort; a failure here must not
                // spoil an otherwise successful meeting.
                if let Some(channel) = &self.channel {
                    match self
                        .providers
                        .messaging
                        .send_message(channel, &format!("Instant meeting link: {}", meeting.link))
                        .await
                    {
                        Ok(()) => lines.push("I've also sent the link to your Telegram.".to_string()),
                        Err(e) => warn!(error = %e, "meeting link forwarding failed"),
                    }
                }
                lines
            }
            Err(e) => vec![report(&e)],
        }
    }

    async fn telegram_send(&self, flow: &FlowState) -> Vec<String> {
        let Some(channel) = &self.channel else {
            return vec![missing_channel()];
        };
        let message = flow
            .value("message")
            .and_then(|v| v.as_text())
            .unwrap_or_default();
        match self.providers.messaging.send_message(channel, message).await {
            Ok(()) => vec!["Message sent on Telegram successfully!".to_string()],
            Err(e) => vec![report(&e)],
        }
    }

    // -----------------------------------------------------------------------
    // Weather and location
    // -----------------------------------------------------------------------

    /// Weather for a city named directly in the trigger utterance.  Skips
    /// location resolution entirely.
    pub async fn weather_for_city(&self, city: &str) -> Vec<String> {
        match self.providers.weather.current(city).await {
            Ok(conditions) => vec![speak_weather(&conditions)],
            Err(e) => vec![report(&e)],
        }
    }

    /// Weather via the resolution chain.  `explicit` is a city the user
    /// supplied after being prompted; `None` runs detection.
    pub async fn weather_resolved(&self, user_id: &str, explicit: Option<&str>) -> Vec<String> {
        match self.resolver.resolve(user_id, explicit).await {
            Ok(Resolution::Located(loc)) => self.weather_for_city(&loc.city).await,
            Ok(Resolution::NeedsPrompt) => vec![
                "I still couldn't determine your location. Try 'set my location to' followed by a city."
                    .to_string(),
            ],
            Err(e) => {
                warn!(user_id, error = %e, "location store unavailable");
                vec![store_trouble()]
            }
        }
    }

    async fn weather_from_flow(&self, user_id: &str, flow: &FlowState) -> Vec<String> {
        let city = flow
            .value("city")
            .and_then(|v| v.as_text())
            .unwrap_or_default();
        if city == "my location" || city == "here" {
            self.weather_resolved(user_id, None).await
        } else {
            // The prompted city becomes the user's saved location.
            self.weather_resolved(user_id, Some(city)).await
        }
    }

    async fn set_location(&self, user_id: &str, flow: &FlowState) -> Vec<String> {
        let Some(city) = flow.value("city").and_then(|v| v.as_text()) else {
            return vec![cant_do_that()];
        };
        self.set_user_location(user_id, city).await
    }

    /// Persist an explicit location override and confirm it back.
    pub async fn set_user_location(&self, user_id: &str, city: &str) -> Vec<String> {
        match self.resolver.resolve(user_id, Some(city)).await {
            Ok(Resolution::Located(loc)) => {
                vec![format!("Got it, I've set your location to {}.", loc.city)]
            }
            Ok(Resolution::NeedsPrompt) => vec![cant_do_that()],
            Err(e) => {
                warn!(user_id, error = %e, "location store unavailable");
                vec![store_trouble()]
            }
        }
    }

    // -----------------------------------------------------------------------
    // Read-only lookups
    // -----------------------------------------------------------------------

    async fn search_flights(&self, flow: &FlowState) -> Vec<String> {
        let origin = flow.value("origin").and_then(|v| v.as_text()).unwrap_or_default();
        let destination = flow
            .value("destination")
            .and_then(|v| v.as_text())
            .unwrap_or_default();
        let date = flow.value("date").and_then(|v| v.as_when()).map(|t| t.date_naive());
        match self.providers.flights.search(origin, destination, date).await {
            Ok(options) if options.is_empty() => {
                vec![format!("I couldn't find any flights from {origin} to {destination}.")]
            }
            Ok(options) => {
                let mut lines = vec![format!("Here's what I found from {origin} to {destination}:")];
                for (i, opt) in options.iter().take(FLIGHT_OPTIONS_SHOWN).enumerate() {
                    let stops = match opt.stops {
                        0 => "non-stop".to_string(),
                        1 => "1 stop".to_string(),
                        n => format!("{n} stops"),
                    };
                    lines.push(format!(
                        "Option {}: {} for {}, {} total, {}.",
                        i + 1,
                        opt.airline,
                        opt.price,
                        opt.duration,
                        stops
                    ));
                }
                lines
            }
            Err(e) => vec![report(&e)],
        }
    }

    async fn fetch_news(&self, flow: &FlowState) -> Vec<String> {
        let topic = flow
            .value("topic")
            .and_then(|v| v.as_text())
            .unwrap_or("technology");
        match self.providers.news.headlines(topic, NEWS_LIMIT).await {
            Ok(articles) if articles.is_empty() => {
                vec![format!("No recent headlines about {topic}.")]
            }
            Ok(articles) => {
                let mut lines = vec![format!("Top headlines about {topic}:")];
                for (i, a) in articles.iter().enumerate() {
                    lines.push(format!("{}. {} ({})", i + 1, a.title, a.source));
                }
                lines
            }
            Err(e) => vec![report(&e)],
        }
    }

    async fn fetch_quote(&self, flow: &FlowState) -> Vec<String> {
        let raw = flow.value("symbol").and_then(|v| v.as_text()).unwrap_or_default();
        let symbol = ticker_for(raw);
        match self.providers.stocks.quote(&symbol).await {
            Ok(q) => vec![format!(
                "{} ({}) is trading at {}, {} ({}) today. Market cap {}.",
                q.name, q.symbol, q.price, q.change, q.change_percent, q.market_cap
            )],
            Err(e) => vec![report(&e)],
        }
    }

    async fn play_music(&self, flow: &FlowState) -> Vec<String> {
        let query = flow.value("query").and_then(|v| v.as_text()).unwrap_or_default();
        match self.providers.music.play(query).await {
            Ok(description) => vec![description],
            Err(e) => vec![report(&e)],
        }
    }

    // -----------------------------------------------------------------------
    // Single-turn intents
    // -----------------------------------------------------------------------

    /// Answer an intent that never opens a flow.
    pub async fn answer_direct(&self, user_id: &str, intent: Intent, text: &str) -> Vec<String> {
        match intent {
            Intent::SmallTalk => vec![small_talk_reply(text)],
            Intent::AskTime => {
                let now = Utc::now().with_timezone(&self.tz);
                vec![format!("It's {} right now.", now.format("%I:%M %p"))]
            }
            Intent::Joke => vec![pick_joke().to_string()],
            Intent::Question | Intent::Unknown => self.answer_question(intent, text).await,
            Intent::GetLocation => self.tell_location(user_id).await,
            Intent::TelegramRead => self.telegram_read().await,
            other => {
                warn!(intent = %other, "answer_direct called for a flow intent");
                vec![cant_do_that()]
            }
        }
    }

    async fn answer_question(&self, intent: Intent, text: &str) -> Vec<String> {
        if intent == Intent::Unknown {
            return vec!["I'm not sure I caught that. Could you say it another way?".to_string()];
        }
        match self.providers.answers.answer(text).await {
            Ok(answer) => vec![answer],
            Err(e) => vec![report(&e)],
        }
    }

    async fn tell_location(&self, user_id: &str) -> Vec<String> {
        match self.resolver.current(user_id).await {
            Ok(Some(loc)) => vec![format!("As far as I can tell, you're in {}.", loc.describe())],
            Ok(None) => vec![
                "I couldn't determine your location. You can say 'set my location to' followed by a city."
                    .to_string(),
            ],
            Err(e) => {
                warn!(user_id, error = %e, "location store unavailable");
                vec![store_trouble()]
            }
        }
    }

    async fn telegram_read(&self) -> Vec<String> {
        let Some(channel) = &self.channel else {
            return vec![missing_channel()];
        };
        match self.providers.messaging.read_messages(channel).await {
            Ok(messages) if messages.is_empty() => {
                vec!["No new Telegram messages.".to_string()]
            }
            Ok(messages) => messages
                .iter()
                .take(TELEGRAM_READ_LIMIT)
                .map(|m| format!("From {}: {}", m.sender, m.text))
                .collect(),
            Err(e) => vec![report(&e)],
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Turn a provider failure into the line the user hears.  Configuration
/// gaps already carry an actionable message; anything else is prefixed so
/// the user knows the request itself was fine.
fn report(e: &ProviderError) -> String {
    if e.is_configuration() {
        e.to_string()
    } else {
        format!("Sorry, that didn't work: {e}")
    }
}

pub(crate) fn store_trouble() -> String {
    "I'm having trouble with my local storage right now. Please try again in a moment.".to_string()
}

fn missing_channel() -> String {
    "Telegram isn't set up yet. Please set TELEGRAM_CHAT_ID in your environment.".to_string()
}

fn cant_do_that() -> String {
    "Something went wrong on my side with that request.".to_string()
}

/// Subject and body from the collected purpose.  A plain deterministic
/// template; a language-model pass can replace this later without touching
/// the flow.
fn compose_email(to: &str, purpose: &str, today: DateTime<FixedOffset>) -> (String, String) {
    let mut subject: String = purpose.chars().take(70).collect();
    if let Some(first) = subject.get(0..1) {
        let upper = first.to_uppercase();
        subject.replace_range(0..1, &upper);
    }
    let name = to.split('@').next().unwrap_or(to);
    let body = format!(
        "Dear {name},\n\nI'm writing regarding {purpose}.\n\nBest regards,\n[Your Name]\n{}",
        today.format("%d %b %Y")
    );
    (subject, body)
}

fn speak_weather(report: &WeatherReport) -> String {
    let mut line = format!(
        "Weather in {}: {}, {}. Precipitation {}, humidity {}, wind {}.",
        report.location,
        report.temperature,
        report.condition,
        report.precipitation,
        report.humidity,
        report.wind
    );
    if !report.forecast.is_empty() {
        let days: Vec<String> = report
            .forecast
            .iter()
            .map(|d| format!("{} {} {}", d.day, d.temperature, d.condition))
            .collect();
        line.push_str(&format!(" Forecast: {}.", days.join("; ")));
    }
    line
}

fn small_talk_reply(text: &str) -> String {
    if text.contains("how are you") {
        "I'm doing great and ready to help. What can I do for you?".to_string()
    } else if text.contains("good morning") {
        "Good morning! How can I help you today?".to_string()
    } else if text.contains("good afternoon") {
        "Good afternoon! What can I do for you?".to_string()
    } else if text.contains("good evening") {
        "Good evening! What can I do for you?".to_string()
    } else {
        "Hello! How can I help you today?".to_string()
    }
}

fn pick_joke() -> &'static str {
    // Cheap variety without a RNG dependency.
    let idx = Utc::now().timestamp_subsec_nanos() as usize % JOKES.len();
    JOKES[idx]
}

const TICKERS: &[(&str, &str)] = &[
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("google", "GOOGL"),
    ("alphabet", "GOOGL"),
    ("amazon", "AMZN"),
    ("tesla", "TSLA"),
    ("meta", "META"),
    ("facebook", "META"),
    ("netflix", "NFLX"),
    ("nvidia", "NVDA"),
];

/// Map a spoken company name to its ticker; unknown names pass through
/// uppercased.
fn ticker_for(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    for (name, ticker) in TICKERS {
        if lowered == *name {
            return (*ticker).to_string();
        }
    }
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ticker_mapping() {
        assert_eq!(ticker_for("apple"), "AAPL");
        assert_eq!(ticker_for("Tesla "), "TSLA");
        assert_eq!(ticker_for("tsla"), "TSLA");
        assert_eq!(ticker_for("zomato"), "ZOMATO");
    }

    #[test]
    fn email_template_capitalizes_and_dates() {
        let today = FixedOffset::east_opt(330 * 60)
            .unwrap()
            .with_ymd_and_hms(2026, 8, 27, 9, 0, 0)
            .unwrap();
        let (subject, body) = compose_email("john@gmail.com", "the quarterly report", today);
        assert_eq!(subject, "The quarterly report");
        assert!(body.starts_with("Dear john,"));
        assert!(body.contains("the quarterly report"));
        assert!(body.contains("27 Aug 2026"));
    }

    #[test]
    fn weather_is_one_combined_utterance() {
        let report = WeatherReport {
            location: "Jaipur, Rajasthan".into(),
            temperature: "31°C".into(),
            condition: "partly cloudy".into(),
            precipitation: "10%".into(),
            humidity: "58%".into(),
            wind: "12 km/h".into(),
            forecast: vec![aria_providers::DayForecast {
                day: "Friday".into(),
                temperature: "29°C".into(),
                condition: "rain".into(),
            }],
        };
        let line = speak_weather(&report);
        assert!(line.contains("Jaipur"));
        assert!(line.contains("Forecast: Friday 29°C rain."));
        // One utterance, not a multi-line report.
        assert!(!line.contains('\n'));
    }

    #[test]
    fn configuration_gaps_speak_the_hint() {
        let e = ProviderError::NotConfigured {
            provider: "Telegram",
            hint: "TELEGRAM_BOT_TOKEN",
        };
        let line = report(&e);
        assert!(line.contains("TELEGRAM_BOT_TOKEN"));
        assert!(!line.starts_with("Sorry"));

        let e = ProviderError::Failed("rate limited".into());
        assert_eq!(report(&e), "Sorry, that didn't work: rate limited");
    }
}
