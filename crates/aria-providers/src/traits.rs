//! Collaborator contracts consumed by the dialog engine.
//!
//! Each external capability (mail, calendar, meetings, messaging, weather,
//! lookups) is a narrow async trait.  The engine only ever performs
//! single-shot calls against these; all multi-turn control flow lives in
//! the engine itself.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// What happened to an outgoing email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailDisposition {
    /// Delivered to the provider's outbox.
    Sent,
    /// Stored as a draft instead of sending.
    Draft,
}

/// Receipt for a successful mail operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailReceipt {
    pub disposition: EmailDisposition,
    /// Provider-assigned message identifier, when one exists.
    pub id: Option<String>,
}

/// A created calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    /// Join/view link when the provider supplies one.
    pub link: Option<String>,
}

/// Parameters for creating a meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRequest {
    pub title: String,
    /// Start right now rather than at a scheduled time.
    pub instant: bool,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

/// A created meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub link: String,
}

/// One message read back from the messaging channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub sender: String,
    pub text: String,
}

/// Current conditions plus a short forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Location name as the provider resolved it.
    pub location: String,
    pub temperature: String,
    pub condition: String,
    pub precipitation: String,
    pub humidity: String,
    pub wind: String,
    pub forecast: Vec<DayForecast>,
}

/// One day of forecast data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayForecast {
    pub day: String,
    pub temperature: String,
    pub condition: String,
}

/// The result of an IP-based geolocation lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoFix {
    pub city: String,
    pub region: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: String,
    pub zip: String,
}

/// One flight option from a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightOption {
    pub airline: String,
    pub price: String,
    pub duration: String,
    pub stops: u32,
}

/// One news article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub source: String,
    pub snippet: String,
}

/// A stock quote snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub price: String,
    pub change: String,
    pub change_percent: String,
    pub market_cap: String,
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// Outgoing email.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Send an email.  Must be invoked at most once per confirmed flow; the
    /// engine never retries a failed send.
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<EmailReceipt>;

    /// Store a draft instead of sending.
    async fn save_draft(&self, to: &str, subject: &str, body: &str) -> Result<EmailReceipt>;
}

/// Calendar event creation.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn create_event(
        &self,
        title: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<CalendarEvent>;
}

/// Video meeting creation.
#[async_trait]
pub trait MeetingProvider: Send + Sync {
    async fn create_meeting(&self, request: &MeetingRequest) -> Result<Meeting>;
}

/// Text messaging channel (Telegram in the reference deployment).
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_message(&self, channel: &str, text: &str) -> Result<()>;

    /// Read recent incoming messages from the channel.
    async fn read_messages(&self, channel: &str) -> Result<Vec<IncomingMessage>>;
}

/// Weather lookups.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherReport>;
}

/// IP-based geolocation.
#[async_trait]
pub trait GeoIpProvider: Send + Sync {
    async fn locate(&self) -> Result<GeoFix>;
}

/// Free-form question answering (a language-model collaborator).
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String>;
}

/// Music playback; returns a short description of what started playing.
#[async_trait]
pub trait MusicProvider: Send + Sync {
    async fn play(&self, query: &str) -> Result<String>;
}

/// Flight search.
#[async_trait]
pub trait FlightsProvider: Send + Sync {
    async fn search(
        &self,
        origin: &str,
        destination: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<FlightOption>>;
}

/// News headlines.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn headlines(&self, topic: &str, limit: usize) -> Result<Vec<Article>>;
}

/// Stock quotes.
#[async_trait]
pub trait StocksProvider: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<StockQuote>;
}
