//! Placeholder providers for capabilities that have no credentials wired up.
//!
//! Every call fails with [`ProviderError::NotConfigured`] naming the exact
//! setting to supply, so the engine can speak an actionable message instead
//! of a generic failure.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::error::{ProviderError, Result};
use crate::traits::{
    AnswerProvider, Article, CalendarEvent, CalendarProvider, EmailReceipt, FlightOption,
    FlightsProvider, IncomingMessage, MailProvider, Meeting, MeetingProvider, MeetingRequest,
    MessagingProvider, MusicProvider, NewsProvider, StockQuote, StocksProvider, WeatherProvider,
    WeatherReport,
};

/// A provider slot with nothing behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

fn missing<T>(provider: &'static str, hint: &'static str) -> Result<T> {
    Err(ProviderError::NotConfigured { provider, hint })
}

#[async_trait]
impl MailProvider for Unconfigured {
    async fn send_email(&self, _to: &str, _subject: &str, _body: &str) -> Result<EmailReceipt> {
        missing("Mail", "MAIL_ACCOUNT")
    }

    async fn save_draft(&self, _to: &str, _subject: &str, _body: &str) -> Result<EmailReceipt> {
        missing("Mail", "MAIL_ACCOUNT")
    }
}

#[async_trait]
impl CalendarProvider for Unconfigured {
    async fn create_event(
        &self,
        _title: &str,
        _start: DateTime<FixedOffset>,
        _end: DateTime<FixedOffset>,
    ) -> Result<CalendarEvent> {
        missing("Calendar", "CALENDAR_ACCOUNT")
    }
}

#[async_trait]
impl MeetingProvider for Unconfigured {
    async fn create_meeting(&self, _request: &MeetingRequest) -> Result<Meeting> {
        missing("Meetings", "MEETING_ACCOUNT")
    }
}

#[async_trait]
impl MessagingProvider for Unconfigured {
    async fn send_message(&self, _channel: &str, _text: &str) -> Result<()> {
        missing("Telegram", "TELEGRAM_BOT_TOKEN")
    }

    async fn read_messages(&self, _channel: &str) -> Result<Vec<IncomingMessage>> {
        missing("Telegram", "TELEGRAM_BOT_TOKEN")
    }
}

#[async_trait]
impl WeatherProvider for Unconfigured {
    async fn current(&self, _city: &str) -> Result<WeatherReport> {
        missing("Weather lookups", "SERP_API_KEY")
    }
}

#[async_trait]
impl AnswerProvider for Unconfigured {
    async fn answer(&self, _question: &str) -> Result<String> {
        missing("The question assistant", "LLM_API_KEY")
    }
}

#[async_trait]
impl MusicProvider for Unconfigured {
    async fn play(&self, _query: &str) -> Result<String> {
        missing("Spotify", "SPOTIFY_CLIENT_ID")
    }
}

#[async_trait]
impl FlightsProvider for Unconfigured {
    async fn search(
        &self,
        _origin: &str,
        _destination: &str,
        _date: Option<NaiveDate>,
    ) -> Result<Vec<FlightOption>> {
        missing("Flight lookups", "SERP_API_KEY")
    }
}

#[async_trait]
impl NewsProvider for Unconfigured {
    async fn headlines(&self, _topic: &str, _limit: usize) -> Result<Vec<Article>> {
        missing("News lookups", "SERP_API_KEY")
    }
}

#[async_trait]
impl StocksProvider for Unconfigured {
    async fn quote(&self, _symbol: &str) -> Result<StockQuote> {
        missing("Stock lookups", "SERP_API_KEY")
    }
}
