//! Collaborator contracts for Aria — every external capability the dialog
//! engine depends on, behind narrow async traits.
//!
//! The engine treats each of these as a single-shot I/O call; no provider
//! carries conversational state.

pub mod error;
pub mod geoip;
pub mod traits;
pub mod unconfigured;

pub use error::{ProviderError, Result};
pub use geoip::HttpGeoIpProvider;
pub use traits::{
    AnswerProvider, Article, CalendarEvent, CalendarProvider, DayForecast, EmailDisposition,
    EmailReceipt, FlightOption, FlightsProvider, GeoFix, GeoIpProvider, IncomingMessage,
    MailProvider, Meeting, MeetingProvider, MeetingRequest, MessagingProvider, MusicProvider,
    NewsProvider, StockQuote, StocksProvider, WeatherProvider, WeatherReport,
};
pub use unconfigured::Unconfigured;
