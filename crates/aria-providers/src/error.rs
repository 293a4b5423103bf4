//! Provider error types.
//!
//! Every collaborator surfaces failures through [`ProviderError`].  The
//! engine distinguishes missing configuration (actionable message) from a
//! plain provider failure (reported verbatim, flow terminates, no retry).

/// Unified error type for all Aria collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// A required credential or setting is absent.  The message is spoken
    /// to the user as-is, so it names the exact variable to set.
    #[error("{provider} is not configured. Please set {hint} in your environment.")]
    NotConfigured {
        /// Human-readable provider name (e.g. "Telegram", "Google Calendar").
        provider: &'static str,
        /// The environment variable or setting that is missing.
        hint: &'static str,
    },

    /// The provider reported an error.  Reported verbatim to the user.
    #[error("{0}")]
    Failed(String),

    /// Transport-level HTTP failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ProviderError {
    /// True when the failure is a missing-configuration condition rather
    /// than an operational one.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }
}

/// Convenience alias used throughout the provider crate.
pub type Result<T> = std::result::Result<T, ProviderError>;
