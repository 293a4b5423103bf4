//! Email address recovery from speech-recognized text.
//!
//! Speech transcription renders addresses as "john at gmail dot com"; this
//! module folds the spoken connectives back into a syntactic address before
//! validating it.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").expect("email regex")
});

static SPOKEN_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(?:at|@)\s+").expect("spoken-at regex"));

static SPOKEN_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(?:dot|\.)\s+").expect("spoken-dot regex"));

static TRAILING_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([a-z0-9-]+)\s*(?:dot|\.)\s*([a-z]+)").expect("domain regex"));

/// Convert speech patterns to a syntactic address.
///
/// "john at gmail dot com" becomes "john@gmail.com"; input that already
/// looks like an address passes through unchanged (lowercased).
pub fn normalize_email_from_speech(text: &str) -> String {
    let text = text.trim().to_lowercase();
    if EMAIL_RE.is_match(&text) {
        return text;
    }

    let text = SPOKEN_AT.replace_all(&text, "@");
    let text = SPOKEN_DOT.replace_all(&text, ".");
    let text = TRAILING_DOT.replace_all(&text, "@$1.$2");
    text.replace(' ', "")
}

/// Basic syntactic validation.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Normalize then validate; `None` means the input could not be recovered
/// as an address and the caller should re-prompt.
pub fn parse_email(spoken: &str) -> Option<String> {
    if spoken.trim().is_empty() {
        return None;
    }
    let normalized = normalize_email_from_speech(spoken);
    is_valid_email(&normalized).then_some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spoken_forms_are_recovered() {
        assert_eq!(
            parse_email("john at gmail dot com").as_deref(),
            Some("john@gmail.com")
        );
        assert_eq!(
            parse_email("john dot doe at example dot com").as_deref(),
            Some("john.doe@example.com")
        );
    }

    #[test]
    fn literal_addresses_pass_through() {
        assert_eq!(
            parse_email("John@Example.com").as_deref(),
            Some("john@example.com")
        );
    }

    #[test]
    fn mixed_spoken_domain() {
        assert_eq!(
            parse_email("john@gmail dot com").as_deref(),
            Some("john@gmail.com")
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_email("my friend from work").is_none());
        assert!(parse_email("").is_none());
        assert!(parse_email("john at gmail").is_none());
    }
}
