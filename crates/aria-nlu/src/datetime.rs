//! Spoken date/time parsing.
//!
//! Three shapes are understood, resolved against a caller-supplied "now" in
//! the session's timezone:
//!
//! - relative offsets: "in 2 hours", "in 45 minutes"
//! - ISO-like date plus time: "2026-09-01 14:30"
//! - relative day word plus clock time: "tomorrow at 5 pm", "today 17:30"
//!
//! Anything ambiguous or unparseable yields `None`; the caller re-prompts.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use regex::Regex;

static RELATIVE_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bin\s+(\d{1,3})\s+(hours?|minutes?|mins?)\b").expect("offset regex")
});

static ISO_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})[t ](\d{1,2}):(\d{2})\b").expect("iso regex")
});

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    // Either a meridiem ("5 pm", "5:30pm") or an explicit colon ("17:30");
    // a bare number is too ambiguous to accept.
    Regex::new(r"\b(\d{1,2}):(\d{2})\s*(am|pm)?\b|\b(\d{1,2})\s*(am|pm)\b").expect("clock regex")
});

/// Parse a spoken datetime against `now`.
///
/// `now` carries the session's timezone; the result is produced in the same
/// offset.  Returns `None` when no supported shape matches.
pub fn parse_datetime_at(text: &str, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = RELATIVE_OFFSET.captures(&text) {
        let amount: i64 = caps[1].parse().ok()?;
        let dur = if caps[2].starts_with("hour") {
            Duration::hours(amount)
        } else {
            Duration::minutes(amount)
        };
        return Some(now + dur);
    }

    if let Some(caps) = ISO_DATETIME.captures(&text) {
        let (y, mo, d): (i32, u32, u32) =
            (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        let (h, mi): (u32, u32) = (caps[4].parse().ok()?, caps[5].parse().ok()?);
        return now.timezone().with_ymd_and_hms(y, mo, d, h, mi, 0).single();
    }

    let caps = CLOCK_TIME.captures(&text)?;
    let (hour_raw, minute, meridiem) = if let Some(h) = caps.get(1) {
        (
            h.as_str().parse::<u32>().ok()?,
            caps[2].parse::<u32>().ok()?,
            caps.get(3).map(|m| m.as_str().to_string()),
        )
    } else {
        (
            caps[4].parse::<u32>().ok()?,
            0,
            Some(caps[5].to_string()),
        )
    };

    let hour = match meridiem.as_deref() {
        Some("pm") if hour_raw < 12 => hour_raw + 12,
        Some("am") if hour_raw == 12 => 0,
        _ => hour_raw,
    };
    if hour > 23 || minute > 59 {
        return None;
    }

    let day_offset = if text.contains("tomorrow") { 1 } else { 0 };
    let date = now.date_naive() + Duration::days(day_offset);
    let naive = date.and_hms_opt(hour, minute, 0)?;
    now.timezone().from_local_datetime(&naive).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn noon() -> DateTime<FixedOffset> {
        // 2026-08-27 12:00 at +05:30
        FixedOffset::east_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2026, 8, 27, 12, 0, 0)
            .unwrap()
    }

    #[test]
    fn relative_offsets() {
        let t = parse_datetime_at("in 2 hours", noon()).unwrap();
        assert_eq!(t.hour(), 14);
        let t = parse_datetime_at("remind me in 45 minutes", noon()).unwrap();
        assert_eq!((t.hour(), t.minute()), (12, 45));
    }

    #[test]
    fn iso_date_and_time() {
        let t = parse_datetime_at("2026-09-01 14:30", noon()).unwrap();
        assert_eq!(t.to_rfc3339(), "2026-09-01T14:30:00+05:30");
    }

    #[test]
    fn tomorrow_with_meridiem() {
        let t = parse_datetime_at("tomorrow at 5 pm", noon()).unwrap();
        assert_eq!(t.to_rfc3339(), "2026-08-28T17:00:00+05:30");
    }

    #[test]
    fn today_twenty_four_hour_clock() {
        let t = parse_datetime_at("today 17:30", noon()).unwrap();
        assert_eq!(t.to_rfc3339(), "2026-08-27T17:30:00+05:30");
    }

    #[test]
    fn bare_clock_defaults_to_today() {
        let t = parse_datetime_at("at 9 pm", noon()).unwrap();
        assert_eq!(t.to_rfc3339(), "2026-08-27T21:00:00+05:30");
    }

    #[test]
    fn midnight_am_wraps() {
        let t = parse_datetime_at("tomorrow at 12 am", noon()).unwrap();
        assert_eq!(t.hour(), 0);
    }

    #[test]
    fn ambiguous_input_yields_none() {
        assert!(parse_datetime_at("sometime soon", noon()).is_none());
        assert!(parse_datetime_at("at 5", noon()).is_none());
        assert!(parse_datetime_at("", noon()).is_none());
    }
}
