//! # The 17-Character Protocol Timestamp
//!
//! The wire format is `YYYYMMDDHHMMSS` followed by the microsecond field,
//! truncated to 17 characters total — so exactly three sub-second digits
//! survive. A full microsecond field would be 20 characters; the protocol
//! keeps 17 and has since version 5.0, so 17 it is.
//!
//! Freshness is judged on whole seconds: a response is fresh while
//! `now - timestamp <= window`. Timestamps from the future are accepted
//! silently — the bank's own reference behavior checks only "too old", and
//! rejecting clock skew the bank tolerates would break live integrations.
//! All generation and comparison happens in UTC.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::config::TIMESTAMP_WIDTH;

/// Current time as a protocol timestamp.
pub fn now() -> String {
    generate(Utc::now())
}

/// Render a protocol timestamp for a specific instant.
pub fn generate(at: DateTime<Utc>) -> String {
    // %6f renders exactly six sub-second digits; the truncation keeps three.
    let full = at.format("%Y%m%d%H%M%S%6f").to_string();
    full[..TIMESTAMP_WIDTH].to_string()
}

/// Parse a protocol timestamp to second precision.
///
/// The three trailing sub-second digits are validated as digits but do not
/// participate in freshness math — the window is measured in minutes, so
/// millisecond precision buys nothing.
pub fn parse(value: &str) -> Option<NaiveDateTime> {
    if value.len() != TIMESTAMP_WIDTH || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(&value[..14], "%Y%m%d%H%M%S").ok()
}

/// Whether a timestamp is within the freshness window as of `now`.
///
/// Unparsable timestamps are stale by definition. Future timestamps pass.
pub fn is_fresh(value: &str, window: Duration, now: DateTime<Utc>) -> bool {
    let Some(parsed) = parse(value) else {
        return false;
    };
    let age = now.naive_utc() - parsed;
    age.num_seconds() <= window.as_secs() as i64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
