// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time as a fixed-width, microsecond RFC3339 string.
///
/// Fixed width keeps stored timestamps lexically ordered.
pub fn now_timestamp() -> String {
    format_record_timestamp(Utc::now())
}

/// A record timestamp strictly later than `previous`.
///
/// Falls back to the current time if `previous` does not parse.
pub fn timestamp_after(previous: &str) -> String {
    let now = Utc::now();
    let next = match parse_timestamp(previous) {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    };
    format_record_timestamp(next)
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn format_record_timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}
