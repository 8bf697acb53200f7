// SPDX-License-Identifier: MIT

//! Shared helpers for date/time formatting and arithmetic.

use chrono::{DateTime, SecondsFormat, Utc};

const SECS_PER_DAY: i64 = 86_400;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Whole days remaining until `end`, rounding partial days up.
///
/// Rounds toward "more days shown" so the UI never declares a window
/// expired while time remains. Never negative.
pub fn days_until_ceil(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (end - now).num_seconds();
    if secs <= 0 {
        return 0;
    }
    (secs + SECS_PER_DAY - 1) / SECS_PER_DAY
}
