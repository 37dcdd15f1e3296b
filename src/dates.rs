// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Date handling for OP fields.
//!
//! The backend sends dates either as plain `YYYY-MM-DD` or as full timestamps.
//! Display always uses `dd/mm/yyyy` in UTC, the backend always receives
//! `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const BACKEND_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// Parse any date shape the backend or a user may produce.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` and RFC 3339. Timestamps
/// with an offset are converted to UTC before the date is taken.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, BACKEND_FORMAT) {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.naive_utc().date());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.date());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, DISPLAY_FORMAT) {
        return Some(date);
    }
    None
}

pub fn is_valid_date(input: &str) -> bool {
    parse_date(input).is_some()
}

/// `dd/mm/yyyy`, or an empty string when the input is missing or invalid.
pub fn format_for_display(input: Option<&str>) -> String {
    input
        .and_then(parse_date)
        .map(|d| d.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_default()
}

/// `YYYY-MM-DD`, or `None` when the input is missing or invalid.
pub fn format_for_backend(input: Option<&str>) -> Option<String> {
    input
        .and_then(parse_date)
        .map(|d| d.format(BACKEND_FORMAT).to_string())
}
