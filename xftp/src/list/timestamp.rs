//! # Timestamp
//!
//! Resolves the many date formats found in directory listings into UTC instants

use chrono::prelude::Utc;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// What a format provides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Date and time, year included
    Full,
    /// Date and time without year; the current year is assumed
    Recent,
    /// Date only; midnight is assumed
    DateOnly,
}

/// Formats tried in order; the first one matching wins.
///
/// `%y` variants come before `%Y` ones, since chrono's `%Y` accepts two-digit years.
const FORMATS: &[(&str, Shape)] = &[
    ("%b %d %H:%M", Shape::Recent),
    ("%b %d %Y %H:%M", Shape::Full),
    ("%b %d %Y", Shape::DateOnly),
    ("%m-%d-%y %H:%M", Shape::Full),
    ("%m-%d-%y %I:%M%p", Shape::Full),
    ("%m-%d-%Y %I:%M%p", Shape::Full),
    ("%m-%d-%y %H:%M:%S", Shape::Full),
    ("%m-%d-%Y %H:%M:%S", Shape::Full),
    ("%m-%d-%Y %H:%M", Shape::Full),
    ("%d-%b-%Y %H:%M:%S", Shape::Full),
    ("%d %b %H:%M", Shape::Recent),
    ("%d-%m-%y %I:%M%p", Shape::Full),
    ("%d-%m-%y", Shape::DateOnly),
    ("%m月 %d日 %H:%M", Shape::Recent),
    ("%m月 %d日 %Y年", Shape::DateOnly),
    ("%Y-%m-%d %H:%M", Shape::Full),
    ("%Y/%m/%d %H:%M", Shape::Full),
];

/// Timestamp parser for listing dates.
///
/// Built-in formats are tried first, then the custom format, if configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimestampParser {
    custom_format: Option<String>,
}

impl TimestampParser {
    pub fn new(custom_format: Option<&str>) -> Self {
        Self {
            custom_format: custom_format.map(str::to_string),
        }
    }

    /// Parse `timestamp`; `None` if no format matches
    pub fn parse(&self, timestamp: &str) -> Option<DateTime<Utc>> {
        self.parse_at(timestamp, Utc::now())
    }

    pub(crate) fn parse_at(&self, timestamp: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let timestamp = timestamp.trim();
        let builtin = FORMATS
            .iter()
            .find_map(|(format, shape)| parse_shape(timestamp, format, *shape, now))
            .map(|dt| fix_century(dt, now));
        if builtin.is_some() {
            return builtin;
        }
        warn!("unknown time stamp: {timestamp}");
        self.custom_format
            .as_deref()
            .and_then(|format| parse_with_format(timestamp, format, now))
    }
}

/// Parse `timestamp` with a single strftime `format`, which may lack the year or the time
pub(crate) fn parse_with_format(
    timestamp: &str,
    format: &str,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let has_year = ["%Y", "%y", "%C", "%G", "%g"]
        .iter()
        .any(|spec| format.contains(spec));
    if has_year {
        parse_shape(timestamp, format, Shape::Full, now)
            .or_else(|| parse_shape(timestamp, format, Shape::DateOnly, now))
    } else {
        parse_shape(timestamp, format, Shape::Recent, now).or_else(|| {
            let timestamp = format!("{timestamp} {}", now.year());
            let format = format!("{format} %Y");
            parse_shape(&timestamp, &format, Shape::DateOnly, now)
        })
    }
}

fn parse_shape(
    timestamp: &str,
    format: &str,
    shape: Shape,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match shape {
        Shape::Full => NaiveDateTime::parse_from_str(timestamp, format)
            .ok()
            .map(|dt| dt.and_utc()),
        Shape::DateOnly => NaiveDate::parse_from_str(timestamp, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc()),
        Shape::Recent => {
            // we need to add the current year at the end of the string
            let this_year = now.year();
            let with_year = format!("{timestamp} {this_year}");
            let dt = NaiveDateTime::parse_from_str(&with_year, &format!("{format} %Y"))
                .ok()?
                .and_utc();
            // a year-less date can't be in the future: it's from last year
            if dt > now {
                Some(dt.with_year(this_year - 1).unwrap_or(dt))
            } else {
                Some(dt)
            }
        }
    }
}

/// Two-digit years may land in the future; move them back a century
fn fix_century(dt: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if dt.year() > now.year() {
        dt.with_year(dt.year() - 100).unwrap_or(dt)
    } else {
        dt
    }
}
