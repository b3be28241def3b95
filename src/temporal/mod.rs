//! Date/time normalization.
//!
//! Parses heterogeneous date representations into canonical `chrono`
//! values driven by an explicit, caller-supplied format, and synthesizes
//! missing calendar components where the data genuinely lacks them
//! (monthly aggregates have no day; the day defaults to 1 and that
//! default is part of the contract, not inferred precision).

use crate::error::{AnalysisError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Seconds in an average (Julian) year of 365.25 days.
pub const AVERAGE_YEAR_SECONDS: f64 = 365.25 * 86_400.0;

/// A single field in a date format specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatToken {
    /// Four-digit year, e.g. 2024.
    Year4,
    /// Two-digit year, e.g. 24.
    Year2,
    /// Numeric month 01-12.
    MonthNum,
    /// Abbreviated month name, e.g. "Mar".
    MonthAbbr,
    /// Full month name, e.g. "March".
    MonthFull,
    /// Numeric day of month 01-31.
    Day,
    /// Hour 00-23.
    Hour24,
    /// Hour 01-12 (pair with [`FormatToken::AmPm`]).
    Hour12,
    /// Minute 00-59.
    Minute,
    /// Second 00-60.
    Second,
    /// AM/PM marker.
    AmPm,
    /// UTC offset, e.g. "+0100".
    UtcOffset,
    /// Literal separator text.
    Literal(String),
}

impl FormatToken {
    fn pattern(&self) -> String {
        match self {
            FormatToken::Year4 => "%Y".to_string(),
            FormatToken::Year2 => "%y".to_string(),
            FormatToken::MonthNum => "%m".to_string(),
            FormatToken::MonthAbbr => "%b".to_string(),
            FormatToken::MonthFull => "%B".to_string(),
            FormatToken::Day => "%d".to_string(),
            FormatToken::Hour24 => "%H".to_string(),
            FormatToken::Hour12 => "%I".to_string(),
            FormatToken::Minute => "%M".to_string(),
            FormatToken::Second => "%S".to_string(),
            FormatToken::AmPm => "%p".to_string(),
            FormatToken::UtcOffset => "%z".to_string(),
            FormatToken::Literal(s) => s.replace('%', "%%"),
        }
    }
}

/// An ordered date format specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    tokens: Vec<FormatToken>,
}

impl DateFormat {
    /// Create a format from an ordered token list.
    ///
    /// # Errors
    /// `InvalidParameter` if the list contains no date/time field
    /// (literals alone cannot describe a date).
    pub fn new(tokens: Vec<FormatToken>) -> Result<Self> {
        let has_field = tokens
            .iter()
            .any(|t| !matches!(t, FormatToken::Literal(_)));
        if !has_field {
            return Err(AnalysisError::InvalidParameter(
                "date format must contain at least one field token".to_string(),
            ));
        }
        Ok(Self { tokens })
    }

    /// The chrono strftime pattern equivalent to this format.
    pub fn pattern(&self) -> String {
        self.tokens.iter().map(|t| t.pattern()).collect()
    }

    fn has(&self, token: &FormatToken) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    fn has_month(&self) -> bool {
        self.has(&FormatToken::MonthNum)
            || self.has(&FormatToken::MonthAbbr)
            || self.has(&FormatToken::MonthFull)
    }

    fn has_day(&self) -> bool {
        self.has(&FormatToken::Day)
    }

    fn has_offset(&self) -> bool {
        self.has(&FormatToken::UtcOffset)
    }
}

fn mismatch(input: &str, detail: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::FormatMismatch {
        input: input.to_string(),
        detail: detail.to_string(),
    }
}

/// Parse a date string against an explicit format.
///
/// Every field token must match or the call fails with `FormatMismatch`.
/// When the format carries no day token the day is synthesized as 1, and
/// when it carries no month token the month is synthesized as January;
/// the result therefore has at most the precision of the input.
pub fn parse_date(input: &str, format: &DateFormat) -> Result<NaiveDate> {
    // Synthesized components are appended behind an explicit separator so
    // adjacent numeric fields cannot bleed into each other.
    let mut pattern = format.pattern();
    let mut padded = input.to_string();
    if !format.has_month() {
        pattern.push_str(" %m");
        padded.push_str(" 1");
    }
    if !format.has_day() {
        pattern.push_str(" %d");
        padded.push_str(" 1");
    }

    NaiveDate::parse_from_str(&padded, &pattern).map_err(|e| mismatch(input, e))
}

/// Parse a date-time string against an explicit format.
///
/// When the format includes a [`FormatToken::UtcOffset`] the offset is
/// honored and the result converted to UTC; otherwise the wall-clock
/// reading is taken to already be UTC. Missing day components are
/// synthesized as in [`parse_date`].
pub fn parse_datetime(input: &str, format: &DateFormat) -> Result<DateTime<Utc>> {
    if format.has_offset() {
        return DateTime::parse_from_str(input, &format.pattern())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| mismatch(input, e));
    }

    let mut pattern = format.pattern();
    let mut padded = input.to_string();
    if !format.has_month() {
        pattern.push_str(" %m");
        padded.push_str(" 1");
    }
    if !format.has_day() {
        pattern.push_str(" %d");
        padded.push_str(" 1");
    }

    NaiveDateTime::parse_from_str(&padded, &pattern)
        .map(|dt| dt.and_utc())
        .map_err(|e| mismatch(input, e))
}

/// Build a calendar date from separate year/month components.
///
/// The day is set to 1. Monthly aggregates carry no day-level
/// information, so downstream consumers must not read day precision into
/// the result.
pub fn from_year_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        AnalysisError::InvalidParameter(format!("invalid year/month: {year}-{month}"))
    })
}

/// Fractional years elapsed between two instants.
///
/// Computed as elapsed seconds divided by an average year of 365.25 days.
/// This is an approximation for ages and durations, not calendar-exact
/// arithmetic: leap-day boundaries shift results by up to a day's worth
/// of fraction.
pub fn years_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / AVERAGE_YEAR_SECONDS
}

/// Fractional years elapsed between two calendar dates (midnight to
/// midnight), using the same average-year approximation as
/// [`years_between`].
pub fn years_between_dates(from: NaiveDate, to: NaiveDate) -> f64 {
    let seconds = (to - from).num_days() as f64 * 86_400.0;
    seconds / AVERAGE_YEAR_SECONDS
}
