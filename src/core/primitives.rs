//! Reusable field checks: dates, bounded decimals, printable text and
//! offset timestamps. All functions are pure; "today" is always passed in.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use thiserror::Error;

use super::config::TextPolicy;
use super::error::ValidationError;

/// First issue date the protocol accepts (28 October 2024).
pub const PROTOCOL_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2024, 10, 28) {
    Some(date) => date,
    None => panic!("invalid protocol epoch"),
};

/// Wire format of every date in the protocol.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// A date as supplied by the caller: wire text or an already-typed date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    Text(String),
    Date(NaiveDate),
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for DateInput {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// Why a date was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("invalid date '{0}', expected dd-mm-yyyy")]
    Malformed(String),
    #[error("date {0} is in the future")]
    InFuture(NaiveDate),
    #[error("date {0} is in the past")]
    InPast(NaiveDate),
    #[error("date {0} is not 31 December")]
    NotYearEnd(NaiveDate),
    #[error("year of {0} must be the current or the previous year")]
    YearOutOfRange(NaiveDate),
    #[error("date {0} is earlier than the protocol epoch 28-10-2024")]
    BeforeEpoch(NaiveDate),
}

impl DateError {
    /// Attach the error to a field path.
    pub fn at(&self, field: impl Into<String>) -> ValidationError {
        ValidationError::field(field, self.to_string())
    }
}

/// Parse a strict `dd-mm-yyyy` string, or pass a typed date through.
pub fn validate_date(input: impl Into<DateInput>) -> Result<NaiveDate, DateError> {
    match input.into() {
        DateInput::Date(date) => Ok(date),
        DateInput::Text(text) => parse_wire_date(&text).ok_or(DateError::Malformed(text)),
    }
}

fn parse_wire_date(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    if bytes.len() != 10 || bytes[2] != b'-' || bytes[5] != b'-' {
        return None;
    }
    let digits = |range: std::ops::Range<usize>| -> Option<u32> {
        let part = &text[range];
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        part.parse().ok()
    };
    let day = digits(0..2)?;
    let month = digits(3..5)?;
    let year = digits(6..10)?;
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

/// A valid date that is not after `today`.
pub fn validate_past_date(
    input: impl Into<DateInput>,
    today: NaiveDate,
) -> Result<NaiveDate, DateError> {
    let date = validate_date(input)?;
    if date > today {
        return Err(DateError::InFuture(date));
    }
    Ok(date)
}

/// A valid date that is not before `today`.
pub fn validate_future_date(
    input: impl Into<DateInput>,
    today: NaiveDate,
) -> Result<NaiveDate, DateError> {
    let date = validate_date(input)?;
    if date < today {
        return Err(DateError::InPast(date));
    }
    Ok(date)
}

/// Only `31-12-YYYY` where YYYY is the current or the previous year.
pub fn validate_year_end_date(
    input: impl Into<DateInput>,
    today: NaiveDate,
) -> Result<NaiveDate, DateError> {
    let date = validate_date(input)?;
    if date.year() != today.year() && date.year() != today.year() - 1 {
        return Err(DateError::YearOutOfRange(date));
    }
    if date.month() != 12 || date.day() != 31 {
        return Err(DateError::NotYearEnd(date));
    }
    Ok(date)
}

/// Reject dates before [`PROTOCOL_EPOCH`].
pub fn validate_epoch(date: NaiveDate) -> Result<NaiveDate, DateError> {
    if date < PROTOCOL_EPOCH {
        return Err(DateError::BeforeEpoch(date));
    }
    Ok(date)
}

/// Render a date in the wire format (`dd-mm-yyyy`).
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Serde helper writing a date in the wire format.
pub(crate) fn serialize_wire_date<S: serde::Serializer>(
    date: &NaiveDate,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(DATE_FORMAT))
}

pub(crate) fn serialize_wire_date_opt<S: serde::Serializer>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.collect_str(&date.format(DATE_FORMAT)),
        None => serializer.serialize_none(),
    }
}

/// True iff `s` matches `-?\d{1,max_int_digits}(\.\d{0,2})?`.
pub fn validate_bounded_decimal(s: &str, max_int_digits: usize) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };
    if int_part.is_empty() || int_part.len() > max_int_digits {
        return false;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match frac_part {
        Some(frac) => frac.len() <= 2 && frac.bytes().all(|b| b.is_ascii_digit()),
        None => true,
    }
}

/// Validate a bounded decimal string and convert it to a [`Decimal`].
///
/// A bare trailing separator (`"5."`) is accepted and read as `"5"`.
pub fn parse_bounded_decimal(s: &str, max_int_digits: usize) -> Option<Decimal> {
    if !validate_bounded_decimal(s, max_int_digits) {
        return None;
    }
    Decimal::from_str(s.strip_suffix('.').unwrap_or(s)).ok()
}

/// True iff every character is printable ASCII (32..=126) and, under a
/// strict policy, none of `<`, `>`, `=` appear.
pub fn validate_printable_ascii(s: &str, policy: TextPolicy) -> bool {
    s.chars().all(|c| {
        let printable = (' '..='~').contains(&c);
        printable && !(policy.forbid_markup && matches!(c, '<' | '>' | '='))
    })
}

/// True iff `s` is `YYYY-MM-DDThh:mm:ss` followed by `Z` or `±hh:mm`.
pub fn validate_offset_datetime(s: &str) -> bool {
    let b = s.as_bytes();
    let digits = |range: std::ops::Range<usize>| b[range].iter().all(u8::is_ascii_digit);

    let base_ok = b.len() >= 20
        && digits(0..4)
        && b[4] == b'-'
        && digits(5..7)
        && b[7] == b'-'
        && digits(8..10)
        && b[10] == b'T'
        && digits(11..13)
        && b[13] == b':'
        && digits(14..16)
        && b[16] == b':'
        && digits(17..19);
    if !base_ok {
        return false;
    }

    match b.len() {
        20 => b[19] == b'Z',
        25 => matches!(b[19], b'+' | b'-') && digits(20..22) && b[22] == b':' && digits(23..25),
        _ => false,
    }
}

/// Check a free-text field: `min_len..=max_len` printable characters.
pub(crate) fn check_text(
    field: &str,
    value: &str,
    min_len: usize,
    max_len: usize,
    policy: TextPolicy,
    errors: &mut Vec<ValidationError>,
) {
    let len = value.chars().count();
    if len < min_len {
        errors.push(ValidationError::field(field, "must not be empty"));
        return;
    }
    if len > max_len {
        errors.push(ValidationError::field(
            field,
            format!("must have at most {max_len} characters, got {len}"),
        ));
    }
    if !validate_printable_ascii(value, policy) {
        errors.push(ValidationError::field(field, printable_message(policy)));
    }
}

pub(crate) fn printable_message(policy: TextPolicy) -> &'static str {
    if policy.forbid_markup {
        "must contain only printable ASCII characters and none of '<', '>', '='"
    } else {
        "must contain only printable ASCII characters"
    }
}

/// Parse a required amount field, recording a violation on failure.
pub(crate) fn check_amount(
    field: &str,
    raw: &str,
    max_int_digits: usize,
    errors: &mut Vec<ValidationError>,
) -> Option<Decimal> {
    let parsed = parse_bounded_decimal(raw, max_int_digits);
    if parsed.is_none() {
        errors.push(ValidationError::field(
            field,
            format!(
                "'{raw}' must be a number with at most {max_int_digits} integer digits and 2 decimals"
            ),
        ));
    }
    parsed
}
