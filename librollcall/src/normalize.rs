//! Normalization of raw worksheet cells: student ids and scan timestamps.
//!
//! Ids arrive from two different worksheets that may type the same column differently (a number
//! in the roster, text in the form responses, `1042.0` after a round trip through a float column).
//! Everything is funneled through [`canonical_id`] so that these all compare equal.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use sheets_api::table::Cell;

use crate::types::StudentId;

// Slashed dates are read month-first, then day-first for whatever month-first rejects.
const DATE_TIME_FORMATS: [&str; 11] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %I:%M:%S %p",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

// Spreadsheet serial dates count days from 1899-12-30. Anything past 9999-12-31 is not a date.
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

/// Canonical id for a cell, or `None` if the cell holds no id.
pub fn canonical_id(cell: &Cell) -> Option<StudentId> {
    match cell {
        Cell::Empty => None,
        Cell::Number(number) => Some(StudentId::new(canonical_number(*number))),
        Cell::Text(text) => canonical_text(text),
        Cell::Bool(_) => Some(StudentId::new(cell.to_string())),
    }
}

pub(crate) fn canonical_text(text: &str) -> Option<StudentId> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let id = match text.split_once('.') {
        Some((int, frac)) if is_digits(int) && !frac.is_empty() && frac.bytes().all(|b| b == b'0') => {
            int
        }
        _ => text,
    };
    Some(StudentId::new(id.to_owned()))
}

fn canonical_number(number: f64) -> String {
    // `Display` for f64 already drops the fractional part of integral values, and never uses
    // exponent notation, so `1042.0` is rendered as `1042`.
    number.to_string()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a scan timestamp. Unreadable values become `None` rather than an error; the caller
/// decides what an unknown time means.
pub fn parse_timestamp(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::Text(text) => parse_timestamp_text(text),
        Cell::Number(serial) => from_serial_date(*serial),
        Cell::Bool(_) | Cell::Empty => None,
    }
}

pub fn parse_timestamp_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(date_time) = DateTime::parse_from_rfc3339(text) {
        return Some(date_time.naive_local());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

fn from_serial_date(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL_DAY).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}
