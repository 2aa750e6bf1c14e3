//! Response cell grammar.
//!
//! Rules are tried in priority order and the first one that consumes the
//! whole (trimmed) cell wins. The final rule accepts any non-empty text, so
//! only a blank cell is a parse error.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use mindlogger_model::{GeoPoint, Grammar, MatrixRow, ParseError, ResponseRecord};
use regex::Regex;

use crate::cursor::Cursor;

/// Two-digit years below this are in the 2000s, the rest in the 1900s.
const PIVOT_YEAR: i32 = 69;
const MAX_TWO_DIGIT_YEAR: i32 = 99;

static FILE_PATH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.?/?.+/.+\.\w{2,4}$").expect("Invalid file path regex")
});

type Rule = fn(Cursor<'_>) -> Option<ResponseRecord>;

/// Response rules, highest priority first.
const RULES: &[(&str, Rule)] = &[
    ("text", text_rule),
    ("null_value", null_value_rule),
    ("single_value", single_value_rule),
    ("multi_value", multi_value_rule),
    ("date", date_rule),
    ("time", time_rule),
    ("time_range", time_range_rule),
    ("geo", geo_rule),
    ("matrix", matrix_rule),
    ("file", file_rule),
    ("raw_value", raw_value_rule),
];

/// Decodes one response cell.
///
/// # Errors
///
/// Returns a [`ParseError`] at position 0 when the cell is blank.
pub fn parse_response(text: &str) -> Result<ResponseRecord, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new(
            Grammar::Response,
            text,
            0,
            "empty response",
        ));
    }
    RULES
        .iter()
        .find_map(|(_, rule)| rule(Cursor::new(trimmed)))
        .ok_or_else(|| ParseError::new(Grammar::Response, text, 0, "no rule matched"))
}

/// Names of the response rules in the order they are tried.
pub fn response_rule_names() -> impl Iterator<Item = &'static str> {
    RULES.iter().map(|(name, _)| *name)
}

fn finished(cursor: Cursor<'_>, record: ResponseRecord) -> Option<ResponseRecord> {
    cursor.is_eof().then_some(record)
}

fn text_rule(mut c: Cursor<'_>) -> Option<ResponseRecord> {
    if !c.eat("text:") {
        return None;
    }
    c.ws()?;
    let body = c.rest();
    (!body.is_empty()).then(|| ResponseRecord::Text(body.to_string()))
}

fn null_value_rule(mut c: Cursor<'_>) -> Option<ResponseRecord> {
    if !c.eat("value:") {
        return None;
    }
    c.ws()?;
    if !c.eat("null") {
        return None;
    }
    finished(c, ResponseRecord::NullValue)
}

fn single_value_rule(mut c: Cursor<'_>) -> Option<ResponseRecord> {
    if !c.eat("value:") {
        return None;
    }
    c.ws()?;
    let value = c.int()?;
    finished(c, ResponseRecord::Value(vec![value]))
}

fn multi_value_rule(mut c: Cursor<'_>) -> Option<ResponseRecord> {
    if !c.eat("value:") {
        return None;
    }
    c.ws()?;
    let values = c.int_list()?;
    finished(c, ResponseRecord::Value(values))
}

fn expand_year(year: i32) -> i32 {
    if year < PIVOT_YEAR {
        2000 + year
    } else if year <= MAX_TWO_DIGIT_YEAR {
        1900 + year
    } else {
        year
    }
}

/// `date: D/M/Y`, day first.
fn date_rule(mut c: Cursor<'_>) -> Option<ResponseRecord> {
    if !c.eat("date:") {
        return None;
    }
    c.ws()?;
    let day: u32 = c.digits(1, 2)?.parse().ok()?;
    if !c.eat("/") {
        return None;
    }
    let month: u32 = c.digits(1, 2)?.parse().ok()?;
    if !c.eat("/") {
        return None;
    }
    let year_digits = c.digits(2, 4)?;
    if year_digits.len() == 3 {
        return None;
    }
    let year = expand_year(year_digits.parse().ok()?);
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    finished(c, ResponseRecord::Date(date))
}

/// `hr H min M`, returning the raw components.
fn clock(c: &mut Cursor<'_>) -> Option<(u32, u32)> {
    if !c.eat("hr") {
        return None;
    }
    c.ws()?;
    let hour = c.digits(1, 2)?.parse().ok()?;
    c.sep()?;
    if !c.eat("min") {
        return None;
    }
    c.ws()?;
    let minute = c.digits(1, 2)?.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some((hour, minute))
}

fn time_rule(mut c: Cursor<'_>) -> Option<ResponseRecord> {
    if !c.eat("time:") {
        return None;
    }
    c.ws()?;
    let (hour, minute) = clock(&mut c)?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    finished(c, ResponseRecord::Time(time))
}

/// `time_range: from <clock> / to <clock>`; the span is not normalized and
/// may be negative.
fn time_range_rule(mut c: Cursor<'_>) -> Option<ResponseRecord> {
    if !c.eat("time_range:") {
        return None;
    }
    c.ws()?;
    if !c.eat("from") {
        return None;
    }
    c.ws()?;
    let (from_hour, from_minute) = clock(&mut c)?;
    c.skip_ws();
    if !c.eat("/") {
        return None;
    }
    c.skip_ws();
    if !c.eat("to") {
        return None;
    }
    c.ws()?;
    let (to_hour, to_minute) = clock(&mut c)?;
    let span = TimeDelta::hours(i64::from(to_hour) - i64::from(from_hour))
        + TimeDelta::minutes(i64::from(to_minute) - i64::from(from_minute));
    finished(c, ResponseRecord::TimeRange(span))
}

fn geo_rule(mut c: Cursor<'_>) -> Option<ResponseRecord> {
    if !c.eat("geo:") {
        return None;
    }
    c.ws()?;
    if !c.eat("lat") {
        return None;
    }
    c.ws()?;
    let latitude = c.float()?;
    c.sep()?;
    if !c.eat("long") {
        return None;
    }
    c.ws()?;
    let longitude = c.float()?;
    finished(
        c,
        ResponseRecord::Geo(GeoPoint {
            latitude,
            longitude,
        }),
    )
}

fn is_word(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// One or more `key: v1, v2` lines.
fn matrix_rule(mut c: Cursor<'_>) -> Option<ResponseRecord> {
    let mut rows = Vec::new();
    loop {
        c.skip_ws();
        let key = c.take_while(is_word);
        if key.is_empty() || !c.eat(":") {
            return None;
        }
        c.skip_ws();
        let values = c.int_list()?;
        rows.push(MatrixRow::new(key, values));
        c.skip_ws();
        if c.is_eof() {
            return Some(ResponseRecord::Matrix(rows));
        }
        if !c.newlines() {
            return None;
        }
    }
}

fn file_rule(c: Cursor<'_>) -> Option<ResponseRecord> {
    let text = c.rest();
    FILE_PATH_REGEX
        .is_match(text)
        .then(|| ResponseRecord::File(text.to_string()))
}

fn raw_value_rule(c: Cursor<'_>) -> Option<ResponseRecord> {
    let text = c.rest();
    (!text.is_empty()).then(|| ResponseRecord::RawValue(text.to_string()))
}
