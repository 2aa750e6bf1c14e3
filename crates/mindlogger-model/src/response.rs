//! Parsed item responses.
//!
//! A response cell in a MindLogger export is free text such as
//! `value: 1, 2, 3` or `time: hr 9 min 30`. The parser decodes each cell into
//! exactly one [`ResponseRecord`] variant; the accessors below expose the
//! variant as a set of optional fields so that the expansion engine can write
//! one column per field with every non-selected field left null.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Tag naming the populated branch of a [`ResponseRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    RawValue,
    Text,
    NullValue,
    Value,
    File,
    Date,
    Time,
    TimeRange,
    Geo,
    Matrix,
}

impl ResponseType {
    /// All response types in column order.
    pub const ALL: [ResponseType; 10] = [
        ResponseType::RawValue,
        ResponseType::Text,
        ResponseType::NullValue,
        ResponseType::Value,
        ResponseType::File,
        ResponseType::Date,
        ResponseType::Time,
        ResponseType::TimeRange,
        ResponseType::Geo,
        ResponseType::Matrix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::RawValue => "raw_value",
            ResponseType::Text => "text",
            ResponseType::NullValue => "null_value",
            ResponseType::Value => "value",
            ResponseType::File => "file",
            ResponseType::Date => "date",
            ResponseType::Time => "time",
            ResponseType::TimeRange => "time_range",
            ResponseType::Geo => "geo",
            ResponseType::Matrix => "matrix",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResponseType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| format!("unknown response type: {s}"))
    }
}

/// Latitude/longitude pair of a `geo:` response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One line of a matrix response: `row1: 1, 2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub row: String,
    pub value: Vec<i64>,
}

impl MatrixRow {
    pub fn new(row: impl Into<String>, value: Vec<i64>) -> Self {
        Self {
            row: row.into(),
            value,
        }
    }
}

/// A decoded response cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseRecord {
    /// Cell text that matched no structured rule.
    RawValue(String),
    /// `text: <body>`; the body may span several lines.
    Text(String),
    /// `value: null`.
    NullValue,
    /// `value: 1` or `value: 1, 2, 3`.
    Value(Vec<i64>),
    /// A relative or absolute path to an uploaded file.
    File(String),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Signed span between the two times of a `time_range:` cell.
    TimeRange(TimeDelta),
    Geo(GeoPoint),
    Matrix(Vec<MatrixRow>),
}

impl ResponseRecord {
    pub fn response_type(&self) -> ResponseType {
        match self {
            ResponseRecord::RawValue(_) => ResponseType::RawValue,
            ResponseRecord::Text(_) => ResponseType::Text,
            ResponseRecord::NullValue => ResponseType::NullValue,
            ResponseRecord::Value(_) => ResponseType::Value,
            ResponseRecord::File(_) => ResponseType::File,
            ResponseRecord::Date(_) => ResponseType::Date,
            ResponseRecord::Time(_) => ResponseType::Time,
            ResponseRecord::TimeRange(_) => ResponseType::TimeRange,
            ResponseRecord::Geo(_) => ResponseType::Geo,
            ResponseRecord::Matrix(_) => ResponseType::Matrix,
        }
    }

    pub fn raw_value(&self) -> Option<&str> {
        match self {
            ResponseRecord::RawValue(raw) => Some(raw),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ResponseRecord::Text(text) => Some(text),
            _ => None,
        }
    }

    /// `Some(true)` for `value: null`, absent otherwise.
    pub fn null_value(&self) -> Option<bool> {
        matches!(self, ResponseRecord::NullValue).then_some(true)
    }

    pub fn values(&self) -> Option<&[i64]> {
        match self {
            ResponseRecord::Value(values) => Some(values),
            _ => None,
        }
    }

    pub fn file(&self) -> Option<&str> {
        match self {
            ResponseRecord::File(path) => Some(path),
            _ => None,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ResponseRecord::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn time(&self) -> Option<NaiveTime> {
        match self {
            ResponseRecord::Time(time) => Some(*time),
            _ => None,
        }
    }

    pub fn time_range(&self) -> Option<TimeDelta> {
        match self {
            ResponseRecord::TimeRange(range) => Some(*range),
            _ => None,
        }
    }

    pub fn geo(&self) -> Option<GeoPoint> {
        match self {
            ResponseRecord::Geo(point) => Some(*point),
            _ => None,
        }
    }

    pub fn matrix(&self) -> Option<&[MatrixRow]> {
        match self {
            ResponseRecord::Matrix(rows) => Some(rows),
            _ => None,
        }
    }

    /// Number of populated fields; always 1 for a well-formed record.
    pub fn populated_fields(&self) -> usize {
        [
            self.raw_value().is_some(),
            self.text().is_some(),
            self.null_value().is_some(),
            self.values().is_some(),
            self.file().is_some(),
            self.date().is_some(),
            self.time().is_some(),
            self.time_range().is_some(),
            self.geo().is_some(),
            self.matrix().is_some(),
        ]
        .into_iter()
        .filter(|populated| *populated)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_populates_exactly_its_own_field() {
        let records = vec![
            ResponseRecord::RawValue("10".to_string()),
            ResponseRecord::Text("hello".to_string()),
            ResponseRecord::NullValue,
            ResponseRecord::Value(vec![1, 2]),
            ResponseRecord::File("./a/b.mp4".to_string()),
            ResponseRecord::Date(NaiveDate::from_ymd_opt(2021, 2, 1).unwrap()),
            ResponseRecord::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap()),
            ResponseRecord::TimeRange(TimeDelta::minutes(-25)),
            ResponseRecord::Geo(GeoPoint {
                latitude: 1.5,
                longitude: -2.0,
            }),
            ResponseRecord::Matrix(vec![MatrixRow::new("row1", vec![1])]),
        ];
        for (record, expected) in records.iter().zip(ResponseType::ALL) {
            assert_eq!(record.response_type(), expected);
            assert_eq!(record.populated_fields(), 1, "{record:?}");
        }
    }

    #[test]
    fn response_type_names_round_trip() {
        for kind in ResponseType::ALL {
            assert_eq!(kind.as_str().parse::<ResponseType>(), Ok(kind));
        }
        assert!("values".parse::<ResponseType>().is_err());
    }

    #[test]
    fn response_type_serializes_snake_case() {
        let json = serde_json::to_string(&ResponseType::TimeRange).unwrap();
        assert_eq!(json, "\"time_range\"");
    }
}
