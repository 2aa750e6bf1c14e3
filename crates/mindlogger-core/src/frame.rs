//! The report table.
//!
//! A [`ReportFrame`] is a polars [`DataFrame`] of scalar columns plus an
//! ordered list of nested columns holding parsed responses, parsed option
//! lists, or whole sub-records. Every column, scalar or nested, has the same
//! height. Column names are unique across both kinds.

use std::collections::HashSet;

use mindlogger_ingest::{column_strings, concat_diagonal};
use mindlogger_model::{OptionRecord, ResponseRecord};
use polars::prelude::{AnyValue, Column, DataFrame, IdxCa, IdxSize, IntoColumn};

use crate::error::{ProcessError, Result};

/// A non-scalar column of a [`ReportFrame`].
#[derive(Debug, Clone)]
pub enum NestedColumn {
    /// Decoded response cells.
    Response(Vec<Option<ResponseRecord>>),
    /// Decoded option lists.
    Options(Vec<Option<Vec<OptionRecord>>>),
    /// A struct column whose fields form a frame of their own.
    Record(Box<ReportFrame>),
}

impl NestedColumn {
    pub fn len(&self) -> usize {
        match self {
            NestedColumn::Response(values) => values.len(),
            NestedColumn::Options(values) => values.len(),
            NestedColumn::Record(record) => record.height(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NestedColumn::Response(_) => "response",
            NestedColumn::Options(_) => "options",
            NestedColumn::Record(_) => "record",
        }
    }

    /// Number of null rows. A record row is null when all its fields are.
    pub fn null_count(&self) -> usize {
        match self {
            NestedColumn::Response(values) => values.iter().filter(|v| v.is_none()).count(),
            NestedColumn::Options(values) => values.iter().filter(|v| v.is_none()).count(),
            NestedColumn::Record(record) => (0..record.height())
                .filter(|&row| record.is_null_row(row))
                .count(),
        }
    }

    /// A column of the same kind and shape with every row null.
    pub fn null_like(&self, height: usize) -> Result<NestedColumn> {
        Ok(match self {
            NestedColumn::Response(_) => NestedColumn::Response(vec![None; height]),
            NestedColumn::Options(_) => NestedColumn::Options(vec![None; height]),
            NestedColumn::Record(record) => {
                NestedColumn::Record(Box::new(record.null_like(height)?))
            }
        })
    }

    /// Gathers rows; indices must already be bounds-checked.
    fn gather(&self, indices: &[usize]) -> Result<NestedColumn> {
        Ok(match self {
            NestedColumn::Response(values) => {
                NestedColumn::Response(indices.iter().map(|&i| values[i].clone()).collect())
            }
            NestedColumn::Options(values) => {
                NestedColumn::Options(indices.iter().map(|&i| values[i].clone()).collect())
            }
            NestedColumn::Record(record) => NestedColumn::Record(Box::new(record.take(indices)?)),
        })
    }

    fn append(&mut self, name: &str, other: &NestedColumn) -> Result<()> {
        match (self, other) {
            (NestedColumn::Response(values), NestedColumn::Response(more)) => {
                values.extend_from_slice(more);
            }
            (NestedColumn::Options(values), NestedColumn::Options(more)) => {
                values.extend_from_slice(more);
            }
            (NestedColumn::Record(record), NestedColumn::Record(more)) => {
                **record = record.concat(more)?;
            }
            (this, _) => {
                return Err(ProcessError::ColumnKind {
                    column: name.to_string(),
                    expected: this.kind(),
                });
            }
        }
        Ok(())
    }

    fn write_key(&self, row: usize, key: &mut String) -> Result<()> {
        match self {
            NestedColumn::Response(values) => key.push_str(&format!("{:?}", values[row])),
            NestedColumn::Options(values) => key.push_str(&format!("{:?}", values[row])),
            NestedColumn::Record(record) => key.push_str(&record.row_key(row)?),
        }
        key.push('\u{1f}');
        Ok(())
    }
}

/// Report table with scalar and nested columns.
#[derive(Debug, Clone, Default)]
pub struct ReportFrame {
    data: DataFrame,
    nested: Vec<(String, NestedColumn)>,
    height: usize,
}

impl ReportFrame {
    /// Wraps a frame of scalar columns.
    pub fn new(data: DataFrame) -> Self {
        let height = data.height();
        Self {
            data,
            nested: Vec::new(),
            height,
        }
    }

    /// An empty frame of `height` rows to which columns are added.
    pub fn with_height(height: usize) -> Self {
        Self {
            data: DataFrame::empty(),
            nested: Vec::new(),
            height,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.data.width() + self.nested.len()
    }

    /// Scalar columns only.
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn nested_columns(&self) -> &[(String, NestedColumn)] {
        &self.nested
    }

    /// Scalar column names followed by nested column names.
    pub fn column_names(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .chain(self.nested.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.data.column(name).is_ok() || self.nested(name).is_some()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.data
            .column(name)
            .map_err(|_| ProcessError::missing_column(name))
    }

    pub fn nested(&self, name: &str) -> Option<&NestedColumn> {
        self.nested
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, column)| column)
    }

    /// Reads a scalar column as optional text.
    pub fn strings(&self, name: &str) -> Result<Vec<Option<String>>> {
        if self.data.column(name).is_err() {
            return Err(ProcessError::missing_column(name));
        }
        Ok(column_strings(&self.data, name)?)
    }

    /// Adds or replaces a scalar column. A replaced column keeps its position.
    pub fn with_column(&mut self, column: impl IntoColumn) -> Result<&mut Self> {
        let column = column.into_column();
        self.check_height(column.name().as_str(), column.len())?;
        let name = column.name().to_string();
        self.nested.retain(|(existing, _)| *existing != name);
        self.data.with_column(column)?;
        Ok(self)
    }

    /// Adds or replaces a nested column.
    pub fn with_nested(&mut self, name: impl Into<String>, column: NestedColumn) -> Result<&mut Self> {
        let name = name.into();
        self.check_height(&name, column.len())?;
        if self.data.column(&name).is_ok() {
            self.data = self.data.drop(&name)?;
        }
        match self.nested.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = column,
            None => self.nested.push((name, column)),
        }
        Ok(self)
    }

    fn check_height(&mut self, name: &str, len: usize) -> Result<()> {
        if self.width() == 0 && self.height == 0 {
            self.height = len;
        }
        if len != self.height {
            return Err(ProcessError::LengthMismatch {
                column: name.to_string(),
                expected: self.height,
                actual: len,
            });
        }
        Ok(())
    }

    /// Replaces a column, scalar or nested, by an all-null column of the
    /// same type.
    pub fn null_column(&mut self, name: &str) -> Result<()> {
        if let Ok(column) = self.data.column(name) {
            let nulls = Column::full_null(column.name().clone(), self.height, column.dtype());
            self.data.with_column(nulls)?;
            return Ok(());
        }
        let height = self.height;
        match self.nested.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, column)) => {
                *column = column.null_like(height)?;
                Ok(())
            }
            None => Err(ProcessError::missing_column(name)),
        }
    }

    /// Renames a column in place.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        if self.data.column(from).is_ok() {
            self.data.rename(from, to.into())?;
            return Ok(());
        }
        match self.nested.iter_mut().find(|(existing, _)| existing == from) {
            Some((name, _)) => {
                *name = to.to_string();
                Ok(())
            }
            None => Err(ProcessError::missing_column(from)),
        }
    }

    /// Drops the named columns; absent names are ignored.
    pub fn drop_columns(&self, names: &[&str]) -> Result<ReportFrame> {
        let mut out = self.clone();
        for name in names {
            if out.data.column(name).is_ok() {
                out.data = out.data.drop(name)?;
            }
            out.nested.retain(|(existing, _)| existing != name);
        }
        Ok(out)
    }

    /// Keeps the named columns in the given order.
    pub fn select(&self, names: &[&str]) -> Result<ReportFrame> {
        let mut out = ReportFrame::with_height(self.height);
        for name in names {
            if let Ok(column) = self.data.column(name) {
                out.with_column(column.clone())?;
            } else if let Some(nested) = self.nested(name) {
                out.with_nested(*name, nested.clone())?;
            } else {
                return Err(ProcessError::missing_column(*name));
            }
        }
        Ok(out)
    }

    /// Gathers rows by index, repeating or reordering as given.
    pub fn take(&self, indices: &[usize]) -> Result<ReportFrame> {
        if let Some(&row) = indices.iter().find(|&&row| row >= self.height) {
            return Err(ProcessError::RowOutOfBounds {
                row,
                height: self.height,
            });
        }
        let idx = IdxCa::from_vec(
            "idx".into(),
            indices.iter().map(|&row| row as IdxSize).collect(),
        );
        let data = if self.data.width() == 0 {
            DataFrame::empty()
        } else {
            self.data.take(&idx)?
        };
        let nested = self
            .nested
            .iter()
            .map(|(name, column)| Ok((name.clone(), column.gather(indices)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(ReportFrame {
            data,
            nested,
            height: indices.len(),
        })
    }

    /// A frame with this frame's columns and every value null.
    pub fn null_like(&self, height: usize) -> Result<ReportFrame> {
        let columns = self
            .data
            .get_columns()
            .iter()
            .map(|column| Column::full_null(column.name().clone(), height, column.dtype()))
            .collect::<Vec<_>>();
        let data = if columns.is_empty() {
            DataFrame::empty()
        } else {
            DataFrame::new(columns)?
        };
        let nested = self
            .nested
            .iter()
            .map(|(name, column)| Ok((name.clone(), column.null_like(height)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(ReportFrame {
            data,
            nested,
            height,
        })
    }

    /// Stacks `other` below this frame.
    ///
    /// Columns are the union of both frames in first-seen order; a column
    /// one side lacks is null for that side's rows. Nested columns of the
    /// same name must be of the same kind.
    pub fn concat(&self, other: &ReportFrame) -> Result<ReportFrame> {
        let data = match (self.data.width(), other.data.width()) {
            (0, 0) => DataFrame::empty(),
            _ => concat_diagonal(vec![
                self.scalar_block(),
                other.scalar_block(),
            ])?,
        };
        let mut nested = Vec::with_capacity(self.nested.len());
        for (name, column) in &self.nested {
            let mut combined = column.clone();
            match other.nested(name) {
                Some(more) => combined.append(name, more)?,
                None => combined.append(name, &column.null_like(other.height)?)?,
            }
            nested.push((name.clone(), combined));
        }
        for (name, column) in &other.nested {
            if self.nested(name).is_none() {
                let mut combined = column.null_like(self.height)?;
                combined.append(name, column)?;
                nested.push((name.clone(), combined));
            }
        }
        Ok(ReportFrame {
            data,
            nested,
            height: self.height + other.height,
        })
    }

    /// Scalar data padded to this frame's height when it has no columns.
    fn scalar_block(&self) -> DataFrame {
        if self.data.width() == 0 {
            DataFrame::empty_with_height(self.height)
        } else {
            self.data.clone()
        }
    }

    /// Replaces record column `name` by its fields, each renamed to
    /// `<prefix><field>`. A field named like an existing column replaces it.
    pub fn unnest_record(&self, name: &str, prefix: &str) -> Result<ReportFrame> {
        let Some(position) = self.nested.iter().position(|(existing, _)| existing == name) else {
            return Err(ProcessError::missing_column(name));
        };
        let NestedColumn::Record(record) = &self.nested[position].1 else {
            return Err(ProcessError::ColumnKind {
                column: name.to_string(),
                expected: "record",
            });
        };
        let mut out = self.clone();
        out.nested.remove(position);
        for column in record.data.get_columns() {
            let renamed = column
                .clone()
                .with_name(format!("{prefix}{}", column.name()).into());
            out.with_column(renamed)?;
        }
        for (field, column) in &record.nested {
            out.with_nested(format!("{prefix}{field}"), column.clone())?;
        }
        Ok(out)
    }

    /// Unnests every record column, recursively, with `<name>_` prefixes.
    pub fn flatten_records(&self) -> Result<ReportFrame> {
        let mut out = self.clone();
        while let Some(name) = out
            .nested
            .iter()
            .find(|(_, column)| matches!(column, NestedColumn::Record(_)))
            .map(|(name, _)| name.clone())
        {
            out = out.unnest_record(&name, &format!("{name}_"))?;
        }
        Ok(out)
    }

    fn is_null_row(&self, row: usize) -> bool {
        let scalars_null = self
            .data
            .get_columns()
            .iter()
            .all(|column| matches!(column.get(row), Ok(AnyValue::Null) | Err(_)));
        scalars_null
            && self.nested.iter().all(|(_, column)| match column {
                NestedColumn::Response(values) => values[row].is_none(),
                NestedColumn::Options(values) => values[row].is_none(),
                NestedColumn::Record(record) => record.is_null_row(row),
            })
    }

    /// Text key identifying the full contents of one row.
    pub fn row_key(&self, row: usize) -> Result<String> {
        let mut key = String::new();
        for column in self.data.get_columns() {
            key.push_str(&format!("{:?}", column.get(row)?));
            key.push('\u{1f}');
        }
        for (_, column) in &self.nested {
            column.write_key(row, &mut key)?;
        }
        Ok(key)
    }

    /// Indices of the first occurrence of each distinct row.
    pub fn distinct_row_indices(&self) -> Result<Vec<usize>> {
        let mut seen = HashSet::with_capacity(self.height);
        let mut keep = Vec::new();
        for row in 0..self.height {
            if seen.insert(self.row_key(row)?) {
                keep.push(row);
            }
        }
        Ok(keep)
    }

    /// Removes repeated rows, keeping first occurrences in order.
    pub fn distinct(&self) -> Result<ReportFrame> {
        let keep = self.distinct_row_indices()?;
        if keep.len() == self.height {
            return Ok(self.clone());
        }
        self.take(&keep)
    }

    /// Discards nested columns and returns the scalar data.
    pub fn into_data(self) -> DataFrame {
        self.data
    }
}

impl From<DataFrame> for ReportFrame {
    fn from(data: DataFrame) -> Self {
        ReportFrame::new(data)
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{NamedFrom, Series};

    use super::*;

    fn frame(columns: &[(&str, &[&str])]) -> ReportFrame {
        ReportFrame::new(
            DataFrame::new(
                columns
                    .iter()
                    .map(|(name, values)| Series::new((*name).into(), values.to_vec()).into_column())
                    .collect(),
            )
            .unwrap(),
        )
    }

    fn responses(values: &[Option<&str>]) -> NestedColumn {
        NestedColumn::Response(
            values
                .iter()
                .map(|value| value.map(|text| ResponseRecord::RawValue(text.to_string())))
                .collect(),
        )
    }

    #[test]
    fn take_gathers_nested_columns() {
        let mut report = frame(&[("id", &["a", "b", "c"])]);
        report
            .with_nested("response", responses(&[Some("1"), None, Some("3")]))
            .unwrap();

        let taken = report.take(&[2, 2, 0]).unwrap();
        assert_eq!(taken.height(), 3);
        let Some(NestedColumn::Response(values)) = taken.nested("response") else {
            panic!("response column missing");
        };
        assert_eq!(values[0], Some(ResponseRecord::RawValue("3".into())));
        assert_eq!(values[2], Some(ResponseRecord::RawValue("1".into())));
        assert!(report.take(&[3]).is_err());
    }

    #[test]
    fn nested_column_height_is_checked() {
        let mut report = frame(&[("id", &["a", "b"])]);
        let err = report
            .with_nested("response", responses(&[None]))
            .unwrap_err();
        assert!(matches!(err, ProcessError::LengthMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn unnest_prefixes_fields() {
        let mut report = frame(&[("item_response", &["x", "y"])]);
        let record = frame(&[("id", &["1", "2"]), ("name", &["q1", "q2"])]);
        report
            .with_nested("item", NestedColumn::Record(Box::new(record)))
            .unwrap();

        let flat = report.flatten_records().unwrap();
        assert_eq!(
            flat.column_names(),
            vec!["item_response", "item_id", "item_name"]
        );
        assert_eq!(
            flat.column("item_name").unwrap().get(1).unwrap(),
            AnyValue::String("q2")
        );
    }

    #[test]
    fn concat_fills_missing_columns_with_nulls() {
        let mut first = frame(&[("id", &["a"])]);
        first
            .with_nested("response", responses(&[Some("1")]))
            .unwrap();
        let second = frame(&[("id", &["b"]), ("extra", &["e"])]);

        let combined = first.concat(&second).unwrap();
        assert_eq!(combined.height(), 2);
        assert_eq!(combined.column("extra").unwrap().null_count(), 1);
        assert_eq!(combined.nested("response").unwrap().null_count(), 1);
    }

    #[test]
    fn distinct_keeps_first_occurrence() {
        let mut report = frame(&[("id", &["a", "b", "a", "a"])]);
        report
            .with_nested(
                "response",
                responses(&[Some("1"), Some("1"), Some("1"), Some("2")]),
            )
            .unwrap();
        assert_eq!(report.distinct_row_indices().unwrap(), vec![0, 1, 3]);
    }

    #[test]
    fn select_and_drop() {
        let report = frame(&[("a", &["1"]), ("b", &["2"]), ("c", &["3"])]);
        let selected = report.select(&["c", "a"]).unwrap();
        assert_eq!(selected.column_names(), vec!["c", "a"]);
        assert!(report.select(&["missing"]).is_err());
        let dropped = report.drop_columns(&["b", "missing"]).unwrap();
        assert_eq!(dropped.column_names(), vec!["a", "c"]);
    }
}
