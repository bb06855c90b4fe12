//! Tabular results of a decode
//!
//! A [`Frame`] is a small row-oriented table: an ordered list of column names
//! and rows of [`Value`]s. Decoders build one row per record and
//! concatenate them; callers read columns back, filter rows, or iterate row
//! views that serialize as `{column: value}` maps.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Result, TraceError};
use crate::types::Value;

/// Row-oriented table of decoded values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    /// Create an empty frame with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a frame from rows already shaped like `columns`
    pub(crate) fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Append a row; it must have one cell per column
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(TraceError::ColumnMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Cell at `row` in column `name`
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// One column coerced to `f64` (unparsable cells become NaN)
    pub fn column_f64(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name).map(|col| col.map(Value::as_f64).collect())
    }

    /// Smallest finite value of a column
    pub fn min(&self, name: &str) -> Option<f64> {
        self.column(name)?
            .map(Value::as_f64)
            .filter(|v| v.is_finite())
            .reduce(f64::min)
    }

    /// Largest finite value of a column
    pub fn max(&self, name: &str) -> Option<f64> {
        self.column(name)?
            .map(Value::as_f64)
            .filter(|v| v.is_finite())
            .reduce(f64::max)
    }

    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows.get(index).map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    /// Row views, each serializable as an ordered `{column: value}` map
    pub fn rows(&self) -> impl ExactSizeIterator<Item = RowRef<'_>> + '_ {
        self.rows.iter().map(move |values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    /// Copy of the rows matching `keep`
    pub fn filter<F>(&self, mut keep: F) -> Frame
    where
        F: FnMut(&RowRef<'_>) -> bool,
    {
        let rows = self
            .rows()
            .filter(|row| keep(row))
            .map(|row| row.values.to_vec())
            .collect();
        Frame {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Drop the rows not matching `keep`, in place
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&RowRef<'_>) -> bool,
    {
        let columns = &self.columns;
        self.rows.retain(|values| keep(&RowRef { columns, values }));
    }

    /// Concatenate frames top to bottom
    ///
    /// The result's columns are the union of the inputs' columns in
    /// first-seen order. Cells for columns a frame does not have are `Null`.
    pub fn concat<I>(frames: I) -> Frame
    where
        I: IntoIterator<Item = Frame>,
    {
        let mut out = Frame::default();
        for frame in frames {
            if out.columns.is_empty() && out.rows.is_empty() {
                out = frame;
                continue;
            }

            if frame.columns == out.columns {
                out.rows.extend(frame.rows);
                continue;
            }

            for col in &frame.columns {
                if !out.has_column(col) {
                    out.columns.push(col.clone());
                    for row in &mut out.rows {
                        row.push(Value::Null);
                    }
                }
            }

            let mapping: Vec<usize> = frame
                .columns
                .iter()
                .filter_map(|c| out.column_index(c))
                .collect();
            for row in frame.rows {
                let mut merged = vec![Value::Null; out.columns.len()];
                for (value, &idx) in row.into_iter().zip(&mapping) {
                    merged[idx] = value;
                }
                out.rows.push(merged);
            }
        }
        out
    }
}

/// Borrowed view of one row
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> RowRef<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx)
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// `(column, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl Serialize for RowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Keep only rows whose time columns hold finite numbers
///
/// Every listed column that exists in the frame is coerced to a number; a row
/// survives only if all of them are finite (NaN, infinities and non-numeric
/// text are dropped). Columns the frame does not have are ignored. This is
/// how garbage decoded from a corrupt trailing record is discarded.
pub fn validate_time_columns(mut frame: Frame, columns: &[&str]) -> Frame {
    if frame.is_empty() {
        return frame;
    }

    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|c| frame.column_index(c))
        .collect();
    if indices.is_empty() {
        return frame;
    }

    let before = frame.len();
    frame.retain(|row| indices.iter().all(|&i| row.values()[i].is_finite()));
    if frame.len() != before {
        tracing::debug!(
            "Dropped {} rows with non-finite time values",
            before - frame.len()
        );
    }
    frame
}
