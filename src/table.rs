//! In-memory numeric tables and the batches cut from them.
//!
//! # Coercion
//!
//! Every cell becomes an `f64`:
//! - integers and floats parse as-is (`"3"`, `"-1.5e3"`, `"NaN"`, `"inf"`)
//! - `true` / `false` (any case) become `1.0` / `0.0`
//! - an empty cell is `NaN`
//! - anything else is a [`DatasetError::Parse`]
//!
//! Rows of different width are rejected by the CSV reader.

use crate::error::DatasetError;
use serde::Serialize;
use std::io::Read;

/// Row-major `f64` table with named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    values: Vec<f64>,
    rows: usize,
}

impl Table {
    /// Zero rows, no columns.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from explicit rows.
    ///
    /// # Errors
    /// Returns [`DatasetError::Parse`] if a row's width differs from `columns`.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, DatasetError> {
        let mut values = Vec::with_capacity(rows.len() * columns.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DatasetError::parse(
                    "<memory>",
                    format!(
                        "row {} has {} values, expected {}",
                        i + 1,
                        row.len(),
                        columns.len()
                    ),
                ));
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            columns,
            values,
            rows: rows.len(),
        })
    }

    /// Parse a headed CSV stream.
    ///
    /// `source` names the object in error messages.
    ///
    /// # Errors
    /// Returns [`DatasetError::Parse`] on malformed CSV or a non-numeric cell.
    pub fn from_csv<R: Read>(reader: R, source: &str, delimiter: u8) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_reader(reader);

        let columns: Vec<String> = rdr
            .headers()
            .map_err(|e| DatasetError::parse(source, format!("read header: {e}")))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut values = Vec::new();
        let mut rows = 0usize;
        for (i, record) in rdr.records().enumerate() {
            let record = record
                .map_err(|e| DatasetError::parse(source, format!("CSV record #{}: {e}", i + 1)))?;
            for (col, cell) in record.iter().enumerate() {
                let value = parse_cell(cell).ok_or_else(|| {
                    DatasetError::parse(
                        source,
                        format!(
                            "CSV record #{}, column {:?}: {cell:?} is not numeric",
                            i + 1,
                            columns.get(col).map_or("?", String::as_str)
                        ),
                    )
                })?;
                values.push(value);
            }
            rows += 1;
        }

        Ok(Self {
            columns,
            values,
            rows,
        })
    }

    /// Concatenate tables row-wise, in order.
    ///
    /// The first table with columns fixes the schema; tables with neither rows
    /// nor columns (empty objects) are skipped.
    ///
    /// # Errors
    /// Returns [`DatasetError::SchemaMismatch`] naming the first disagreeing source.
    pub fn concat<S, I>(parts: I) -> Result<Self, DatasetError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, Table)>,
    {
        let mut out = Table::empty();
        for (source, part) in parts {
            if part.columns.is_empty() && part.rows == 0 {
                continue;
            }
            if out.columns.is_empty() && out.rows == 0 {
                out.columns = part.columns;
            } else if out.columns != part.columns {
                return Err(DatasetError::SchemaMismatch {
                    object: source.as_ref().to_string(),
                    expected: out.columns,
                    found: part.columns,
                });
            }
            out.values.extend(part.values);
            out.rows += part.rows;
        }
        Ok(out)
    }

    /// Number of rows (the dataset size).
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row `index`, or `None` past the end.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.rows {
            return None;
        }
        let width = self.columns.len();
        Some(&self.values[index * width..(index + 1) * width])
    }

    /// Copy the rows at `indices` into a batch, in the given order.
    ///
    /// # Panics
    /// Panics if an index is out of range; callers reduce indices modulo [`Table::len`].
    #[must_use]
    pub fn gather<I>(&self, indices: I) -> Batch
    where
        I: IntoIterator<Item = usize>,
    {
        let width = self.columns.len();
        let mut values = Vec::new();
        let mut rows = 0usize;
        for index in indices {
            values.extend_from_slice(&self.values[index * width..(index + 1) * width]);
            rows += 1;
        }
        Batch {
            rows,
            columns: width,
            values,
        }
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(f64::NAN);
    }
    if cell.eq_ignore_ascii_case("true") {
        return Some(1.0);
    }
    if cell.eq_ignore_ascii_case("false") {
        return Some(0.0);
    }
    cell.parse::<f64>().ok()
}

/// A rectangular `(rows, columns)` block of `f64`, row-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch {
    rows: usize,
    columns: usize,
    values: Vec<f64>,
}

impl Batch {
    /// `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.rows {
            return None;
        }
        Some(&self.values[index * self.columns..(index + 1) * self.columns])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).filter_map(|i| self.row(i))
    }

    /// The flat row-major buffer.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }
}
