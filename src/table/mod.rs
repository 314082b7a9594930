//! # Annotation tables
//!
//! Tab-separated tables produced by the upstream annotation tools, read with
//! the `csv` crate. A [`Row`] gives typed access to its fields under one
//! missing-value policy: empty cells and the usual null markers (`NaN`,
//! `nan`, `NA`, `null`, ...) are absent, never placeholder values.

mod error;


use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use log::warn;

pub use error::{RowError, TableError};

/// Cell contents treated as "no value"
pub const MISSING_MARKERS: &[&str] = &[
    "", "NaN", "nan", "NAN", "NA", "N/A", "n/a", "#N/A", "NULL", "null", "None", "<NA>",
];

/// Whether a raw cell value counts as absent
pub fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value.trim())
}

/// An in-memory tab-separated table with a header row
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    records: Vec<(usize, csv::StringRecord)>,
    unreadable: usize,
}

impl Table {
    /// Read a TSV file.
    ///
    /// Returns `Ok(None)` when the file does not exist so callers can decide
    /// whether a missing table is fatal.
    pub fn open_tsv<P: AsRef<Path>>(path: P) -> Result<Option<Self>, TableError> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Self::from_reader(BufReader::new(file), b'\t').map(Some)
    }

    /// Parse a table from any reader with the given delimiter.
    ///
    /// A record that cannot be decoded (invalid UTF-8, broken quoting) is
    /// logged and left out; only a broken header fails the table.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut index = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            // First occurrence wins for duplicated headers
            index.entry(header.clone()).or_insert(i);
        }

        let mut records = Vec::new();
        let mut unreadable = 0;
        for (i, result) in csv_reader.records().enumerate() {
            // 1-based, header is line 1
            let fallback_line = i + 2;
            match result {
                Ok(record) => {
                    let line = record
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(fallback_line);
                    records.push((line, record));
                }
                Err(e) => {
                    let line = e
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(fallback_line);
                    warn!("line {}: unreadable record skipped ({})", line, e);
                    unreadable += 1;
                }
            }
        }

        Ok(Self {
            headers,
            index,
            records,
            unreadable,
        })
    }

    /// Column names in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Whether the table has a column with this exact name
    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Required columns that the header does not contain
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records that could not be decoded and were left out
    pub fn unreadable_rows(&self) -> usize {
        self.unreadable
    }

    /// Iterate over rows in file order
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records.iter().map(move |(line, record)| Row {
            table: self,
            record,
            line: *line,
        })
    }
}

/// One data row of a [`Table`]
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    record: &'a csv::StringRecord,
    line: usize,
}

impl<'a> Row<'a> {
    /// 1-based line number in the source file
    pub fn line(&self) -> usize {
        self.line
    }

    /// Raw trimmed value, or `None` when the column is absent or the cell is missing
    pub fn value(&self, column: &str) -> Option<&'a str> {
        let idx = *self.table.index.get(column)?;
        let raw = self.record.get(idx)?.trim();
        if is_missing(raw) {
            None
        } else {
            Some(raw)
        }
    }

    /// Text value under the missing-value policy
    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.value(column)
    }

    /// Floating point value; unparsable and non-finite values are absent
    pub fn float(&self, column: &str) -> Option<f64> {
        self.value(column)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Integer value, accepting integral floats such as `"3.0"`
    pub fn integer(&self, column: &str) -> Option<i64> {
        let raw = self.value(column)?;
        if let Ok(v) = raw.parse::<i64>() {
            return Some(v);
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 => Some(v as i64),
            _ => None,
        }
    }

    /// Value of a field the row cannot do without
    pub fn require(&self, column: &str) -> Result<&'a str, RowError> {
        self.value(column).ok_or_else(|| RowError::MissingField {
            line: self.line,
            field: column.to_string(),
        })
    }
}
