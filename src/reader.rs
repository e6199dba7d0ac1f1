use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;

use crate::error::Result;

/// One CSV data line keyed by trimmed header name.
///
/// Values are trimmed; blank and missing trailing fields are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// First non-blank value among `columns`, in order.
    pub fn get_any(&self, columns: &[&str]) -> Option<&str> {
        columns.iter().find_map(|c| self.get(c))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .filter_map(|(k, v)| {
                let v: String = v.into();
                let v = v.trim();
                (!v.is_empty()).then(|| (k.into(), v.to_string()))
            })
            .collect();
        Self { fields }
    }
}

/// Parse raw CSV text into rows, in input order.
///
/// The first line is the header. Quoted fields may contain commas and
/// newlines. Lines with no non-blank value are skipped. Header names are
/// trimmed; when two trim to the same name the later column wins.
pub fn parse(raw_text: &str) -> Result<Vec<RawRow>> {
    if raw_text.trim().is_empty() {
        return Ok(Vec::new());
    }

    // Read the header as an ordinary row so duplicate names survive parsing
    let cursor = Cursor::new(raw_text.as_bytes().to_vec());
    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0)) // all columns as String
        .map_parse_options(|opts| opts.with_truncate_ragged_lines(true))
        .into_reader_with_file_handle(cursor)
        .finish()?;

    let columns: Vec<&StringChunked> = df
        .get_columns()
        .iter()
        .map(|c| c.str())
        .collect::<PolarsResult<_>>()?;

    // Trim whitespace (and stray carriage returns) from header names
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for (idx, values) in columns.iter().enumerate() {
        let name = values.get(0).unwrap_or_default().trim();
        if !name.is_empty() {
            by_name.insert(name.to_string(), idx);
        }
    }
    let named: Vec<(&str, &StringChunked)> = by_name
        .iter()
        .map(|(name, &idx)| (name.as_str(), columns[idx]))
        .collect();

    let mut rows = Vec::with_capacity(df.height().saturating_sub(1));
    for i in 1..df.height() {
        let row: RawRow = named
            .iter()
            .filter_map(|(name, values)| values.get(i).map(|v| (*name, v)))
            .collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Read a CSV file and parse it. An unreadable file is an error.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<RawRow>> {
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}
