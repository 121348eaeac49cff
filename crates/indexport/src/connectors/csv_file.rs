//! CSV file reader: converts rows into JSON records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::path::Path;

use crate::error::{Error, Result};

/// CSV dialect and cell conversion options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Quote character.
    #[serde(default = "default_quote")]
    pub quote: char,
    /// Whether the first row holds column names.
    #[serde(default = "default_has_header")]
    pub has_header: bool,
    /// Explicit column names, replacing the header row when there is one.
    #[serde(default)]
    pub headers: Vec<String>,
    /// Trim whitespace around headers and cells.
    #[serde(default)]
    pub trim: bool,
    /// Convert numeric and boolean cells; otherwise every cell is a string.
    #[serde(default)]
    pub check_type: bool,
}

fn default_delimiter() -> char {
    ','
}
fn default_quote() -> char {
    '"'
}
fn default_has_header() -> bool {
    true
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            quote: default_quote(),
            has_header: default_has_header(),
            headers: Vec::new(),
            trim: false,
            check_type: false,
        }
    }
}

impl CsvOptions {
    fn reader_builder(&self) -> Result<csv::ReaderBuilder> {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(ascii_byte("--delimiter", self.delimiter)?)
            .quote(ascii_byte("--quote", self.quote)?)
            .has_headers(self.has_header)
            .flexible(true)
            .trim(if self.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            });
        Ok(builder)
    }
}

fn ascii_byte(flag: &str, c: char) -> Result<u8> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| Error::Validation(format!("{} must be a single ASCII character", flag)))
}

/// Reads every row of a CSV file as a JSON object.
///
/// Column names come from `options.headers`, else from the header row, else
/// `field1..fieldN`. Cells beyond the known columns are named by position;
/// short rows simply omit the missing keys.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a non-ASCII delimiter or quote,
/// [`Error::Io`] if the file cannot be read and [`Error::Parse`] for
/// malformed content.
pub fn read_csv_records(path: &Path, options: &CsvOptions) -> Result<Vec<Value>> {
    let mut reader = options
        .reader_builder()?
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let headers: Vec<String> = if !options.headers.is_empty() {
        options.headers.clone()
    } else if options.has_header {
        reader
            .headers()
            .map_err(|e| csv_error(path, e))?
            .iter()
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| csv_error(path, e))?;
        let mut object = Map::with_capacity(row.len());
        for (position, cell) in row.iter().enumerate() {
            let key = headers
                .get(position)
                .cloned()
                .unwrap_or_else(|| format!("field{}", position + 1));
            object.insert(key, convert_cell(cell, options.check_type));
        }
        records.push(Value::Object(object));
    }
    Ok(records)
}

fn csv_error(path: &Path, error: csv::Error) -> Error {
    if error.is_io_error() {
        if let csv::ErrorKind::Io(io) = error.into_kind() {
            return Error::Io(io);
        }
        return Error::Parse(format!("Failed to read CSV '{}'", path.display()));
    }
    Error::Parse(format!("Failed to parse CSV '{}': {}", path.display(), error))
}

/// Converts one cell: integer, then number as written, then float, then
/// boolean, else string.
pub fn convert_cell(cell: &str, check_type: bool) -> Value {
    if !check_type {
        return Value::String(cell.to_string());
    }
    if let Ok(n) = cell.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = cell.parse::<Number>() {
        return Value::Number(n);
    }
    if let Some(n) = cell.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    match cell {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

#[cfg(test)]
#[path = "csv_file_tests.rs"]
mod tests;
