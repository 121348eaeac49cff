//! JSON file reader for record imports.

use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{Error, Result};

/// Reads a JSON file whose root is an array of records.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened and [`Error::Parse`] if
/// it is not valid JSON or its root is not an array.
pub fn read_records(path: &Path) -> Result<Vec<Value>> {
    let file = File::open(path)?;
    let root: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::Parse(format!("Failed to parse JSON '{}': {}", path.display(), e)))?;

    match root {
        Value::Array(records) => Ok(records),
        other => Err(Error::Parse(format!(
            "'{}' must contain a JSON array, found {}",
            path.display(),
            json_type_name(&other)
        ))),
    }
}

/// Splits a record list into consecutive batches.
///
/// The whole file is parsed up front; iteration yields batches of at most
/// `batch_size` records in file order and ends after the last partial batch.
#[derive(Debug)]
pub struct JsonBatchReader {
    records: std::vec::IntoIter<Value>,
    batch_size: usize,
}

impl JsonBatchReader {
    /// Opens and parses a JSON array file.
    ///
    /// # Errors
    ///
    /// See [`read_records`].
    pub fn open(path: &Path, batch_size: usize) -> Result<Self> {
        Ok(Self::from_records(read_records(path)?, batch_size))
    }

    /// Batches records that are already in memory.
    #[must_use]
    pub fn from_records(records: Vec<Value>, batch_size: usize) -> Self {
        Self {
            records: records.into_iter(),
            batch_size: batch_size.max(1),
        }
    }

    /// Records not yet yielded.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl Iterator for JsonBatchReader {
    type Item = Vec<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<Value> = self.records.by_ref().take(self.batch_size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let batches = self.records.len().div_ceil(self.batch_size);
        (batches, Some(batches))
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "json_file_tests.rs"]
mod tests;
