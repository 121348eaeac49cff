//! JSON Lines to JSON array conversion.

use serde_json::Value;
use std::io::BufRead;
use std::path::Path;
use tracing::info;

use super::write_json_array;
use crate::config::TransformLinesJob;
use crate::error::{Error, Result};
use crate::transform::Transformer;

/// Parses a JSON Lines file, skipping blank lines.
///
/// # Errors
///
/// Returns [`Error::Parse`] naming the 1-based number of the first bad line.
pub fn read_json_lines(path: &Path) -> Result<Vec<Value>> {
    let reader = std::io::BufReader::new(std::fs::File::open(path)?);
    let mut values = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line).map_err(|e| {
            Error::Parse(format!("{} line {}: {}", path.display(), number + 1, e))
        })?;
        values.push(value);
    }
    Ok(values)
}

/// Runs a `transformlines` job. Returns the number of records written.
///
/// # Errors
///
/// Returns a parse, transformation or IO error.
pub async fn run(job: &TransformLinesJob) -> Result<usize> {
    let transformer = Transformer::load(job.transform.as_deref())?;
    let values = read_json_lines(&job.source)?;
    let values = transformer.transform_batch(values).await?;

    write_json_array(&job.output, &values)?;
    info!("Wrote {} records to {}", values.len(), job.output.display());
    Ok(values.len())
}
