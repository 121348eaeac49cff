//! One-off search query.

use serde_json::Value;
use tracing::info;

use super::write_output;
use crate::config::SearchJob;
use crate::connectors::SearchIndex;
use crate::error::Result;

/// File name used when `-o` is a directory.
pub const SEARCH_FILE_NAME: &str = "search-results.json";

/// Runs a `search` job and writes the raw response.
///
/// # Errors
///
/// Returns the service error or an output error.
pub async fn run(index: &dyn SearchIndex, job: &SearchJob) -> Result<Value> {
    let response = index.search(&job.query, &job.params).await?;
    if let Some(hits) = response.get("nbHits").and_then(Value::as_u64) {
        info!("'{}' matched {} records", job.query, hits);
    }
    write_output(job.output.as_deref(), SEARCH_FILE_NAME, &response, false)?;
    Ok(response)
}
