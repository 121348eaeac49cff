//! Full-index export by browsing.

use serde_json::Value;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use super::{write_output, Interrupt};
use crate::config::ExportJob;
use crate::connectors::{SearchIndex, SearchParams};
use crate::error::{Error, Result};

/// Export statistics.
#[derive(Debug, Default, Clone)]
pub struct ExportStats {
    /// Records exported.
    pub hits: usize,
    /// Browse pages fetched.
    pub pages: usize,
    /// File written; `None` for stdout.
    pub output: Option<PathBuf>,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// Browses every record matching `params`, following the cursor to the end.
///
/// # Errors
///
/// Returns the first service error, or [`Error::Interrupted`] between pages.
pub async fn export_hits(
    index: &dyn SearchIndex,
    params: &SearchParams,
    interrupt: &Interrupt,
) -> Result<(Vec<Value>, usize)> {
    let mut hits = Vec::new();
    let mut pages = 0;
    let mut cursor: Option<String> = None;

    loop {
        if interrupt.is_triggered() {
            return Err(Error::Interrupted);
        }
        let page = index.browse(params, cursor.as_deref()).await?;
        pages += 1;
        debug!("Page {}: {} hits", pages, page.hits.len());
        hits.extend(page.hits);

        match page.cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok((hits, pages))
}

/// File name used when `-o` is a directory.
#[must_use]
pub fn export_file_name(index_name: &str) -> String {
    format!("algolia-index-{}.json", index_name)
}

/// Runs an `export` job.
///
/// # Errors
///
/// See [`export_hits`]; also fails if the output cannot be written.
pub async fn run(index: &dyn SearchIndex, job: &ExportJob, interrupt: &Interrupt) -> Result<ExportStats> {
    let start = Instant::now();
    info!("Exporting index '{}'", index.index_name());

    let (hits, pages) = export_hits(index, &job.params, interrupt).await?;
    let count = hits.len();
    let output = write_output(
        job.output.as_deref(),
        &export_file_name(index.index_name()),
        &Value::Array(hits),
        false,
    )?;

    let stats = ExportStats {
        hits: count,
        pages,
        output,
        duration_secs: start.elapsed().as_secs_f64(),
    };
    info!(
        "Exported {} records in {} pages in {:.2}s",
        stats.hits, stats.pages, stats.duration_secs
    );
    info!("Done exporting index.");
    Ok(stats)
}
