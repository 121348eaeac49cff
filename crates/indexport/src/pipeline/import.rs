//! Batched import into an index.

use futures::future::join_all;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{create_progress_bar, Interrupt};
use crate::config::ImportJob;
use crate::connectors::csv_file::{read_csv_records, CsvOptions};
use crate::connectors::json_file::{read_records, JsonBatchReader};
use crate::connectors::SearchIndex;
use crate::error::{Error, Result};
use crate::transform::Transformer;

/// Import statistics.
#[derive(Debug, Default, Clone)]
pub struct ImportStats {
    /// Records read from the source.
    pub records: usize,
    /// Records accepted by the service.
    pub submitted: usize,
    /// Batches dispatched.
    pub batches: usize,
    /// Ordinals of rejected batches, ascending.
    pub failed_batches: Vec<usize>,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl ImportStats {
    /// Calculate throughput (records per second).
    #[must_use]
    pub fn throughput(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.submitted as f64 / self.duration_secs
        } else {
            0.0
        }
    }
}

/// Batches from a JSON file, a CSV file or a directory of both.
///
/// Directory entries are read one at a time in lexical order and batches
/// never span two files.
#[derive(Debug)]
pub struct ImportSource {
    files: std::vec::IntoIter<PathBuf>,
    current: Option<JsonBatchReader>,
    batch_size: usize,
    csv: CsvOptions,
}

impl ImportSource {
    /// Opens a file or directory source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a directory without `.json` or
    /// `.csv` files and an IO error if it cannot be listed.
    pub fn open(path: &Path, batch_size: usize) -> Result<Self> {
        let files = if path.is_dir() {
            let files = list_source_files(path)?;
            if files.is_empty() {
                return Err(Error::Validation(format!(
                    "-s/--source '{}' contains no .json or .csv files",
                    path.display()
                )));
            }
            files
        } else {
            vec![path.to_path_buf()]
        };

        Ok(Self {
            files: files.into_iter(),
            current: None,
            batch_size,
            csv: CsvOptions::default(),
        })
    }

    fn load(&self, path: &Path) -> Result<Vec<Value>> {
        if has_extension(path, "csv") {
            read_csv_records(path, &self.csv)
        } else {
            read_records(path)
        }
    }
}

impl Iterator for ImportSource {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(batch) = self.current.as_mut().and_then(Iterator::next) {
                return Some(Ok(batch));
            }
            let path = self.files.next()?;
            match self.load(&path) {
                Ok(records) => {
                    debug!("Read {} records from {}", records.len(), path.display());
                    self.current = Some(JsonBatchReader::from_records(records, self.batch_size));
                }
                Err(e) => {
                    self.files = Vec::new().into_iter();
                    self.current = None;
                    return Some(Err(e));
                }
            }
        }
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn list_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && (has_extension(&path, "json") || has_extension(&path, "csv")) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Submission settings of an import.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Batches submitted per window.
    pub max_concurrency: usize,
    /// Wait for every batch task to be published.
    pub wait: bool,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
    /// Expected record count for the progress bar; 0 when unknown.
    pub expected_records: u64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            max_concurrency: crate::config::DEFAULT_MAX_CONCURRENCY,
            wait: false,
            show_progress: false,
            expected_records: 0,
        }
    }
}

/// Submits batches to an index in fixed-width windows.
///
/// Up to `max_concurrency` batches are read, transformed and submitted
/// together; the next window is read only once the whole window settled. A
/// rejected batch does not stop the others.
pub struct ImportPipeline<'a> {
    index: &'a dyn SearchIndex,
    transformer: &'a Transformer,
    options: ImportOptions,
    interrupt: Interrupt,
}

impl<'a> ImportPipeline<'a> {
    /// Creates a pipeline writing to `index`.
    #[must_use]
    pub fn new(index: &'a dyn SearchIndex, transformer: &'a Transformer, options: ImportOptions) -> Self {
        Self {
            index,
            transformer,
            options,
            interrupt: Interrupt::new(),
        }
    }

    /// Stops dispatching new windows once `interrupt` is triggered.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Run the import.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BatchFailures`] if any batch was rejected,
    /// [`Error::Interrupted`] if interrupted, or the first read or
    /// transformation error.
    pub async fn run<I>(&self, batches: I) -> Result<ImportStats>
    where
        I: IntoIterator<Item = Result<Vec<Value>>>,
    {
        let start = Instant::now();
        let mut stats = ImportStats::default();
        let failures = AtomicUsize::new(0);
        let width = self.options.max_concurrency.max(1);
        let progress = create_progress_bar(self.options.expected_records, self.options.show_progress);
        let mut batches = batches.into_iter();

        info!(
            "Importing into '{}' ({} concurrent batches)",
            self.index.index_name(),
            width
        );

        loop {
            if self.interrupt.is_triggered() {
                progress.abandon_with_message("Cancelled");
                warn!(
                    "Import interrupted after {} batches ({} records submitted)",
                    stats.batches, stats.submitted
                );
                return Err(Error::Interrupted);
            }

            let mut window = Vec::with_capacity(width);
            for batch in batches.by_ref().take(width) {
                let batch = batch?;
                stats.records += batch.len();
                let batch = self.transformer.transform_batch(batch).await?;
                window.push((stats.batches, batch));
                stats.batches += 1;
            }
            if window.is_empty() {
                break;
            }

            let results = join_all(
                window
                    .iter()
                    .map(|(ordinal, batch)| self.submit(*ordinal, batch, &failures)),
            )
            .await;

            for ((ordinal, batch), accepted) in window.iter().zip(results) {
                if accepted {
                    stats.submitted += batch.len();
                    progress.inc(batch.len() as u64);
                } else {
                    stats.failed_batches.push(*ordinal);
                }
            }
        }

        progress.finish_and_clear();
        stats.duration_secs = start.elapsed().as_secs_f64();

        if !stats.failed_batches.is_empty() {
            warn!(
                "{} of {} batches failed; {} of {} records submitted",
                failures.load(Ordering::SeqCst),
                stats.batches,
                stats.submitted,
                stats.records
            );
            return Err(Error::BatchFailures {
                failed: stats.failed_batches,
                total: stats.batches,
            });
        }

        info!(
            "Import complete: {} records in {} batches in {:.2}s ({:.0} records/sec)",
            stats.submitted,
            stats.batches,
            stats.duration_secs,
            stats.throughput()
        );
        Ok(stats)
    }

    async fn submit(&self, ordinal: usize, batch: &[Value], failures: &AtomicUsize) -> bool {
        let result = async {
            let task = self.index.add_objects(batch).await?;
            if self.options.wait {
                self.index.wait_task(task.task_id).await?;
            }
            Ok::<_, Error>(task)
        }
        .await;

        match result {
            Ok(task) => {
                debug!(
                    "Batch {} accepted: {} records, task {}",
                    ordinal,
                    batch.len(),
                    task.task_id
                );
                true
            }
            Err(e) => {
                let failed = failures.fetch_add(1, Ordering::SeqCst) + 1;
                warn!("Batch {} failed ({} failed so far): {}", ordinal, failed, e);
                false
            }
        }
    }
}

/// Runs an `import` job against `index`.
///
/// # Errors
///
/// See [`ImportPipeline::run`].
pub async fn run(index: &dyn SearchIndex, job: &ImportJob, interrupt: &Interrupt) -> Result<ImportStats> {
    let transformer = Transformer::load(job.transform.as_deref())?;
    let source = ImportSource::open(&job.source, job.batch_size)?;

    if job.clear {
        info!("Clearing index '{}'", index.index_name());
        let task = index.clear_index().await?;
        index.wait_task(task.task_id).await?;
    }

    let options = ImportOptions {
        max_concurrency: job.max_concurrency,
        wait: job.wait,
        show_progress: true,
        expected_records: 0,
    };
    ImportPipeline::new(index, &transformer, options)
        .with_interrupt(interrupt.clone())
        .run(source)
        .await
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;
