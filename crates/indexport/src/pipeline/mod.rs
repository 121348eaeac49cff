//! Command pipelines.
//!
//! Each validated [`Job`] runs as one linear pipeline: acquire records or
//! settings, apply the user transformation, submit, report. Pipelines never
//! retry; transient service failures are retried by the client itself.

pub mod csv_json;
pub mod export;
pub mod import;
pub mod lines;
pub mod search;
pub mod settings;
pub mod transfer;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::config::{ClientOptions, IndexTarget, Job};
use crate::connectors::algolia::{AlgoliaClient, AlgoliaIndex};
use crate::error::Result;

pub use export::{export_hits, ExportStats};
pub use import::{ImportOptions, ImportPipeline, ImportSource, ImportStats};

/// Shared interrupt flag, set by the Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an interrupt request.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether an interrupt was requested.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs one job to completion.
///
/// # Errors
///
/// Returns the first error of the pipeline.
pub async fn execute(job: Job, options: &ClientOptions, interrupt: &Interrupt) -> Result<()> {
    match job {
        Job::Import(job) => {
            let index = open_index(&job.target, options)?;
            import::run(&index, &job, interrupt).await?;
        }
        Job::Export(job) => {
            let index = open_index(&job.target, options)?;
            export::run(&index, &job, interrupt).await?;
        }
        Job::Search(job) => {
            let index = open_index(&job.target, options)?;
            search::run(&index, &job).await?;
        }
        Job::TransformLines(job) => {
            lines::run(&job).await?;
        }
        Job::CsvToJson(job) => {
            csv_json::run(&job)?;
        }
        Job::GetSettings(job) => {
            let index = open_index(&job.target, options)?;
            settings::get(&index, &job).await?;
        }
        Job::SetSettings(job) => {
            let index = open_index(&job.target, options)?;
            settings::set(&index, &job).await?;
        }
        Job::TransferIndex(job) => {
            let source = open_index(&job.source, options)?;
            let destination = open_index(&job.destination, options)?;
            transfer::transfer_index(&source, &destination, &job, interrupt).await?;
        }
        Job::TransferIndexConfig(job) => {
            let source = open_index(&job.source, options)?;
            let destination = open_index(&job.destination, options)?;
            transfer::transfer_config(&source, &destination, &job).await?;
        }
    }
    Ok(())
}

/// Builds a client for one credential set and opens an index on it.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn open_index(target: &IndexTarget, options: &ClientOptions) -> Result<AlgoliaIndex> {
    let client = AlgoliaClient::new(target.credentials.clone(), options)?;
    Ok(client.init_index(&target.index_name))
}

/// Where a command writes its JSON output.
///
/// No path means stdout; an existing directory receives `default_file_name`;
/// anything else is the file itself.
#[must_use]
pub fn resolve_output(output: Option<&Path>, default_file_name: &str) -> Option<PathBuf> {
    output.map(|path| {
        if path.is_dir() {
            path.join(default_file_name)
        } else {
            path.to_path_buf()
        }
    })
}

/// Writes a JSON document to stdout or to the resolved output path.
///
/// Returns the file written, if any.
///
/// # Errors
///
/// Returns an IO error if the file cannot be written.
pub fn write_output(
    output: Option<&Path>,
    default_file_name: &str,
    value: &Value,
    pretty: bool,
) -> Result<Option<PathBuf>> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    match resolve_output(output, default_file_name) {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            info!("Wrote {}", path.display());
            Ok(Some(path))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", rendered)?;
            stdout.flush()?;
            Ok(None)
        }
    }
}

/// Writes a JSON array of records to a file.
pub(crate) fn write_json_array(path: &Path, records: &[Value]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

pub(crate) fn create_progress_bar(total: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = if total > 0 {
        ProgressBar::new(total)
    } else {
        ProgressBar::new_spinner()
    };

    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    pb
}
