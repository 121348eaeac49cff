//! Copying records or settings between applications.

use tracing::info;

use super::export::export_hits;
use super::import::{ImportOptions, ImportPipeline, ImportStats};
use super::settings::apply_settings;
use super::Interrupt;
use crate::config::{TransferConfigJob, TransferIndexJob};
use crate::connectors::json_file::JsonBatchReader;
use crate::connectors::{SearchIndex, SearchParams};
use crate::error::Result;
use crate::transform::Transformer;

/// Runs a `transferindex` job: browse the source, import into the destination.
///
/// # Errors
///
/// Returns the first browse error, or any import error.
pub async fn transfer_index(
    source: &dyn SearchIndex,
    destination: &dyn SearchIndex,
    job: &TransferIndexJob,
    interrupt: &Interrupt,
) -> Result<ImportStats> {
    let transformer = Transformer::load(job.transform.as_deref())?;

    info!(
        "Transferring records from '{}' to '{}'",
        source.index_name(),
        destination.index_name()
    );
    let (hits, pages) = export_hits(source, &SearchParams::new(), interrupt).await?;
    info!("Read {} records in {} pages", hits.len(), pages);

    let options = ImportOptions {
        max_concurrency: job.max_concurrency,
        wait: job.wait,
        show_progress: true,
        expected_records: hits.len() as u64,
    };
    let batches = JsonBatchReader::from_records(hits, job.batch_size).map(Ok);

    ImportPipeline::new(destination, &transformer, options)
        .with_interrupt(interrupt.clone())
        .run(batches)
        .await
}

/// Runs a `transferindexconfig` job: copy the source settings, transformed.
///
/// # Errors
///
/// Returns the service or transformation error.
pub async fn transfer_config(
    source: &dyn SearchIndex,
    destination: &dyn SearchIndex,
    job: &TransferConfigJob,
) -> Result<()> {
    let transformer = Transformer::load(job.transform.as_deref())?;

    let settings = source.get_settings().await?;
    let settings = transformer.apply(settings).await?;
    apply_settings(destination, &settings, job.wait).await?;

    info!(
        "Copied settings of '{}' to '{}'",
        source.index_name(),
        destination.index_name()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, IndexTarget};
    use crate::connectors::memory::MemoryIndex;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn target(app: &str, name: &str) -> IndexTarget {
        IndexTarget {
            credentials: Credentials {
                app_id: app.to_string(),
                api_key: "KEY".to_string(),
            },
            index_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_transfer_index_copies_every_record() {
        let records: Vec<Value> = (0..9).map(|i| json!({ "objectID": i.to_string(), "n": i })).collect();
        let source = MemoryIndex::new("products")
            .with_records(records.clone())
            .with_page_size(4);
        let destination = MemoryIndex::new("products");
        let job = TransferIndexJob {
            source: target("SRC", "products"),
            destination: target("DST", "products"),
            transform: None,
            batch_size: 5,
            max_concurrency: 1,
            wait: false,
        };

        let stats = transfer_index(&source, &destination, &job, &Interrupt::new())
            .await
            .unwrap();
        assert_eq!(stats.submitted, 9);
        assert_eq!(stats.batches, 2);
        assert_eq!(destination.records(), records);
    }

    #[tokio::test]
    async fn test_transfer_config_applies_transform() {
        let dir = TempDir::new().unwrap();
        let mapping = dir.path().join("map.json");
        std::fs::write(&mapping, r#"{"remove": ["replicas"]}"#).unwrap();

        let source = MemoryIndex::new("products")
            .with_settings(json!({"hitsPerPage": 10, "replicas": ["products_desc"]}));
        let destination = MemoryIndex::new("products_copy");
        let job = TransferConfigJob {
            source: target("SRC", "products"),
            destination: target("DST", "products_copy"),
            transform: Some(mapping),
            wait: true,
        };

        transfer_config(&source, &destination, &job).await.unwrap();
        assert_eq!(destination.settings(), json!({"hitsPerPage": 10}));
        assert_eq!(destination.waited_tasks(), vec![1]);
    }
}
