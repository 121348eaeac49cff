//! Index settings get/set.

use serde_json::Value;
use tracing::info;

use super::write_output;
use crate::config::{GetSettingsJob, SetSettingsJob};
use crate::connectors::common::read_structured_file;
use crate::connectors::json_file::json_type_name;
use crate::connectors::SearchIndex;
use crate::error::{Error, Result};
use crate::transform::Transformer;

/// File name used when `-o` is a directory.
#[must_use]
pub fn settings_file_name(index_name: &str) -> String {
    format!("algolia-settings-{}.json", index_name)
}

/// Runs a `getsettings` job: pretty JSON to stdout or `-o`.
///
/// # Errors
///
/// Returns the service error or an output error.
pub async fn get(index: &dyn SearchIndex, job: &GetSettingsJob) -> Result<Value> {
    let settings = index.get_settings().await?;
    write_output(
        job.output.as_deref(),
        &settings_file_name(index.index_name()),
        &settings,
        true,
    )?;
    Ok(settings)
}

/// Runs a `setsettings` job.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the file is not a JSON or YAML object, a
/// transformation error, or the service error.
pub async fn set(index: &dyn SearchIndex, job: &SetSettingsJob) -> Result<()> {
    let transformer = Transformer::load(job.transform.as_deref())?;
    let settings = read_structured_file(&job.source)?;
    if !settings.is_object() {
        return Err(Error::Parse(format!(
            "'{}' must contain a settings object, found {}",
            job.source.display(),
            json_type_name(&settings)
        )));
    }

    let settings = transformer.apply(settings).await?;
    apply_settings(index, &settings, job.wait).await
}

/// Pushes settings and optionally waits for the task.
pub(crate) async fn apply_settings(index: &dyn SearchIndex, settings: &Value, wait: bool) -> Result<()> {
    let task = index.set_settings(settings).await?;
    if wait {
        index.wait_task(task.task_id).await?;
    }
    info!("Settings of '{}' updated (task {})", index.index_name(), task.task_id);
    Ok(())
}
