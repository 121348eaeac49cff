//! Connectors to the search service and to local record files.

pub mod algolia;
pub mod common;
pub mod csv_file;
pub mod json_file;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Search parameters forwarded verbatim to the service.
pub type SearchParams = Map<String, Value>;

/// Acknowledgement of an asynchronous write on the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    /// Identifier to poll with [`SearchIndex::wait_task`].
    #[serde(rename = "taskID")]
    pub task_id: u64,
    /// Object IDs assigned or confirmed by the service (batch writes only).
    #[serde(rename = "objectIDs", default)]
    pub object_ids: Vec<String>,
}

/// One page of a full-index browse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowsePage {
    /// Records of this page.
    #[serde(default)]
    pub hits: Vec<Value>,
    /// Cursor for the next page; `None` once the index is exhausted.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Operations consumed from a hosted search index.
///
/// Every call is one network round trip (plus the client's own retries) and
/// may fail with a service error: rate limit, authentication failure or a
/// rejected payload.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Name of the index this handle targets.
    fn index_name(&self) -> &str;

    /// Runs a search query and returns the raw service response.
    async fn search(&self, query: &str, params: &SearchParams) -> Result<Value>;

    /// Fetches one page of records, starting a new browse when `cursor` is `None`.
    async fn browse(&self, params: &SearchParams, cursor: Option<&str>) -> Result<BrowsePage>;

    /// Adds or replaces a batch of records in one request.
    async fn add_objects(&self, objects: &[Value]) -> Result<TaskInfo>;

    /// Blocks until the given task is published.
    async fn wait_task(&self, task_id: u64) -> Result<()>;

    /// Fetches the index settings.
    async fn get_settings(&self) -> Result<Value>;

    /// Replaces the index settings.
    async fn set_settings(&self, settings: &Value) -> Result<TaskInfo>;

    /// Deletes every record of the index, keeping its settings.
    async fn clear_index(&self) -> Result<TaskInfo>;
}
