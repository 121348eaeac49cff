//! Algolia REST connector.
//!
//! Implements [`SearchIndex`] over the Algolia v1 REST API. Reads go to the
//! DSN host, writes to the main host; both fall back to the three
//! `algolianet.com` hosts on retryable failures.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::{ClientOptions, Credentials};
use crate::connectors::common::{create_http_client, handle_http_error, parse_retry_after};
use crate::connectors::{BrowsePage, SearchIndex, SearchParams, TaskInfo};
use crate::error::{Error, Result};
use crate::retry::{with_retry, RetryConfig};

const APP_ID_HEADER: &str = "X-Algolia-Application-Id";
const API_KEY_HEADER: &str = "X-Algolia-API-Key";

#[derive(Debug, Clone, Copy)]
enum HostKind {
    Read,
    Write,
}

#[derive(Debug, Deserialize)]
struct TaskStatus {
    status: String,
}

/// Client for one Algolia application.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct AlgoliaClient {
    credentials: Credentials,
    http: Client,
    read_hosts: Vec<String>,
    write_hosts: Vec<String>,
    retry: RetryConfig,
    task_poll: Duration,
    task_timeout: Duration,
}

impl AlgoliaClient {
    /// Creates a client with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(credentials: Credentials, options: &ClientOptions) -> Result<Self> {
        let (read_hosts, write_hosts) = if options.hosts.is_empty() {
            default_hosts(&credentials.app_id)
        } else {
            (options.hosts.clone(), options.hosts.clone())
        };

        Ok(Self {
            http: create_http_client(options)?,
            credentials,
            read_hosts,
            write_hosts,
            retry: RetryConfig::with_max_retries(options.max_retries),
            task_poll: Duration::from_millis(options.task_poll_ms),
            task_timeout: Duration::from_secs(options.task_timeout_secs),
        })
    }

    /// Overrides the retry policy.
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a handle on one index of this application.
    #[must_use]
    pub fn init_index(&self, name: &str) -> AlgoliaIndex {
        AlgoliaIndex {
            client: self.clone(),
            name: name.to_string(),
        }
    }

    fn hosts(&self, kind: HostKind) -> &[String] {
        match kind {
            HostKind::Read => &self.read_hosts,
            HostKind::Write => &self.write_hosts,
        }
    }

    async fn request(
        &self,
        kind: HostKind,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
        operation: &str,
    ) -> Result<Value> {
        let hosts = self.hosts(kind);
        with_retry(&self.retry, hosts.len(), operation, |attempt| {
            let host = &hosts[attempt as usize % hosts.len()];
            self.send_once(host, method.clone(), segments, body)
        })
        .await
    }

    async fn send_once(
        &self,
        host: &str,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = build_url(host, segments)?;
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, url)
            .header(APP_ID_HEADER, &self.credentials.app_id)
            .header(API_KEY_HEADER, &self.credentials.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(
                response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok()),
            );
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(handle_http_error(status.as_u16(), retry_after, &body));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse service response: {}", e)))
    }
}

/// Handle on one index of an [`AlgoliaClient`].
#[derive(Debug, Clone)]
pub struct AlgoliaIndex {
    client: AlgoliaClient,
    name: String,
}

impl AlgoliaIndex {
    fn decode<T: for<'de> Deserialize<'de>>(value: Value, operation: &str) -> Result<T> {
        serde_json::from_value(value)
            .map_err(|e| Error::Parse(format!("Unexpected {} response: {}", operation, e)))
    }
}

#[async_trait]
impl SearchIndex for AlgoliaIndex {
    fn index_name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, params: &SearchParams) -> Result<Value> {
        let mut body = params.clone();
        body.insert("query".to_string(), Value::String(query.to_string()));
        self.client
            .request(
                HostKind::Read,
                Method::POST,
                &["1", "indexes", &self.name, "query"],
                Some(&Value::Object(body)),
                "search",
            )
            .await
    }

    async fn browse(&self, params: &SearchParams, cursor: Option<&str>) -> Result<BrowsePage> {
        let body = match cursor {
            Some(cursor) => json!({ "cursor": cursor }),
            None => Value::Object(params.clone()),
        };
        let value = self
            .client
            .request(
                HostKind::Read,
                Method::POST,
                &["1", "indexes", &self.name, "browse"],
                Some(&body),
                "browse",
            )
            .await?;
        Self::decode(value, "browse")
    }

    async fn add_objects(&self, objects: &[Value]) -> Result<TaskInfo> {
        let body = json!({ "requests": batch_requests(objects) });
        let value = self
            .client
            .request(
                HostKind::Write,
                Method::POST,
                &["1", "indexes", &self.name, "batch"],
                Some(&body),
                "batch",
            )
            .await?;
        Self::decode(value, "batch")
    }

    async fn wait_task(&self, task_id: u64) -> Result<()> {
        let started = Instant::now();
        let task = task_id.to_string();
        loop {
            let value = self
                .client
                .request(
                    HostKind::Read,
                    Method::GET,
                    &["1", "indexes", &self.name, "task", &task],
                    None,
                    "task",
                )
                .await?;
            let status: TaskStatus = Self::decode(value, "task")?;
            if status.status == "published" {
                debug!("Task {} published on '{}'", task_id, self.name);
                return Ok(());
            }
            if started.elapsed() >= self.client.task_timeout {
                return Err(Error::TaskTimeout(task_id));
            }
            tokio::time::sleep(self.client.task_poll).await;
        }
    }

    async fn get_settings(&self) -> Result<Value> {
        self.client
            .request(
                HostKind::Read,
                Method::GET,
                &["1", "indexes", &self.name, "settings"],
                None,
                "get settings",
            )
            .await
    }

    async fn set_settings(&self, settings: &Value) -> Result<TaskInfo> {
        let value = self
            .client
            .request(
                HostKind::Write,
                Method::PUT,
                &["1", "indexes", &self.name, "settings"],
                Some(settings),
                "set settings",
            )
            .await?;
        Self::decode(value, "set settings")
    }

    async fn clear_index(&self) -> Result<TaskInfo> {
        let value = self
            .client
            .request(
                HostKind::Write,
                Method::POST,
                &["1", "indexes", &self.name, "clear"],
                None,
                "clear",
            )
            .await?;
        Self::decode(value, "clear")
    }
}

/// Read and write host lists for an application, primary host first.
fn default_hosts(app_id: &str) -> (Vec<String>, Vec<String>) {
    let fallbacks: Vec<String> = (1..=3)
        .map(|n| format!("https://{}-{}.algolianet.com", app_id, n))
        .collect();

    let mut read = vec![format!("https://{}-dsn.algolia.net", app_id)];
    read.extend(fallbacks.iter().cloned());
    let mut write = vec![format!("https://{}.algolia.net", app_id)];
    write.extend(fallbacks);
    (read, write)
}

/// Joins path segments onto a host, percent-encoding each segment.
fn build_url(host: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(host)
        .map_err(|e| Error::Config(format!("Invalid host '{}': {}", host, e)))?;
    url.path_segments_mut()
        .map_err(|()| Error::Config(format!("Host '{}' cannot carry a path", host)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Records with an `objectID` replace the stored record; others get a
/// service-assigned ID.
fn batch_requests(objects: &[Value]) -> Vec<Value> {
    objects
        .iter()
        .map(|object| {
            let action = if object.get("objectID").is_some() {
                "updateObject"
            } else {
                "addObject"
            };
            json!({ "action": action, "body": object })
        })
        .collect()
}

#[cfg(test)]
#[path = "algolia_tests.rs"]
mod tests;
