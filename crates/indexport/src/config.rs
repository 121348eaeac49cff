//! Configuration types for indexport.
//!
//! Command parameters are resolved from flags, environment variables and an
//! optional YAML profile, then checked once with [`validate`] and frozen into
//! one of the job structs below.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::connectors::csv_file::CsvOptions;
use crate::error::{Error, Result};

/// Records per batch when `-b` is not given.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Concurrent batch submissions when `-m` is not given.
pub const DEFAULT_MAX_CONCURRENCY: usize = 2;

/// Application credentials for the search service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Application ID.
    pub app_id: String,
    /// API key with the rights the command needs.
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("api_key", &"***")
            .finish()
    }
}

/// YAML profile supplying defaults for flags that were not given.
///
/// ```yaml
/// app_id: SOURCE_APP
/// api_key: SOURCE_KEY
/// destination:
///   app_id: DEST_APP
///   api_key: DEST_KEY
/// options:
///   batch_size: 5000
///   max_concurrency: 4
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Default application ID.
    pub app_id: Option<String>,
    /// Default API key.
    pub api_key: Option<String>,
    /// Default destination credentials for transfer commands.
    #[serde(default)]
    pub destination: DestinationProfile,
    /// Client and pipeline options.
    #[serde(default)]
    pub options: ClientOptions,
}

/// Destination credentials of a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationProfile {
    /// Destination application ID.
    pub app_id: Option<String>,
    /// Destination API key.
    pub api_key: Option<String>,
}

/// Client and pipeline options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientOptions {
    /// Records per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Batches submitted concurrently.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries per request, each on the next host.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Idle pooled connections kept per host.
    #[serde(default = "default_max_sockets")]
    pub max_sockets: usize,
    /// Interval between task status polls, in milliseconds.
    #[serde(default = "default_task_poll_ms")]
    pub task_poll_ms: u64,
    /// Give up waiting for a task after this many seconds.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
    /// Host override (e.g. a proxy); empty = the service's own hosts.
    #[serde(default)]
    pub hosts: Vec<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrency: default_max_concurrency(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            max_sockets: default_max_sockets(),
            task_poll_ms: default_task_poll_ms(),
            task_timeout_secs: default_task_timeout_secs(),
            hosts: Vec::new(),
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_sockets() -> usize {
    2
}

fn default_task_poll_ms() -> u64 {
    250
}

fn default_task_timeout_secs() -> u64 {
    600
}

impl Profile {
    /// Load a profile from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read profile '{}': {}", path.display(), e))
        })?;
        let profile: Self = serde_yaml::from_str(&content)?;
        profile.options.validate()?;
        Ok(profile)
    }
}

impl ClientOptions {
    /// Validate option ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if an option is out of range or a host is malformed.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(Error::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        for host in &self.hosts {
            crate::connectors::common::validate_host(host)?;
        }
        Ok(())
    }
}

/// One required parameter of a command.
#[derive(Debug, Clone, Copy)]
pub struct Requirement<'a> {
    flag: &'static str,
    check: Check<'a>,
}

#[derive(Debug, Clone, Copy)]
enum Check<'a> {
    Present(bool),
    ReadablePath(Option<&'a Path>),
    WritableParent(Option<&'a Path>),
}

impl<'a> Requirement<'a> {
    /// The parameter must be set.
    pub fn value<T>(flag: &'static str, value: &Option<T>) -> Self {
        Self {
            flag,
            check: Check::Present(value.is_some()),
        }
    }

    /// The parameter must name an existing, readable file or directory.
    pub fn readable_path(flag: &'static str, path: Option<&'a Path>) -> Self {
        Self {
            flag,
            check: Check::ReadablePath(path),
        }
    }

    /// The parameter must name a file whose parent directory exists.
    pub fn output_path(flag: &'static str, path: Option<&'a Path>) -> Self {
        Self {
            flag,
            check: Check::WritableParent(path),
        }
    }
}

/// Checks the required parameters of a command.
///
/// Missing parameters are reported together; path problems are reported
/// only once every parameter is present.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming every missing flag or the first
/// unusable path.
pub fn validate(requirements: &[Requirement<'_>]) -> Result<()> {
    let missing: Vec<&str> = requirements
        .iter()
        .filter(|r| match r.check {
            Check::Present(present) => !present,
            Check::ReadablePath(path) | Check::WritableParent(path) => path.is_none(),
        })
        .map(|r| r.flag)
        .collect();

    if !missing.is_empty() {
        return Err(Error::Validation(format!(
            "missing required parameter(s): {}",
            missing.join(", ")
        )));
    }

    for requirement in requirements {
        match requirement.check {
            Check::ReadablePath(Some(path)) => check_input(requirement.flag, path)?,
            Check::WritableParent(Some(path)) => check_output(requirement.flag, path)?,
            _ => {}
        }
    }
    Ok(())
}

/// Checks that an optional input path exists and is readable.
///
/// # Errors
///
/// Returns [`Error::Validation`] if it is not.
pub fn check_input(flag: &str, path: &Path) -> Result<()> {
    let readable = if path.is_dir() {
        std::fs::read_dir(path).is_ok()
    } else {
        std::fs::File::open(path).is_ok()
    };
    if readable {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} '{}' does not exist or is not readable",
            flag,
            path.display()
        )))
    }
}

/// Checks that an optional output path is a directory or sits in one.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the parent directory is missing.
pub fn check_output(flag: &str, path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Ok(()),
    };
    if parent.is_dir() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} '{}': directory '{}' does not exist",
            flag,
            path.display(),
            parent.display()
        )))
    }
}

/// Parses `-p/--params`: a JSON object of search parameters.
///
/// Single-quoted pseudo JSON (`{'filters':'category:book'}`) is accepted
/// as a fallback.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the value is not a JSON object.
pub fn parse_params(raw: Option<&str>) -> Result<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    let parsed = serde_json::from_str::<Value>(raw)
        .or_else(|_| serde_json::from_str::<Value>(&raw.replace('\'', "\"")));
    match parsed {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::Validation(
            "-p/--params must be a JSON object".to_string(),
        )),
        Err(e) => Err(Error::Validation(format!(
            "-p/--params is not valid JSON: {}",
            e
        ))),
    }
}

/// Credentials plus the index they address.
#[derive(Debug, Clone)]
pub struct IndexTarget {
    /// Credentials of the application owning the index.
    pub credentials: Credentials,
    /// Index name.
    pub index_name: String,
}

/// `import`: push a JSON/CSV file or directory into an index.
#[derive(Debug, Clone)]
pub struct ImportJob {
    /// Destination index.
    pub target: IndexTarget,
    /// Source file or directory.
    pub source: PathBuf,
    /// Optional transformation file.
    pub transform: Option<PathBuf>,
    /// Records per batch.
    pub batch_size: usize,
    /// Batches submitted concurrently.
    pub max_concurrency: usize,
    /// Clear the index before importing.
    pub clear: bool,
    /// Wait for every batch task to be published.
    pub wait: bool,
}

/// `export`: browse every record matching params into a JSON file.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Source index.
    pub target: IndexTarget,
    /// Browse parameters.
    pub params: Map<String, Value>,
    /// Output file or directory; stdout when absent.
    pub output: Option<PathBuf>,
}

/// `search`: run one query and print the raw response.
#[derive(Debug, Clone)]
pub struct SearchJob {
    /// Index to query.
    pub target: IndexTarget,
    /// Query string.
    pub query: String,
    /// Search parameters.
    pub params: Map<String, Value>,
    /// Output file or directory; stdout when absent.
    pub output: Option<PathBuf>,
}

/// `transformlines`: transform a JSON Lines file into a JSON array.
#[derive(Debug, Clone)]
pub struct TransformLinesJob {
    /// JSON Lines input.
    pub source: PathBuf,
    /// JSON array output.
    pub output: PathBuf,
    /// Optional transformation file.
    pub transform: Option<PathBuf>,
}

/// `csvtojson`: convert a CSV file into a JSON array.
#[derive(Debug, Clone)]
pub struct CsvToJsonJob {
    /// CSV input.
    pub source: PathBuf,
    /// JSON array output.
    pub output: PathBuf,
    /// CSV dialect and conversion options.
    pub options: CsvOptions,
}

/// `getsettings`: print the settings of an index.
#[derive(Debug, Clone)]
pub struct GetSettingsJob {
    /// Index to read.
    pub target: IndexTarget,
    /// Output file or directory; stdout when absent.
    pub output: Option<PathBuf>,
}

/// `setsettings`: replace the settings of an index from a file.
#[derive(Debug, Clone)]
pub struct SetSettingsJob {
    /// Index to update.
    pub target: IndexTarget,
    /// JSON or YAML settings file.
    pub source: PathBuf,
    /// Optional transformation file.
    pub transform: Option<PathBuf>,
    /// Wait for the settings task to be published.
    pub wait: bool,
}

/// `transferindex`: copy every record to another application.
#[derive(Debug, Clone)]
pub struct TransferIndexJob {
    /// Index to read from.
    pub source: IndexTarget,
    /// Index to write to.
    pub destination: IndexTarget,
    /// Optional transformation file.
    pub transform: Option<PathBuf>,
    /// Records per batch.
    pub batch_size: usize,
    /// Batches submitted concurrently.
    pub max_concurrency: usize,
    /// Wait for every batch task to be published.
    pub wait: bool,
}

/// `transferindexconfig`: copy index settings to another application.
#[derive(Debug, Clone)]
pub struct TransferConfigJob {
    /// Index to read from.
    pub source: IndexTarget,
    /// Index to write to.
    pub destination: IndexTarget,
    /// Optional transformation file.
    pub transform: Option<PathBuf>,
    /// Wait for the settings task to be published.
    pub wait: bool,
}

/// A validated command, ready to run.
#[derive(Debug, Clone)]
pub enum Job {
    /// See [`ImportJob`].
    Import(ImportJob),
    /// See [`ExportJob`].
    Export(ExportJob),
    /// See [`SearchJob`].
    Search(SearchJob),
    /// See [`TransformLinesJob`].
    TransformLines(TransformLinesJob),
    /// See [`CsvToJsonJob`].
    CsvToJson(CsvToJsonJob),
    /// See [`GetSettingsJob`].
    GetSettings(GetSettingsJob),
    /// See [`SetSettingsJob`].
    SetSettings(SetSettingsJob),
    /// See [`TransferIndexJob`].
    TransferIndex(TransferIndexJob),
    /// See [`TransferConfigJob`].
    TransferIndexConfig(TransferConfigJob),
}
