//! User transformations applied to records and settings.
//!
//! A transformation is loaded once per invocation from `-t <file>`:
//!
//! | File | Transform |
//! |------|-----------|
//! | none | [`Identity`] |
//! | `.yaml` / `.yml` / `.json` | [`FieldMapping`] |
//! | anything else | [`CommandTransform`], an external program |
//!
//! The external program speaks a line protocol: one compact JSON document per
//! line on its stdin, one JSON document per line back on its stdout. A reply
//! of the form `{"error": "..."}` reports a failure for that item.
//!
//! That single-key shape is reserved: an object whose only field is `error`
//! is always read as a failure, never as a record. Objects with an `error`
//! field next to other fields pass through as ordinary records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::debug;

use crate::connectors::common::read_structured_file;
use crate::error::{Error, Result};

/// Maps one JSON value to another.
#[async_trait]
pub trait Transform: Send + Sync {
    /// Transforms one item.
    async fn apply(&self, value: Value) -> Result<Value>;

    /// Short description for logs.
    fn name(&self) -> String;
}

/// Leaves every item unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

#[async_trait]
impl Transform for Identity {
    async fn apply(&self, value: Value) -> Result<Value> {
        Ok(value)
    }

    fn name(&self) -> String {
        "identity".to_string()
    }
}

/// Declarative field mapping, applied in the order keep, remove, rename, set.
///
/// ```yaml
/// keep: [objectID, title, price]
/// remove: [price]
/// rename:
///   title: name
/// set:
///   source: catalog
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldMapping {
    /// Fields to keep; empty keeps every field.
    #[serde(default)]
    pub keep: Vec<String>,
    /// Fields to drop.
    #[serde(default)]
    pub remove: Vec<String>,
    /// Old name to new name.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    /// Constant fields added or overwritten.
    #[serde(default)]
    pub set: Map<String, Value>,
}

impl FieldMapping {
    /// Loads a mapping from a JSON or YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transform`] if the file is not a valid mapping.
    pub fn from_file(path: &Path) -> Result<Self> {
        let value = read_structured_file(path)
            .map_err(|e| Error::Transform(format!("Cannot load '{}': {}", path.display(), e)))?;
        serde_json::from_value(value).map_err(|e| {
            Error::Transform(format!("Invalid mapping in '{}': {}", path.display(), e))
        })
    }

    fn map_object(&self, mut object: Map<String, Value>) -> Map<String, Value> {
        if !self.keep.is_empty() {
            object.retain(|key, _| self.keep.contains(key));
        }
        for field in &self.remove {
            object.shift_remove(field);
        }
        for (from, to) in &self.rename {
            if let Some(value) = object.shift_remove(from) {
                object.insert(to.clone(), value);
            }
        }
        for (key, value) in &self.set {
            object.insert(key.clone(), value.clone());
        }
        object
    }
}

#[async_trait]
impl Transform for FieldMapping {
    async fn apply(&self, value: Value) -> Result<Value> {
        match value {
            Value::Object(object) => Ok(Value::Object(self.map_object(object))),
            other => Err(Error::Transform(format!(
                "field mapping expects JSON objects, got {}",
                crate::connectors::json_file::json_type_name(&other)
            ))),
        }
    }

    fn name(&self) -> String {
        "field mapping".to_string()
    }
}

struct Pipe {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// External program driven over the line protocol.
///
/// The program is spawned once and killed when the transform is dropped.
/// Items are exchanged one at a time. A reply whose only field is `error`
/// fails the item; see the module docs.
pub struct CommandTransform {
    program: PathBuf,
    pipe: Mutex<Pipe>,
    _child: Child,
}

impl std::fmt::Debug for CommandTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTransform")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl CommandTransform {
    /// Spawns the program.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transform`] if the program cannot be started.
    pub fn spawn(program: &Path) -> Result<Self> {
        let program = std::fs::canonicalize(program).map_err(|e| {
            Error::Transform(format!("Cannot resolve '{}': {}", program.display(), e))
        })?;

        let mut child = Command::new(&program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Transform(format!("Cannot start '{}': {}", program.display(), e))
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(Error::Transform(format!(
                "'{}' started without pipes",
                program.display()
            )));
        };
        debug!("Started transform program {}", program.display());

        Ok(Self {
            program,
            pipe: Mutex::new(Pipe {
                stdin,
                stdout: BufReader::new(stdout).lines(),
            }),
            _child: child,
        })
    }

    fn failure(&self, message: impl std::fmt::Display) -> Error {
        Error::Transform(format!("{}: {}", self.program.display(), message))
    }
}

#[async_trait]
impl Transform for CommandTransform {
    async fn apply(&self, value: Value) -> Result<Value> {
        let mut line = serde_json::to_string(&value)?;
        line.push('\n');

        let mut pipe = self.pipe.lock().await;
        pipe.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| self.failure(format!("write failed: {e}")))?;
        pipe.stdin
            .flush()
            .await
            .map_err(|e| self.failure(format!("flush failed: {e}")))?;

        let reply = pipe
            .stdout
            .next_line()
            .await
            .map_err(|e| self.failure(format!("read failed: {e}")))?
            .ok_or_else(|| self.failure("program closed its output"))?;

        let reply: Value = serde_json::from_str(&reply)
            .map_err(|e| self.failure(format!("invalid JSON reply: {e}")))?;
        if let Some(message) = protocol_error(&reply) {
            return Err(self.failure(message));
        }
        Ok(reply)
    }

    fn name(&self) -> String {
        self.program.display().to_string()
    }
}

/// Returns the message of an `{"error": ...}` reply.
fn protocol_error(reply: &Value) -> Option<String> {
    let object = reply.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.get("error").map(|e| match e {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// The transformation of one invocation.
pub struct Transformer {
    inner: Box<dyn Transform>,
    identity: bool,
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("name", &self.inner.name())
            .finish()
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transformer {
    /// Transformer that changes nothing.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            inner: Box::new(Identity),
            identity: true,
        }
    }

    /// Wraps a custom transform.
    #[must_use]
    pub fn new(inner: Box<dyn Transform>) -> Self {
        Self {
            inner,
            identity: false,
        }
    }

    /// Loads the transformation named by `-t`, identity when absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transform`] if the file cannot be loaded or started.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::identity());
        };

        let declarative = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "yaml" | "yml" | "json"));

        let inner: Box<dyn Transform> = if declarative {
            Box::new(FieldMapping::from_file(path)?)
        } else {
            Box::new(CommandTransform::spawn(path)?)
        };
        debug!("Loaded transformation: {}", inner.name());
        Ok(Self::new(inner))
    }

    /// True when no transformation was configured.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Transforms one item.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transform`] on failure.
    pub async fn apply(&self, value: Value) -> Result<Value> {
        self.inner.apply(value).await
    }

    /// Transforms a batch, keeping its order.
    ///
    /// # Errors
    ///
    /// Fails on the first item that fails.
    pub async fn transform_batch(&self, batch: Vec<Value>) -> Result<Vec<Value>> {
        if self.identity {
            return Ok(batch);
        }
        let mut out = Vec::with_capacity(batch.len());
        for value in batch {
            out.push(self.inner.apply(value).await?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;

    fn mapping_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_identity_leaves_records_unchanged() {
        let transformer = Transformer::identity();
        let batch = vec![json!({"objectID": "1", "nested": {"a": [1, 2]}}), json!("raw")];

        let out = transformer.transform_batch(batch.clone()).await.unwrap();
        assert_eq!(out, batch);
        assert!(transformer.is_identity());
    }

    #[tokio::test]
    async fn test_identity_keeps_serialized_bytes() {
        let input = r#"{"objectID":"1","zeta":1,"alpha":2.50,"big":12345678901234567890123,"mid":{"y":true,"b":null}}"#;
        let record: Value = serde_json::from_str(input).unwrap();

        let out = Transformer::identity()
            .transform_batch(vec![record])
            .await
            .unwrap();
        assert_eq!(serde_json::to_string(&out[0]).unwrap(), input);
    }

    #[tokio::test]
    async fn test_field_mapping_order() {
        let mapping = FieldMapping {
            keep: vec!["objectID".into(), "title".into(), "price".into()],
            remove: vec!["price".into()],
            rename: BTreeMap::from([("title".to_string(), "name".to_string())]),
            set: Map::from_iter([("source".to_string(), json!("catalog"))]),
        };

        let out = mapping
            .apply(json!({"objectID": "1", "title": "Shoe", "price": 3, "internal": true}))
            .await
            .unwrap();
        assert_eq!(out, json!({"objectID": "1", "name": "Shoe", "source": "catalog"}));
    }

    #[tokio::test]
    async fn test_field_mapping_rejects_non_object() {
        let result = FieldMapping::default().apply(json!([1, 2])).await;
        assert!(matches!(result, Err(Error::Transform(_))));
    }

    #[tokio::test]
    async fn test_load_yaml_mapping() {
        let dir = TempDir::new().unwrap();
        let path = mapping_file(&dir, "map.yaml", "rename:\n  hitsPerPage: paginationLimitedTo\n");

        let transformer = Transformer::load(Some(&path)).unwrap();
        assert!(!transformer.is_identity());

        let out = transformer.apply(json!({"hitsPerPage": 20})).await.unwrap();
        assert_eq!(out, json!({"paginationLimitedTo": 20}));
    }

    #[test]
    fn test_load_rejects_unknown_mapping_keys() {
        let dir = TempDir::new().unwrap();
        let path = mapping_file(&dir, "map.json", r#"{"rename": {}, "drop": ["a"]}"#);
        assert!(matches!(
            Transformer::load(Some(&path)),
            Err(Error::Transform(_))
        ));
    }

    #[test]
    fn test_load_none_is_identity() {
        assert!(Transformer::load(None).unwrap().is_identity());
    }

    #[test]
    fn test_protocol_error() {
        assert_eq!(
            protocol_error(&json!({"error": "boom"})),
            Some("boom".to_string())
        );
        assert_eq!(protocol_error(&json!({"error": "x", "objectID": "1"})), None);
        assert_eq!(protocol_error(&json!("error")), None);
    }

    #[cfg(unix)]
    fn script(dir: &TempDir, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = mapping_file(dir, "transform.sh", body);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_transform_echo() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "#!/bin/sh\nwhile IFS= read -r line; do echo \"$line\"; done\n");

        let transformer = Transformer::load(Some(&path)).unwrap();
        let batch = vec![json!({"objectID": "1"}), json!({"objectID": "2"})];
        let out = transformer.transform_batch(batch.clone()).await.unwrap();
        assert_eq!(out, batch);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_transform_error_reply() {
        let dir = TempDir::new().unwrap();
        let path = script(
            &dir,
            "#!/bin/sh\nwhile IFS= read -r line; do echo '{\"error\":\"bad record\"}'; done\n",
        );

        let transformer = Transformer::load(Some(&path)).unwrap();
        let err = transformer.apply(json!({"a": 1})).await.unwrap_err();
        assert!(err.to_string().contains("bad record"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_transform_error_field_in_record_passes() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "#!/bin/sh\nwhile IFS= read -r line; do echo \"$line\"; done\n");

        let transformer = Transformer::load(Some(&path)).unwrap();
        let record = json!({"objectID": "1", "error": "E42 paper jam"});
        let out = transformer.apply(record.clone()).await.unwrap();
        assert_eq!(out, record);

        let reserved = transformer.apply(json!({"error": "E42 paper jam"})).await;
        assert!(matches!(reserved, Err(Error::Transform(m)) if m.contains("E42 paper jam")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_transform_closed_output() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "#!/bin/sh\nexit 0\n");

        let transformer = Transformer::load(Some(&path)).unwrap();
        let result = transformer.apply(json!({"a": 1})).await;
        assert!(matches!(result, Err(Error::Transform(_))));
    }
}
