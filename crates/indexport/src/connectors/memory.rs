//! In-memory [`SearchIndex`] for pipeline tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Mutex;

use crate::connectors::{BrowsePage, SearchIndex, SearchParams, TaskInfo};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct State {
    records: Vec<Value>,
    settings: Value,
    batches: Vec<Vec<Value>>,
    add_calls: usize,
    next_task: u64,
    waited: Vec<u64>,
    cleared: bool,
}

/// Index kept in a `Mutex`, recording every call it receives.
#[derive(Debug)]
pub struct MemoryIndex {
    name: String,
    page_size: usize,
    fail_calls: HashSet<usize>,
    state: Mutex<State>,
}

impl MemoryIndex {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            page_size: 2,
            fail_calls: HashSet::new(),
            state: Mutex::new(State {
                settings: json!({}),
                ..Default::default()
            }),
        }
    }

    pub fn with_records(self, records: Vec<Value>) -> Self {
        self.state.lock().unwrap().records = records;
        self
    }

    pub fn with_settings(self, settings: Value) -> Self {
        self.state.lock().unwrap().settings = settings;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// `add_objects` fails on these 0-based call numbers.
    pub fn failing_calls(mut self, calls: &[usize]) -> Self {
        self.fail_calls = calls.iter().copied().collect();
        self
    }

    pub fn records(&self) -> Vec<Value> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn settings(&self) -> Value {
        self.state.lock().unwrap().settings.clone()
    }

    pub fn batches(&self) -> Vec<Vec<Value>> {
        self.state.lock().unwrap().batches.clone()
    }

    pub fn waited_tasks(&self) -> Vec<u64> {
        self.state.lock().unwrap().waited.clone()
    }

    pub fn was_cleared(&self) -> bool {
        self.state.lock().unwrap().cleared
    }

    fn next_task(state: &mut State) -> u64 {
        state.next_task += 1;
        state.next_task
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    fn index_name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, params: &SearchParams) -> Result<Value> {
        let state = self.state.lock().unwrap();
        let hits: Vec<&Value> = state
            .records
            .iter()
            .filter(|r| r.to_string().contains(query))
            .collect();
        Ok(json!({ "hits": hits, "nbHits": hits.len(), "query": query, "params": params }))
    }

    async fn browse(&self, _params: &SearchParams, cursor: Option<&str>) -> Result<BrowsePage> {
        let state = self.state.lock().unwrap();
        let start: usize = match cursor {
            Some(c) => c
                .parse()
                .map_err(|_| Error::Parse(format!("bad cursor {c}")))?,
            None => 0,
        };
        let end = (start + self.page_size).min(state.records.len());
        Ok(BrowsePage {
            hits: state.records[start..end].to_vec(),
            cursor: (end < state.records.len()).then(|| end.to_string()),
        })
    }

    async fn add_objects(&self, objects: &[Value]) -> Result<TaskInfo> {
        let mut state = self.state.lock().unwrap();
        let call = state.add_calls;
        state.add_calls += 1;
        if self.fail_calls.contains(&call) {
            return Err(Error::Service {
                status: 400,
                message: format!("rejected batch call {call}"),
            });
        }

        let mut object_ids = Vec::with_capacity(objects.len());
        for object in objects {
            let mut object = object.clone();
            let id = match object.get("objectID").and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => {
                    let id = format!("auto-{}", state.records.len());
                    object["objectID"] = Value::String(id.clone());
                    id
                }
            };
            state
                .records
                .retain(|r| r.get("objectID").and_then(Value::as_str) != Some(id.as_str()));
            state.records.push(object);
            object_ids.push(id);
        }
        state.batches.push(objects.to_vec());

        Ok(TaskInfo {
            task_id: Self::next_task(&mut state),
            object_ids,
        })
    }

    async fn wait_task(&self, task_id: u64) -> Result<()> {
        self.state.lock().unwrap().waited.push(task_id);
        Ok(())
    }

    async fn get_settings(&self) -> Result<Value> {
        Ok(self.settings())
    }

    async fn set_settings(&self, settings: &Value) -> Result<TaskInfo> {
        let mut state = self.state.lock().unwrap();
        state.settings = settings.clone();
        Ok(TaskInfo {
            task_id: Self::next_task(&mut state),
            object_ids: Vec::new(),
        })
    }

    async fn clear_index(&self) -> Result<TaskInfo> {
        let mut state = self.state.lock().unwrap();
        state.records.clear();
        state.cleared = true;
        Ok(TaskInfo {
            task_id: Self::next_task(&mut state),
            object_ids: Vec::new(),
        })
    }
}
