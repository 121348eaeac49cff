// CLI library - pedantic lints relaxed for ergonomics
#![allow(clippy::pedantic)]

//! # indexport
//!
//! `indexport` is a CLI tool and library for moving records and settings
//! into, out of and between Algolia indices.
//!
//! ## Commands
//!
//! | Command | What it does |
//! |---------|--------------|
//! | `import` | Batched, concurrent import of JSON/CSV files or directories |
//! | `export` | Browses a whole index into a JSON array |
//! | `search` | Runs one query and prints the raw response |
//! | `transformlines` | JSON Lines to JSON array, with a transformation |
//! | `csvtojson` | CSV to JSON array |
//! | `getsettings` / `setsettings` | Reads or replaces index settings |
//! | `transferindex` | Copies every record to another application |
//! | `transferindexconfig` | Copies settings to another application |
//!
//! ## Quick Start
//!
//! ```bash
//! export ALGOLIA_APP_ID=APP_ID ALGOLIA_API_KEY=API_KEY
//!
//! indexport import -s ./records.json -n products -b 5000 -m 4
//! indexport export -n products -o ./backups/
//! ```
//!
//! ## Profile Example
//!
//! ```yaml
//! app_id: APP_ID
//! api_key: API_KEY
//! destination:
//!   app_id: OTHER_APP_ID
//!   api_key: OTHER_API_KEY
//! options:
//!   batch_size: 1000
//!   max_concurrency: 2
//!   max_retries: 3
//! ```

#![warn(missing_docs)]

#[allow(missing_docs)]
pub mod cli;
pub mod config;
pub mod connectors;
pub mod error;
pub mod pipeline;
pub mod retry;
pub mod transform;

pub use config::{ClientOptions, Credentials, Job, Profile};
pub use connectors::algolia::{AlgoliaClient, AlgoliaIndex};
pub use connectors::{BrowsePage, SearchIndex, SearchParams, TaskInfo};
pub use error::{Error, Result};
pub use pipeline::{ImportPipeline, ImportStats, Interrupt};
pub use retry::RetryConfig;
pub use transform::Transformer;
