//! Command-line interface.
//!
//! Every parameter is optional at the clap level so that a missing one is
//! reported by [`validate`] together with the command usage, after the
//! profile has had a chance to supply it.

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{
    check_input, check_output, parse_params, validate, CsvToJsonJob, Credentials, ExportJob,
    GetSettingsJob, ImportJob, IndexTarget, Job, Profile, Requirement, SearchJob, SetSettingsJob,
    TransferConfigJob, TransferIndexJob, TransformLinesJob,
};
use crate::connectors::csv_file::CsvOptions;
use crate::error::{Error, Result};

const APP_ID: &str = "-a/--app-id";
const API_KEY: &str = "-k/--api-key";
const INDEX_NAME: &str = "-n/--index-name";
const SOURCE: &str = "-s/--source";
const OUTPUT: &str = "-o/--output";
const TRANSFORM: &str = "-t/--transform";
const DEST_APP_ID: &str = "-d/--dest-app-id";
const DEST_API_KEY: &str = "-y/--dest-api-key";

#[derive(Parser, Debug)]
#[command(name = "indexport")]
#[command(
    version,
    about = "Import, export and transfer records and settings of Algolia indices",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// YAML profile with default credentials and client options
    #[arg(short, long, global = true, value_name = "FILE", env = "INDEXPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Credentials and index of the application a command talks to.
#[derive(Args, Debug, Clone, Default)]
pub struct IndexArgs {
    /// Application ID
    #[arg(short = 'a', long = "app-id", alias = "algoliaappid", env = "ALGOLIA_APP_ID")]
    pub app_id: Option<String>,

    /// API key
    #[arg(
        short = 'k',
        long = "api-key",
        alias = "algoliaapikey",
        env = "ALGOLIA_API_KEY",
        hide_env_values = true
    )]
    pub api_key: Option<String>,

    /// Index name
    #[arg(short = 'n', long = "index-name", alias = "algoliaindexname")]
    pub index_name: Option<String>,
}

/// Credentials of the destination application of a transfer.
#[derive(Args, Debug, Clone, Default)]
pub struct DestinationArgs {
    /// Destination application ID
    #[arg(
        id = "dest_app_id",
        short = 'd',
        long = "dest-app-id",
        alias = "destinationalgoliaappid",
        env = "ALGOLIA_DESTINATION_APP_ID"
    )]
    pub app_id: Option<String>,

    /// Destination API key
    #[arg(
        id = "dest_api_key",
        short = 'y',
        long = "dest-api-key",
        alias = "destinationalgoliaapikey",
        env = "ALGOLIA_DESTINATION_API_KEY",
        hide_env_values = true
    )]
    pub api_key: Option<String>,

    /// Destination index name (defaults to the source index name)
    #[arg(id = "dest_index_name", short = 'i', long = "dest-index-name")]
    pub index_name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a JSON or CSV file, or a directory of them, into an index
    #[command(name = "import")]
    Import {
        #[command(flatten)]
        index: IndexArgs,

        /// Source file or directory
        #[arg(short = 's', long = "source", alias = "sourcefilepath", value_name = "PATH")]
        source: Option<PathBuf>,

        /// Transformation file
        #[arg(short = 't', long = "transform", alias = "transformationfilepath", value_name = "FILE")]
        transform: Option<PathBuf>,

        /// Records per batch
        #[arg(short = 'b', long = "batch-size", alias = "batchsize")]
        batch_size: Option<usize>,

        /// Batches submitted concurrently
        #[arg(short = 'm', long = "max-concurrency", alias = "maxconcurrency")]
        max_concurrency: Option<usize>,

        /// Clear the index before importing
        #[arg(long)]
        clear: bool,

        /// Wait until every batch is indexed
        #[arg(long)]
        wait: bool,
    },

    /// Export every record of an index to a JSON file
    #[command(name = "export")]
    Export {
        #[command(flatten)]
        index: IndexArgs,

        /// Output file or directory (stdout when omitted)
        #[arg(short = 'o', long = "output", alias = "outputfilepath", value_name = "PATH")]
        output: Option<PathBuf>,

        /// Browse parameters as a JSON object
        #[arg(short = 'p', long = "params")]
        params: Option<String>,
    },

    /// Run one search query and print the raw response
    #[command(name = "search")]
    Search {
        #[command(flatten)]
        index: IndexArgs,

        /// Query string
        #[arg(short = 'q', long = "query", default_value = "")]
        query: String,

        /// Search parameters as a JSON object
        #[arg(short = 'p', long = "params")]
        params: Option<String>,

        /// Output file or directory (stdout when omitted)
        #[arg(short = 'o', long = "output", alias = "outputpath", value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Transform a JSON Lines file into a JSON array
    #[command(name = "transformlines")]
    TransformLines {
        /// JSON Lines source file
        #[arg(short = 's', long = "source", alias = "sourcefilepath", value_name = "FILE")]
        source: Option<PathBuf>,

        /// Output file
        #[arg(short = 'o', long = "output", alias = "outputfilepath", value_name = "FILE")]
        output: Option<PathBuf>,

        /// Transformation file
        #[arg(short = 't', long = "transform", alias = "transformationfilepath", value_name = "FILE")]
        transform: Option<PathBuf>,
    },

    /// Convert a CSV file into a JSON array
    #[command(name = "csvtojson")]
    CsvToJson {
        /// CSV source file
        #[arg(short = 's', long = "source", alias = "sourcefilepath", value_name = "FILE")]
        source: Option<PathBuf>,

        /// Output file
        #[arg(short = 'o', long = "output", alias = "outputfilepath", value_name = "FILE")]
        output: Option<PathBuf>,

        /// Field delimiter
        #[arg(long, default_value_t = ',')]
        delimiter: char,

        /// Quote character
        #[arg(long, default_value_t = '"')]
        quote: char,

        /// The first row is data; columns are named field1..fieldN
        #[arg(long)]
        no_header: bool,

        /// Column names, comma separated
        #[arg(long, value_delimiter = ',')]
        headers: Vec<String>,

        /// Trim whitespace around cells
        #[arg(long)]
        trim: bool,

        /// Convert numeric and boolean cells
        #[arg(long)]
        check_type: bool,
    },

    /// Print the settings of an index
    #[command(name = "getsettings")]
    GetSettings {
        #[command(flatten)]
        index: IndexArgs,

        /// Output file or directory (stdout when omitted)
        #[arg(short = 'o', long = "output", alias = "outputfilepath", value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Replace the settings of an index from a JSON or YAML file
    #[command(name = "setsettings")]
    SetSettings {
        #[command(flatten)]
        index: IndexArgs,

        /// Settings file
        #[arg(short = 's', long = "source", alias = "sourcefilepath", value_name = "FILE")]
        source: Option<PathBuf>,

        /// Transformation file
        #[arg(short = 't', long = "transform", alias = "transformationfilepath", value_name = "FILE")]
        transform: Option<PathBuf>,

        /// Wait until the settings are applied
        #[arg(long)]
        wait: bool,
    },

    /// Copy every record of an index to another application
    #[command(name = "transferindex")]
    TransferIndex {
        #[command(flatten)]
        index: IndexArgs,

        #[command(flatten)]
        destination: DestinationArgs,

        /// Transformation file
        #[arg(short = 't', long = "transform", alias = "transformationfilepath", value_name = "FILE")]
        transform: Option<PathBuf>,

        /// Records per batch
        #[arg(short = 'b', long = "batch-size", alias = "batchsize")]
        batch_size: Option<usize>,

        /// Batches submitted concurrently
        #[arg(short = 'm', long = "max-concurrency", alias = "maxconcurrency")]
        max_concurrency: Option<usize>,

        /// Wait until every batch is indexed
        #[arg(long)]
        wait: bool,
    },

    /// Copy the settings of an index to another application
    #[command(name = "transferindexconfig")]
    TransferIndexConfig {
        #[command(flatten)]
        index: IndexArgs,

        #[command(flatten)]
        destination: DestinationArgs,

        /// Transformation file
        #[arg(short = 't', long = "transform", alias = "transformationfilepath", value_name = "FILE")]
        transform: Option<PathBuf>,

        /// Wait until the settings are applied
        #[arg(long)]
        wait: bool,
    },
}

impl Commands {
    /// Subcommand name as typed on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Import { .. } => "import",
            Self::Export { .. } => "export",
            Self::Search { .. } => "search",
            Self::TransformLines { .. } => "transformlines",
            Self::CsvToJson { .. } => "csvtojson",
            Self::GetSettings { .. } => "getsettings",
            Self::SetSettings { .. } => "setsettings",
            Self::TransferIndex { .. } => "transferindex",
            Self::TransferIndexConfig { .. } => "transferindexconfig",
        }
    }

    /// Example invocation printed with the usage.
    #[must_use]
    pub const fn example(&self) -> &'static str {
        match self {
            Self::Import { .. } => "indexport import -s ~/records.json -a APP_ID -k API_KEY -n INDEX -b 5000 -t ~/mapping.yaml -m 4",
            Self::Export { .. } => "indexport export -a APP_ID -k API_KEY -n INDEX -o ~/exports/ -p '{\"filters\":\"category:book\"}'",
            Self::Search { .. } => "indexport search -a APP_ID -k API_KEY -n INDEX -q shoe -p '{\"hitsPerPage\":5}'",
            Self::TransformLines { .. } => "indexport transformlines -s ~/records.jsonl -o ~/records.json -t ~/mapping.yaml",
            Self::CsvToJson { .. } => "indexport csvtojson -s ~/records.csv -o ~/records.json --delimiter ';' --check-type",
            Self::GetSettings { .. } => "indexport getsettings -a APP_ID -k API_KEY -n INDEX",
            Self::SetSettings { .. } => "indexport setsettings -a APP_ID -k API_KEY -n INDEX -s ~/settings.yaml",
            Self::TransferIndex { .. } => "indexport transferindex -a SOURCE_APP_ID -k SOURCE_API_KEY -n INDEX -d DEST_APP_ID -y DEST_API_KEY -t ~/mapping.yaml",
            Self::TransferIndexConfig { .. } => "indexport transferindexconfig -a SOURCE_APP_ID -k SOURCE_API_KEY -n INDEX -d DEST_APP_ID -y DEST_API_KEY",
        }
    }

    /// Resolves profile defaults, validates and freezes the command into a job.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming every missing parameter, or the
    /// first invalid one.
    pub fn into_job(self, profile: &Profile) -> Result<Job> {
        match self {
            Self::Import {
                index,
                source,
                transform,
                batch_size,
                max_concurrency,
                clear,
                wait,
            } => {
                let index = ResolvedIndex::new(index, profile);
                validate(&[
                    Requirement::readable_path(SOURCE, source.as_deref()),
                    Requirement::value(APP_ID, &index.app_id),
                    Requirement::value(API_KEY, &index.api_key),
                    Requirement::value(INDEX_NAME, &index.index_name),
                ])?;
                check_transform(transform.as_deref())?;
                let (Some(target), Some(source)) = (index.target(), source) else {
                    return Err(missing());
                };
                Ok(Job::Import(ImportJob {
                    target,
                    source,
                    transform,
                    batch_size: positive("-b/--batch-size", batch_size, profile.options.batch_size)?,
                    max_concurrency: positive(
                        "-m/--max-concurrency",
                        max_concurrency,
                        profile.options.max_concurrency,
                    )?,
                    clear,
                    wait,
                }))
            }

            Self::Export {
                index,
                output,
                params,
            } => {
                let index = ResolvedIndex::new(index, profile);
                index.validate()?;
                check_optional_output(output.as_deref())?;
                let params = parse_params(params.as_deref())?;
                let target = index.target().ok_or_else(missing)?;
                Ok(Job::Export(ExportJob {
                    target,
                    params,
                    output,
                }))
            }

            Self::Search {
                index,
                query,
                params,
                output,
            } => {
                let index = ResolvedIndex::new(index, profile);
                index.validate()?;
                check_optional_output(output.as_deref())?;
                let params = parse_params(params.as_deref())?;
                let target = index.target().ok_or_else(missing)?;
                Ok(Job::Search(SearchJob {
                    target,
                    query,
                    params,
                    output,
                }))
            }

            Self::TransformLines {
                source,
                output,
                transform,
            } => {
                validate(&[
                    Requirement::readable_path(SOURCE, source.as_deref()),
                    Requirement::output_path(OUTPUT, output.as_deref()),
                ])?;
                check_transform(transform.as_deref())?;
                let (Some(source), Some(output)) = (source, output) else {
                    return Err(missing());
                };
                Ok(Job::TransformLines(TransformLinesJob {
                    source,
                    output,
                    transform,
                }))
            }

            Self::CsvToJson {
                source,
                output,
                delimiter,
                quote,
                no_header,
                headers,
                trim,
                check_type,
            } => {
                validate(&[
                    Requirement::readable_path(SOURCE, source.as_deref()),
                    Requirement::output_path(OUTPUT, output.as_deref()),
                ])?;
                let (Some(source), Some(output)) = (source, output) else {
                    return Err(missing());
                };
                Ok(Job::CsvToJson(CsvToJsonJob {
                    source,
                    output,
                    options: CsvOptions {
                        delimiter,
                        quote,
                        has_header: !no_header,
                        headers,
                        trim,
                        check_type,
                    },
                }))
            }

            Self::GetSettings { index, output } => {
                let index = ResolvedIndex::new(index, profile);
                index.validate()?;
                check_optional_output(output.as_deref())?;
                let target = index.target().ok_or_else(missing)?;
                Ok(Job::GetSettings(GetSettingsJob { target, output }))
            }

            Self::SetSettings {
                index,
                source,
                transform,
                wait,
            } => {
                let index = ResolvedIndex::new(index, profile);
                validate(&[
                    Requirement::value(APP_ID, &index.app_id),
                    Requirement::value(API_KEY, &index.api_key),
                    Requirement::value(INDEX_NAME, &index.index_name),
                    Requirement::readable_path(SOURCE, source.as_deref()),
                ])?;
                check_transform(transform.as_deref())?;
                let (Some(target), Some(source)) = (index.target(), source) else {
                    return Err(missing());
                };
                Ok(Job::SetSettings(SetSettingsJob {
                    target,
                    source,
                    transform,
                    wait,
                }))
            }

            Self::TransferIndex {
                index,
                destination,
                transform,
                batch_size,
                max_concurrency,
                wait,
            } => {
                let (source, destination) = resolve_transfer(index, destination, profile)?;
                check_transform(transform.as_deref())?;
                Ok(Job::TransferIndex(TransferIndexJob {
                    source,
                    destination,
                    transform,
                    batch_size: positive("-b/--batch-size", batch_size, profile.options.batch_size)?,
                    max_concurrency: positive(
                        "-m/--max-concurrency",
                        max_concurrency,
                        profile.options.max_concurrency,
                    )?,
                    wait,
                }))
            }

            Self::TransferIndexConfig {
                index,
                destination,
                transform,
                wait,
            } => {
                let (source, destination) = resolve_transfer(index, destination, profile)?;
                check_transform(transform.as_deref())?;
                Ok(Job::TransferIndexConfig(TransferConfigJob {
                    source,
                    destination,
                    transform,
                    wait,
                }))
            }
        }
    }
}

/// Index parameters after profile fallback.
struct ResolvedIndex {
    app_id: Option<String>,
    api_key: Option<String>,
    index_name: Option<String>,
}

impl ResolvedIndex {
    fn new(args: IndexArgs, profile: &Profile) -> Self {
        Self {
            app_id: args.app_id.or_else(|| profile.app_id.clone()),
            api_key: args.api_key.or_else(|| profile.api_key.clone()),
            index_name: args.index_name,
        }
    }

    fn validate(&self) -> Result<()> {
        validate(&[
            Requirement::value(APP_ID, &self.app_id),
            Requirement::value(API_KEY, &self.api_key),
            Requirement::value(INDEX_NAME, &self.index_name),
        ])
    }

    fn target(self) -> Option<IndexTarget> {
        Some(IndexTarget {
            credentials: Credentials {
                app_id: self.app_id?,
                api_key: self.api_key?,
            },
            index_name: self.index_name?,
        })
    }
}

fn resolve_transfer(
    index: IndexArgs,
    destination: DestinationArgs,
    profile: &Profile,
) -> Result<(IndexTarget, IndexTarget)> {
    let source = ResolvedIndex::new(index, profile);
    let dest_app_id = destination
        .app_id
        .or_else(|| profile.destination.app_id.clone());
    let dest_api_key = destination
        .api_key
        .or_else(|| profile.destination.api_key.clone());

    validate(&[
        Requirement::value(APP_ID, &source.app_id),
        Requirement::value(API_KEY, &source.api_key),
        Requirement::value(INDEX_NAME, &source.index_name),
        Requirement::value(DEST_APP_ID, &dest_app_id),
        Requirement::value(DEST_API_KEY, &dest_api_key),
    ])?;

    let source = source.target().ok_or_else(missing)?;
    let (Some(app_id), Some(api_key)) = (dest_app_id, dest_api_key) else {
        return Err(missing());
    };
    let destination = IndexTarget {
        credentials: Credentials { app_id, api_key },
        index_name: destination
            .index_name
            .unwrap_or_else(|| source.index_name.clone()),
    };
    Ok((source, destination))
}

fn check_transform(path: Option<&Path>) -> Result<()> {
    path.map_or(Ok(()), |p| check_input(TRANSFORM, p))
}

fn check_optional_output(path: Option<&Path>) -> Result<()> {
    path.map_or(Ok(()), |p| check_output(OUTPUT, p))
}

fn positive(flag: &str, value: Option<usize>, fallback: usize) -> Result<usize> {
    match value.unwrap_or(fallback) {
        0 => Err(Error::Validation(format!("{} must be at least 1", flag))),
        n => Ok(n),
    }
}

fn missing() -> Error {
    Error::Validation("missing required parameter".to_string())
}

/// Rendered help of one subcommand, for usage errors.
#[must_use]
pub fn usage(name: &str) -> String {
    let mut command = Cli::command();
    command.build();
    command
        .find_subcommand_mut(name)
        .map(|sub| sub.render_help().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientOptions;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("indexport").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_missing_index_name() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("records.json");
        std::fs::write(&source, "[]").unwrap();
        let source = source.to_string_lossy().to_string();

        let cli = parse(&["import", "-s", &source, "-a", "APP", "-k", "KEY"]);
        let err = cli.command.into_job(&Profile::default()).unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("-n/--index-name"));
    }

    #[test]
    fn test_import_defaults_and_long_aliases() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("records.json");
        std::fs::write(&source, "[]").unwrap();
        let source = source.to_string_lossy().to_string();

        let cli = parse(&[
            "import",
            "--sourcefilepath",
            &source,
            "--algoliaappid",
            "APP",
            "-k",
            "KEY",
            "--algoliaindexname",
            "products",
        ]);
        match cli.command.into_job(&Profile::default()).unwrap() {
            Job::Import(job) => {
                assert_eq!(job.target.index_name, "products");
                assert_eq!(job.batch_size, 1000);
                assert_eq!(job.max_concurrency, 2);
                assert!(!job.clear);
            }
            other => panic!("unexpected job: {other:?}"),
        }
    }

    #[test]
    fn test_import_rejects_zero_batch_size() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("records.json");
        std::fs::write(&source, "[]").unwrap();
        let source = source.to_string_lossy().to_string();

        let cli = parse(&["import", "-s", &source, "-a", "A", "-k", "K", "-n", "i", "-b", "0"]);
        let err = cli.command.into_job(&Profile::default()).unwrap_err();
        assert!(err.to_string().contains("-b/--batch-size"));
    }

    #[test]
    fn test_profile_supplies_credentials_and_options() {
        let profile = Profile {
            app_id: Some("PROFILE_APP".to_string()),
            api_key: Some("PROFILE_KEY".to_string()),
            options: ClientOptions {
                batch_size: 250,
                ..Default::default()
            },
            ..Default::default()
        };

        let dir = TempDir::new().unwrap();
        let source = dir.path().join("records.json");
        std::fs::write(&source, "[]").unwrap();
        let source = source.to_string_lossy().to_string();

        let cli = parse(&["import", "-s", &source, "-n", "products"]);
        match cli.command.into_job(&profile).unwrap() {
            Job::Import(job) => {
                assert_eq!(job.batch_size, 250);
                // ALGOLIA_APP_ID in the environment takes precedence
                if std::env::var_os("ALGOLIA_APP_ID").is_none() {
                    assert_eq!(job.target.credentials.app_id, "PROFILE_APP");
                }
            }
            other => panic!("unexpected job: {other:?}"),
        }
    }

    #[test]
    fn test_transfer_destination_index_defaults_to_source() {
        let cli = parse(&[
            "transferindexconfig",
            "-a",
            "SRC",
            "-k",
            "SK",
            "-n",
            "products",
            "-d",
            "DST",
            "-y",
            "DK",
        ]);
        match cli.command.into_job(&Profile::default()).unwrap() {
            Job::TransferIndexConfig(job) => {
                assert_eq!(job.destination.index_name, "products");
                assert_eq!(job.destination.credentials.app_id, "DST");
                assert_eq!(job.source.credentials.app_id, "SRC");
            }
            other => panic!("unexpected job: {other:?}"),
        }
    }

    #[test]
    fn test_transfer_missing_destination_key() {
        let cli = parse(&[
            "transferindex",
            "-a",
            "SRC",
            "-k",
            "SK",
            "-n",
            "products",
            "-d",
            "DST",
            "-i",
            "copy",
        ]);
        let result = cli.command.into_job(&Profile::default());
        // ALGOLIA_DESTINATION_API_KEY may be set in the environment
        if std::env::var_os("ALGOLIA_DESTINATION_API_KEY").is_none() {
            let err = result.unwrap_err();
            assert!(err.to_string().contains("-y/--dest-api-key"));
        }
    }

    #[test]
    fn test_export_rejects_non_object_params() {
        let cli = parse(&["export", "-a", "A", "-k", "K", "-n", "i", "-p", "[1]"]);
        assert!(matches!(
            cli.command.into_job(&Profile::default()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_csvtojson_options() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.csv");
        std::fs::write(&source, "a,b\n").unwrap();
        let source = source.to_string_lossy().to_string();
        let output = dir.path().join("out.json").to_string_lossy().to_string();

        let cli = parse(&[
            "csvtojson",
            "-s",
            &source,
            "-o",
            &output,
            "--delimiter",
            ";",
            "--no-header",
            "--headers",
            "x,y",
            "--check-type",
        ]);
        match cli.command.into_job(&Profile::default()).unwrap() {
            Job::CsvToJson(job) => {
                assert_eq!(job.options.delimiter, ';');
                assert!(!job.options.has_header);
                assert_eq!(job.options.headers, vec!["x", "y"]);
                assert!(job.options.check_type);
                assert!(!job.options.trim);
            }
            other => panic!("unexpected job: {other:?}"),
        }
    }

    #[test]
    fn test_transformlines_requires_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.jsonl");
        std::fs::write(&source, "").unwrap();
        let source = source.to_string_lossy().to_string();

        let cli = parse(&["transformlines", "-s", &source]);
        let err = cli.command.into_job(&Profile::default()).unwrap_err();
        assert!(err.to_string().contains("-o/--output"));
    }

    #[test]
    fn test_usage_renders_subcommand_help() {
        let help = usage("import");
        assert!(help.contains("--batch-size"));
        assert!(usage("nope").is_empty());
    }
}
