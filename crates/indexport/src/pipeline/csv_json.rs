//! CSV to JSON array conversion.

use tracing::info;

use super::write_json_array;
use crate::config::CsvToJsonJob;
use crate::connectors::csv_file::read_csv_records;
use crate::error::Result;

/// Runs a `csvtojson` job. Returns the number of records written.
///
/// # Errors
///
/// Returns a CSV or IO error.
pub fn run(job: &CsvToJsonJob) -> Result<usize> {
    let records = read_csv_records(&job.source, &job.options)?;
    write_json_array(&job.output, &records)?;
    info!("Converted {} rows to {}", records.len(), job.output.display());
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::csv_file::CsvOptions;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    #[test]
    fn test_csv_to_json_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.csv");
        let output = dir.path().join("out.json");
        std::fs::write(&source, "name|age\nAnn|31\nBob|27\n").unwrap();

        let job = CsvToJsonJob {
            source,
            output: output.clone(),
            options: CsvOptions {
                delimiter: '|',
                check_type: true,
                ..Default::default()
            },
        };
        assert_eq!(run(&job).unwrap(), 2);

        let written: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(written[1], json!({"name": "Bob", "age": 27}));
    }
}
