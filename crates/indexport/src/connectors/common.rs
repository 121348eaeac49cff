//! Common utilities shared across connectors.
//!
//! HTTP client construction, service error mapping and structured file
//! loading live here so the Algolia connector and the pipelines agree on them.

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use reqwest::Client;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Keep-alive time for idle pooled connections.
pub const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Creates the HTTP client for one credential set.
///
/// The pool keeps at most `options.max_sockets` idle connections per host;
/// in-flight requests are bounded by the import window, not by the client.
pub fn create_http_client(options: &ClientOptions) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(options.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(options.max_sockets)
        .pool_idle_timeout(KEEP_ALIVE)
        .build()?;
    Ok(client)
}

/// Validates a host URL for the search service.
pub fn validate_host(host: &str) -> Result<()> {
    if !(host.starts_with("http://") || host.starts_with("https://")) {
        return Err(Error::Config(format!(
            "Invalid host '{}'. Allowed schemes: http, https",
            host
        )));
    }
    if host.len() < 10 {
        return Err(Error::Config(format!("Invalid host format: {}", host)));
    }
    Ok(())
}

/// Maps an error response of the service to an [`Error`].
///
/// The service reports failures as `{"message": "...", "status": N}`; the
/// message is extracted when present, otherwise the raw body is kept.
/// `retry_after` is the `Retry-After` header in seconds, when sent.
pub fn handle_http_error(status_code: u16, retry_after: Option<u64>, body: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string());

    match status_code {
        429 => Error::RateLimit(retry_after),
        401 | 403 => Error::Authentication(message),
        _ => Error::Service {
            status: status_code,
            message,
        },
    }
}

/// Seconds of a `Retry-After` header; the HTTP-date form is ignored.
pub fn parse_retry_after(header: Option<&str>) -> Option<u64> {
    header.and_then(|v| v.trim().parse().ok())
}

/// Reads a JSON or YAML document, chosen by file extension.
pub fn read_structured_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| {
            Error::Parse(format!("Failed to parse YAML '{}': {}", path.display(), e))
        })
    } else {
        serde_json::from_str(&content).map_err(|e| {
            Error::Parse(format!("Failed to parse JSON '{}': {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_handle_http_error_rate_limit() {
        let err = handle_http_error(429, Some(7), "too many requests");
        assert!(matches!(err, Error::RateLimit(Some(7))));
        assert_eq!(err.to_string(), "Rate limited, retry after 7s");

        let err = handle_http_error(429, None, "too many requests");
        assert!(matches!(err, Error::RateLimit(None)));
        assert_eq!(err.to_string(), "Rate limited");
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("12")), Some(12));
        assert_eq!(parse_retry_after(Some(" 3 ")), Some(3));
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2026 07:28:00 GMT")), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn test_handle_http_error_auth_extracts_message() {
        let err = handle_http_error(403, None, r#"{"message":"Invalid Application-ID or API key","status":403}"#);
        match err {
            Error::Authentication(msg) => assert_eq!(msg, "Invalid Application-ID or API key"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_handle_http_error_other_keeps_body() {
        let err = handle_http_error(500, None, "internal error");
        match err {
            Error::Service { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_host() {
        assert!(validate_host("https://APPID-dsn.algolia.net").is_ok());
        assert!(validate_host("http://127.0.0.1:8080").is_ok());
        assert!(validate_host("ftp://files.example.com").is_err());
        assert!(validate_host("http://").is_err());
    }

    #[test]
    fn test_create_http_client() {
        let client = create_http_client(&ClientOptions::default()).unwrap();
        assert!(client.get("http://example.com").build().is_ok());
    }

    #[test]
    fn test_read_structured_file_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"hitsPerPage: 20\nsearchableAttributes:\n  - title\n")
            .unwrap();

        let value = read_structured_file(file.path()).unwrap();
        assert_eq!(value["hitsPerPage"], 20);
        assert_eq!(value["searchableAttributes"][0], "title");
    }

    #[test]
    fn test_read_structured_file_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        let result = read_structured_file(file.path());
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
