//! Pre-crawl URL validation.
//!
//! Checks, in order: the URL is non-empty, syntactically an absolute
//! http(s) URL, and actually reachable as an HTML page. Format failures
//! are decided without any network I/O; reachability costs exactly one
//! GET request. No retries — the caller decides whether to re-prompt.

use reqwest::{StatusCode, header};
use tracing::{debug, warn};
use url::Url;

use sitechat_shared::{CrawlConfig, Result, SiteChatError};

use crate::engine::{build_client, classify_request_error};

/// Outcome of validating a candidate URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Whether the URL passed all checks.
    pub valid: bool,
    /// Human-readable failure reason when `valid` is false.
    pub error: Option<String>,
}

impl ValidationReport {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Validate a candidate URL: format first, then one live reachability probe.
pub async fn validate(url: &str, config: &CrawlConfig) -> ValidationReport {
    match probe(url, config).await {
        Ok(()) => ValidationReport::ok(),
        Err(e) => {
            debug!(url, error = %e, "validation failed");
            ValidationReport::failed(e.to_string())
        }
    }
}

/// Typed validation path. Format errors return before any network call.
async fn probe(url: &str, config: &CrawlConfig) -> Result<()> {
    let parsed = parse_absolute(url)?;

    let client = build_client(config)?;
    let response = client
        .get(parsed.as_str())
        .send()
        .await
        .map_err(|e| classify_request_error(e, config.request_timeout_secs))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(SiteChatError::Unreachable {
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !content_type.contains("text/html") {
        warn!(url, content_type, "validation hit non-HTML content");
        return Err(SiteChatError::ContentType { content_type });
    }

    Ok(())
}

/// Syntactic checks: non-empty, parseable, http(s) scheme, host present.
fn parse_absolute(url: &str) -> Result<Url> {
    if url.trim().is_empty() {
        return Err(SiteChatError::format("URL cannot be empty"));
    }

    let parsed = Url::parse(url)
        .map_err(|_| SiteChatError::format("scheme (http/https) or domain missing"))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(SiteChatError::format(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    if parsed.host_str().is_none() {
        return Err(SiteChatError::format("scheme (http/https) or domain missing"));
    }

    Ok(parsed)
}
