//! Error types for sitechat.
//!
//! Library crates use [`SiteChatError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Two conditions are deliberately *not* errors: an extraction that yields
//! no usable text (the extractor returns `None`, the page is skipped) and a
//! retrieval that matches zero chunks (the QA chain answers with the fixed
//! fallback). Both are ordinary outcomes, not failures.

use std::path::PathBuf;

/// Top-level error type for all sitechat operations.
#[derive(Debug, thiserror::Error)]
pub enum SiteChatError {
    /// Malformed or non-absolute URL.
    #[error("invalid URL: {message}")]
    Format { message: String },

    /// The target responded with a non-200 status.
    #[error("website unreachable (status {status})")]
    Unreachable { status: u16 },

    /// The target responded with something other than HTML.
    #[error("URL does not point to a website (Content-Type: {content_type}); expecting text/html")]
    ContentType { content_type: String },

    /// A bounded network timeout elapsed.
    #[error("connection timed out (limit: {seconds}s)")]
    Timeout { seconds: u64 },

    /// TLS certificate verification failed.
    #[error("TLS certificate verification failed: {0}")]
    Tls(String),

    /// The redirect limit was exceeded.
    #[error("too many redirects: {0}")]
    RedirectLoop(String),

    /// Other transport-level failure (DNS, connection refused, body read).
    #[error("network error: {0}")]
    Network(String),

    /// Embedding or vector-store write failed. Fatal to the indexing run:
    /// no partial index is left behind and the caller must re-trigger.
    #[error("indexing failed: {0}")]
    Indexing(String),

    /// Language-model call failed (transport, quota, malformed response).
    #[error("generation failed: {0}")]
    Generation(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SiteChatError>;

impl SiteChatError {
    /// Create a format error from any displayable message.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SiteChatError::format("scheme or domain missing");
        assert_eq!(err.to_string(), "invalid URL: scheme or domain missing");

        let err = SiteChatError::Unreachable { status: 503 };
        assert!(err.to_string().contains("503"));

        let err = SiteChatError::Timeout { seconds: 10 };
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn content_type_error_names_the_offender() {
        let err = SiteChatError::ContentType {
            content_type: "application/pdf".into(),
        };
        assert!(err.to_string().contains("application/pdf"));
        assert!(err.to_string().contains("text/html"));
    }
}
