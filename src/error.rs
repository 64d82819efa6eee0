use thiserror::Error;

/// A single failed configuration check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Unified error type for torrent-stage.
#[derive(Error, Debug, Clone)]
pub enum StageError {
    /// Entity not found (torrent file, tree node)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation timed out
    #[error("Operation timed out: {0}")]
    TimedOut(String),

    /// Network error - covers server disconnected, connection refused, etc.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// RPC endpoint returned an HTTP-level error
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// RPC call completed but the server reported failure in the envelope
    #[error("RPC failure: {0}")]
    RpcFailure(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Parse/serialization error (bencode, JSON, TOML)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Configuration validation failed
    #[error("Validation error: {}", .0.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; "))]
    ValidationError(Vec<ValidationIssue>),

    /// Resource temporarily unavailable (no runtime, worker unavailable)
    #[error("Resource temporarily unavailable: {0}")]
    NotReady(String),
}

impl StageError {
    /// Check if this error is transient and retryable at the transport layer.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StageError::TimedOut(_)
                | StageError::NetworkError(_)
                | StageError::NotReady(_)
                | StageError::ApiError {
                    status: 408 | 429 | 502 | 503 | 504,
                    ..
                }
        )
    }
}

// === Conversion Implementations ===

impl From<std::io::Error> for StageError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => StageError::NotFound(e.to_string()),
            std::io::ErrorKind::TimedOut => StageError::TimedOut(e.to_string()),
            std::io::ErrorKind::InvalidInput => StageError::InvalidArgument(e.to_string()),
            _ => StageError::IoError(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for StageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StageError::TimedOut(e.to_string())
        } else if e.is_connect() {
            StageError::NetworkError(format!("Server disconnected: {}", e))
        } else if e.is_request() {
            StageError::NetworkError(e.to_string())
        } else {
            StageError::IoError(format!("HTTP error: {}", e))
        }
    }
}

impl From<serde_json::Error> for StageError {
    fn from(e: serde_json::Error) -> Self {
        StageError::ParseError(e.to_string())
    }
}

impl From<toml::de::Error> for StageError {
    fn from(e: toml::de::Error) -> Self {
        StageError::ParseError(e.to_string())
    }
}

/// Result type alias for operations that can fail with StageError.
pub type StageResult<T> = Result<T, StageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(StageError::TimedOut("test".to_string()).is_transient());
        assert!(StageError::NetworkError("test".to_string()).is_transient());
        assert!(StageError::NotReady("test".to_string()).is_transient());
        assert!(StageError::ApiError {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_transient());

        // Non-transient errors
        assert!(!StageError::NotFound("test".to_string()).is_transient());
        assert!(!StageError::InvalidArgument("test".to_string()).is_transient());
        assert!(!StageError::RpcFailure("duplicate torrent".to_string()).is_transient());
        assert!(!StageError::ApiError {
            status: 404,
            message: "not found".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            format!("{}", StageError::NotFound("test".to_string())),
            "Not found: test"
        );
        assert_eq!(
            format!("{}", StageError::RpcFailure("invalid argument".to_string())),
            "RPC failure: invalid argument"
        );
    }

    #[test]
    fn test_validation_error_joins_issues() {
        let err = StageError::ValidationError(vec![
            ValidationIssue {
                field: "rpc.url".to_string(),
                message: "URL cannot be empty".to_string(),
            },
            ValidationIssue {
                field: "logging.level".to_string(),
                message: "unknown level".to_string(),
            },
        ]);
        let text = format!("{}", err);
        assert!(text.contains("rpc.url: URL cannot be empty"));
        assert!(text.contains("logging.level: unknown level"));
    }

    #[test]
    fn test_io_error_kind_mapping() {
        let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(
            StageError::from(not_found),
            StageError::NotFound(_)
        ));

        let other = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(matches!(StageError::from(other), StageError::IoError(_)));
    }
}
