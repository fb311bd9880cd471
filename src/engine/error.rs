//! Sync error types

use crate::config::ConfigError;

/// Errors that can occur while talking to the test-management service or
/// reconciling a session against it
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rate limit exhausted: {method} {url} still throttled after {attempts} attempts")]
    RateLimitExhausted {
        method: String,
        url: String,
        attempts: u32,
    },

    #[error("Remote rejected request: {method} {url} -> {status}: {body}")]
    RemoteRejected {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No status id known for outcome {0}")]
    UnknownStatus(String),

    #[error("Failed to create test cycle: {0}")]
    CycleCreation(#[source] Box<SyncError>),
}

impl SyncError {
    /// HTTP status carried by a rejected request, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::RemoteRejected { status, .. } => Some(*status),
            SyncError::RateLimitExhausted { .. } => Some(429),
            SyncError::CycleCreation(inner) => inner.status(),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        match self {
            SyncError::RateLimitExhausted { .. } => true,
            SyncError::CycleCreation(inner) => inner.is_rate_limited(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_of_rejected_request() {
        let err = SyncError::RemoteRejected {
            method: "GET".to_string(),
            url: "http://jira/rest".to_string(),
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_rate_limited());
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_cycle_creation_wraps_rate_limit() {
        let err = SyncError::CycleCreation(Box::new(SyncError::RateLimitExhausted {
            method: "POST".to_string(),
            url: "http://jira/rest/tests/1.0/testrun".to_string(),
            attempts: 5,
        }));
        assert!(err.is_rate_limited());
        assert_eq!(err.status(), Some(429));
        assert!(err.to_string().starts_with("Failed to create test cycle"));
    }
}
