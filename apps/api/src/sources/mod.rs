//! External collaborators: the recommendation profile source and the paginated catalogs.
//!
//! These are the only places the engine awaits I/O. Everything downstream of them (parsing,
//! tokenizing, scoring) is pure and synchronous.

pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub use http::{HttpCatalogSource, HttpProfileSource};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Upstream error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected payload shape: {0}")]
    Shape(String),
}

impl SourceError {
    /// Whether the same request may succeed if tried again.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Http(_) | SourceError::Timeout(_) => true,
            SourceError::Status { status, .. } => *status == 429 || *status >= 500,
            SourceError::Parse(_) | SourceError::Shape(_) => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            SourceError::Timeout(_) => true,
            SourceError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// One catalog page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub query: String,
    pub page: u32,
    pub page_size: u32,
}

/// Returns the raw recommendation payload for a session, in whatever shape upstream produced.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, session_id: Uuid) -> Result<Value, SourceError>;
}

/// Returns one page of catalog records. The engine owns no pagination state beyond asking.
#[async_trait]
pub trait CatalogSource<R>: Send + Sync {
    async fn fetch_page(&self, query: &CatalogQuery) -> Result<Vec<R>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SourceError::Timeout(Duration::from_secs(25)).is_retryable());
        assert!(SourceError::Status {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(SourceError::Status {
            status: 429,
            message: String::new()
        }
        .is_retryable());
        assert!(!SourceError::Status {
            status: 404,
            message: String::new()
        }
        .is_retryable());
        assert!(!SourceError::Shape("number".into()).is_retryable());
    }

    #[test]
    fn test_timeout_detection() {
        assert!(SourceError::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(!SourceError::Shape("x".into()).is_timeout());
    }
}
