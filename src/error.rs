// Error types for the catalog data layer.
// Covers upstream API failures, configuration problems, and JSON handling.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("authentication failed: invalid or expired session token")]
    Unauthorized,

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("upstream returned {status} for {url}")]
    Upstream { status: StatusCode, url: String },

    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing CATALOG_API_TOKEN environment variable")]
    MissingToken,

    #[error("{0}")]
    Other(String),
}

impl CatalogError {
    /// Whether the failure is worth a single retry: network-level errors,
    /// timeouts, and upstream 5xx responses. Client errors are final.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Api(e) => e.is_timeout() || e.is_connect(),
            CatalogError::Timeout(_) => true,
            CatalogError::Upstream { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = CatalogError::Upstream {
            status: StatusCode::SERVICE_UNAVAILABLE,
            url: "http://api/packages".into(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn client_errors_are_final() {
        let err = CatalogError::Upstream {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            url: "http://api/packages".into(),
        };
        assert!(!err.is_transient());
        assert!(!CatalogError::Unauthorized.is_transient());
        assert!(!CatalogError::NotFound("x".into()).is_transient());
    }

    #[test]
    fn timeouts_are_transient() {
        assert!(CatalogError::Timeout(Duration::from_secs(8)).is_transient());
    }
}
