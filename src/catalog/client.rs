// Upstream catalog API HTTP client.
// Handles authentication, per-request timeouts, and the single-retry
// policy for transient failures.

use std::env;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::{CatalogError, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:4000/api";

/// Delay before the single permitted retry.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Header marking background traffic so the upstream can deprioritize it.
const PRIORITY_HEADER: &str = "x-request-priority";

/// Scheduling class of an upstream request.
///
/// Interactive reads sit on a user-facing path and get the short timeout;
/// background work (prefetch) tolerates latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Interactive,
    Background,
}

impl Priority {
    fn timeout(self) -> Duration {
        match self {
            Priority::Interactive => Duration::from_secs(8),
            Priority::Background => Duration::from_secs(15),
        }
    }
}

/// Catalog API client with bearer authentication.
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    /// Create a client for the API at `base_url` with the given session token.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| CatalogError::Other(e.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("wayfare-catalog"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(CatalogError::Api)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from `CATALOG_API_BASE` and `CATALOG_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let base_url =
            env::var("CATALOG_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let token = env::var("CATALOG_API_TOKEN").map_err(|_| CatalogError::MissingToken)?;
        Self::new(&base_url, &token)
    }

    /// GET `path` and deserialize the JSON response body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        priority: Priority,
    ) -> Result<T> {
        let response = self
            .request_with_retry(Method::GET, path, query, None, priority)
            .await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body to `path`, discarding the response body.
    pub(crate) async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let body = serde_json::to_value(body)?;
        self.request_with_retry(Method::POST, path, &[], Some(body), Priority::Interactive)
            .await?;
        Ok(())
    }

    /// Issue a request, retrying once on a transient failure.
    ///
    /// The retry reuses the original parameters unmodified after a fixed
    /// delay. A request that has already been retried is never retried
    /// again, and client errors are surfaced immediately.
    async fn request_with_retry(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
        priority: Priority,
    ) -> Result<Response> {
        let mut retried = false;
        loop {
            match self
                .send(method.clone(), path, query, body.as_ref(), priority)
                .await
            {
                Ok(response) => return Ok(response),
                Err(e) if !retried && e.is_transient() => {
                    warn!(path, error = %e, "transient upstream failure, retrying once");
                    retried = true;
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        priority: Priority,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let timeout = priority.timeout();

        let mut request = self.client.request(method, &url).timeout(timeout);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if priority == Priority::Background {
            request = request.header(PRIORITY_HEADER, "low");
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CatalogError::Timeout(timeout)
            } else {
                CatalogError::Api(e)
            }
        })?;

        check_response(response)
    }
}

/// Map non-success statuses to typed errors.
fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    match status {
        StatusCode::UNAUTHORIZED => Err(CatalogError::Unauthorized),
        StatusCode::NOT_FOUND => Err(CatalogError::NotFound(url)),
        status => Err(CatalogError::Upstream { status, url }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_requests_get_the_longer_timeout() {
        assert!(Priority::Background.timeout() > Priority::Interactive.timeout());
        assert_eq!(Priority::Interactive.timeout(), Duration::from_secs(8));
        assert_eq!(Priority::Background.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn base_url_is_normalized() {
        let client = CatalogClient::new("http://localhost:4000/api/", "token").unwrap();
        assert_eq!(client.base_url, "http://localhost:4000/api");
    }
}
