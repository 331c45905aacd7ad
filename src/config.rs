// Configuration for the catalog data layer.
// All values come from environment variables with sensible defaults.

use std::env;

/// Runtime configuration.
///
/// A missing `REDIS_URL` is not an error: the cache layer simply runs
/// disconnected and every read goes to the upstream API.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream catalog API
    pub api_base_url: String,
    /// Bearer token for the catalog API, from the session provider
    pub api_token: Option<String>,
    /// Redis connection URL; `None` disables caching
    pub redis_url: Option<String>,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// # Environment Variables
    /// - `CATALOG_API_BASE` - Upstream API base URL (default: `http://localhost:4000/api`)
    /// - `CATALOG_API_TOKEN` - Bearer token for upstream requests
    /// - `REDIS_URL` - Cache backend address (e.g. `redis://localhost:6379`)
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("CATALOG_API_BASE")
                .unwrap_or_else(|_| "http://localhost:4000/api".to_string()),
            api_token: env::var("CATALOG_API_TOKEN").ok(),
            redis_url: env::var("REDIS_URL").ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:4000/api".to_string(),
            api_token: None,
            redis_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:4000/api");
        assert!(config.api_token.is_none());
        assert!(config.redis_url.is_none());
    }
}
