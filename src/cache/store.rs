// Safely-degrading cache store over a remote key-value backend.
// Backend failures are absorbed here: every public operation resolves to
// its fallback value instead of erroring, so a cache outage can never take
// down a read path.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::keys;

/// Errors raised by cache backends. These never escape the cache module's
/// public API; `CacheStore` converts them into fallback values.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Remote key-value backend consumed by the store.
///
/// `set` supplies value and TTL in a single call; an entry is never
/// written without its expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;
    async fn del(&self, keys: &[String]) -> CacheResult<u64>;
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>>;
}

/// Redis backend over a multiplexed async connection.
pub struct RedisBackend {
    conn: MultiplexedConnection,
}

impl RedisBackend {
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        if ttl < Duration::from_secs(1) {
            // EX truncates to whole seconds; short TTLs need PX.
            let _: () = redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("PX")
                .arg(ttl.as_millis() as u64)
                .query_async(&mut conn)
                .await?;
        } else {
            let _: () = conn.set_ex(key, value, ttl.as_secs()).await?;
        }
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        Ok(conn.del(keys.to_vec()).await?)
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.keys(pattern).await?)
    }
}

/// In-process backend with per-entry deadlines.
/// Used by tests and single-process deployments without Redis.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Glob match supporting the trailing-`*` patterns used by the store.
    fn pattern_matches(pattern: &str, key: &str) -> bool {
        match pattern.strip_suffix('*') {
            Some(prefix) => key.starts_with(prefix),
            None => pattern == key,
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.value.clone()));
            }
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let entry = MemoryEntry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> CacheResult<u64> {
        let mut entries = self.entries.write().await;
        let mut removed = 0;
        for key in keys {
            if entries.remove(key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        Ok(entries
            .iter()
            .filter(|(key, entry)| entry.expires_at > now && Self::pattern_matches(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

/// Namespaced, safely-degrading cache over a `CacheBackend`.
///
/// A store without a backend (no `REDIS_URL`, or the connection failed at
/// startup) is fully usable: every get is a miss and every write a no-op.
pub struct CacheStore {
    backend: Option<Arc<dyn CacheBackend>>,
}

impl CacheStore {
    /// Connect to the backend at `url`. Never fails: a missing URL or an
    /// unreachable backend yields a disconnected store.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else {
            warn!("no cache backend configured, running without cache");
            return Self::disabled();
        };
        match RedisBackend::connect(url).await {
            Ok(backend) => Self::with_backend(Arc::new(backend)),
            Err(e) => {
                warn!(error = %e, "cache backend unreachable, running without cache");
                Self::disabled()
            }
        }
    }

    /// A store with no backend; every operation resolves to its fallback.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Wrap an existing backend, typically a `MemoryBackend` in tests.
    pub fn with_backend(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.backend.is_some()
    }

    /// Run one backend operation, converting any failure into `fallback`.
    /// Every public method goes through here; this is the whole
    /// "cache errors are never fatal" policy in one place.
    async fn safe<T, F, Fut>(&self, what: &str, fallback: T, op: F) -> T
    where
        F: FnOnce(Arc<dyn CacheBackend>) -> Fut,
        Fut: Future<Output = CacheResult<T>>,
    {
        let Some(backend) = self.backend.clone() else {
            return fallback;
        };
        match op(backend).await {
            Ok(value) => value,
            Err(e) => {
                warn!(operation = what, error = %e, "cache operation failed, degrading");
                fallback
            }
        }
    }

    async fn lookup(&self, key: String) -> Option<String> {
        self.safe("get", None, |b| async move { b.get(&key).await })
            .await
    }

    async fn write(&self, key: String, payload: String, ttl: Duration) {
        self.safe("set", (), |b| async move { b.set(&key, &payload, ttl).await })
            .await
    }

    pub async fn get_package(&self, id: u64) -> Option<String> {
        self.lookup(keys::package(id)).await
    }

    pub async fn set_package(&self, id: u64, payload: &str) {
        self.write(keys::package(id), payload.to_string(), keys::PACKAGE_TTL)
            .await
    }

    pub async fn get_details(&self, id: u64) -> Option<String> {
        self.lookup(keys::details(id)).await
    }

    pub async fn set_details(&self, id: u64, payload: &str) {
        self.write(keys::details(id), payload.to_string(), keys::DETAILS_TTL)
            .await
    }

    pub async fn get_reviews(&self, id: u64) -> Option<String> {
        self.lookup(keys::reviews(id)).await
    }

    pub async fn set_reviews(&self, id: u64, payload: &str) {
        self.write(keys::reviews(id), payload.to_string(), keys::REVIEWS_TTL)
            .await
    }

    pub async fn get_agency(&self, id: u64) -> Option<String> {
        self.lookup(keys::agency(id)).await
    }

    pub async fn set_agency(&self, id: u64, payload: &str) {
        self.write(keys::agency(id), payload.to_string(), keys::AGENCY_TTL)
            .await
    }

    pub async fn get_similar(&self, id: u64) -> Option<String> {
        self.lookup(keys::similar(id)).await
    }

    pub async fn set_similar(&self, id: u64, payload: &str) {
        self.write(keys::similar(id), payload.to_string(), keys::SIMILAR_TTL)
            .await
    }

    pub async fn get_listing(&self, filter: &str) -> Option<String> {
        self.lookup(keys::listing(filter)).await
    }

    pub async fn set_listing(&self, filter: &str, payload: &str) {
        self.write(keys::listing(filter), payload.to_string(), keys::LISTING_TTL)
            .await
    }

    /// Delete every key namespaced under `id` in one batched call.
    pub async fn invalidate_package(&self, id: u64) {
        let package_keys = keys::all_for_package(id);
        let removed = self
            .safe("invalidate_package", 0, |b| async move {
                b.del(&package_keys).await
            })
            .await;
        debug!(id, removed, "invalidated package cache entries");
    }

    /// Delete every cached listing. When enumeration finds nothing, no
    /// delete call is issued.
    pub async fn invalidate_listings(&self) {
        let removed = self
            .safe("invalidate_listings", 0, |b| async move {
                let matching = b.keys(keys::LISTING_PATTERN).await?;
                if matching.is_empty() {
                    return Ok(0);
                }
                b.del(&matching).await
            })
            .await;
        debug!(removed, "invalidated listing cache entries");
    }
}
