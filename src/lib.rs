//! Wayfare catalog data layer.
//!
//! A resilient cache-aside data service for travel catalog reads: a
//! safely-degrading cache store over a remote key-value backend, a
//! zlib/base64 payload codec, and an orchestration layer combining
//! upstream fetches with bounded retry, timeouts, and explicit
//! invalidation. A cache outage is never an error, only a slower read.

pub mod cache;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;

pub use cache::{CacheBackend, CacheStore, MemoryBackend};
pub use catalog::{CatalogClient, CatalogService};
pub use config::Config;
pub use error::{CatalogError, Result};
