// Catalog module.
// Provides the upstream API client, entity types, and the cache-aside
// data service consumers call.

pub mod client;
pub mod service;
pub mod types;

pub use client::{CatalogClient, Priority};
pub use service::CatalogService;
pub use types::*;
