// Catalog data service: the single entry point for every catalog read.
// Owns the cache-aside algorithm, cache repopulation, and explicit
// invalidation. Cache failures are invisible here; only upstream failures
// reach the caller.

use tracing::debug;

use crate::cache::CacheStore;
use crate::codec;
use crate::config::Config;
use crate::error::Result;

use super::client::{CatalogClient, Priority};
use super::types::{
    Agency, NewReview, PackageDetails, PackageFilters, PackagePage, PackageSummary, Pagination,
    Review, ReviewPage,
};

use serde::Deserialize;

/// Attributes requested for summary reads and listings. Keeping the field
/// list explicit is a payload-minimization contract with the upstream.
const SUMMARY_FIELDS: &str =
    "id,title,destination,price,currency,rating,status,duration_days,cover_image";

/// Slimmer attribute set for recommendation strips.
const SIMILAR_FIELDS: &str = "id,title,destination,price,rating,cover_image";

/// Single-entity response wrapper used by the upstream API.
#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    data: T,
}

/// Paginated response wrapper used by the upstream API.
#[derive(Debug, Deserialize)]
struct PagedResponse<T> {
    data: Vec<T>,
    pagination: Pagination,
}

/// Cache-aside data service for the travel catalog.
pub struct CatalogService {
    client: CatalogClient,
    cache: CacheStore,
}

impl CatalogService {
    pub fn new(client: CatalogClient, cache: CacheStore) -> Self {
        Self { client, cache }
    }

    /// Build a service from configuration: client from the API settings,
    /// cache from `redis_url` (which may be absent).
    pub async fn from_config(config: &Config) -> Result<Self> {
        let token = config
            .api_token
            .as_deref()
            .ok_or(crate::error::CatalogError::MissingToken)?;
        let client = CatalogClient::new(&config.api_base_url, token)?;
        let cache = CacheStore::connect(config.redis_url.as_deref()).await;
        Ok(Self::new(client, cache))
    }

    /// Fetch a package summary, cache-aside.
    pub async fn package(&self, id: u64) -> Result<PackageSummary> {
        if let Some(raw) = self.cache.get_package(id).await {
            if let Some(hit) = codec::decode_entity(&raw) {
                debug!(id, "package served from cache");
                return Ok(hit);
            }
        }

        let response: DataResponse<PackageSummary> = self
            .client
            .get_json(
                &format!("/packages/{id}"),
                &[("fields", SUMMARY_FIELDS.to_string())],
                Priority::Interactive,
            )
            .await?;
        self.cache
            .set_package(id, &codec::encode_entity(&response.data))
            .await;
        Ok(response.data)
    }

    /// Fetch a package's detail blob, cache-aside.
    pub async fn package_details(&self, id: u64) -> Result<PackageDetails> {
        if let Some(raw) = self.cache.get_details(id).await {
            if let Some(hit) = codec::decode_entity(&raw) {
                debug!(id, "package details served from cache");
                return Ok(hit);
            }
        }

        let response: DataResponse<PackageDetails> = self
            .client
            .get_json(&format!("/packages/{id}/details"), &[], Priority::Interactive)
            .await?;
        self.cache
            .set_details(id, &codec::encode_entity(&response.data))
            .await;
        Ok(response.data)
    }

    /// Fetch a page of reviews. Only the first page is cached; deeper
    /// pages always go upstream so the single reviews key stays accurate.
    pub async fn package_reviews(&self, id: u64, page: u32, limit: u32) -> Result<ReviewPage> {
        let cacheable = page <= 1;
        if cacheable {
            if let Some(raw) = self.cache.get_reviews(id).await {
                if let Some(hit) = codec::decode_entity(&raw) {
                    debug!(id, "reviews served from cache");
                    return Ok(hit);
                }
            }
        }

        let query = [("page", page.to_string()), ("limit", limit.to_string())];
        let response: PagedResponse<Review> = self
            .client
            .get_json(&format!("/packages/{id}/reviews"), &query, Priority::Interactive)
            .await?;
        let result = ReviewPage {
            reviews: response.data,
            pagination: response.pagination,
        };
        if cacheable {
            self.cache
                .set_reviews(id, &codec::encode_entity(&result))
                .await;
        }
        Ok(result)
    }

    /// Fetch the agency operating a package, cache-aside.
    pub async fn package_agency(&self, id: u64) -> Result<Agency> {
        if let Some(raw) = self.cache.get_agency(id).await {
            if let Some(hit) = codec::decode_entity(&raw) {
                debug!(id, "agency served from cache");
                return Ok(hit);
            }
        }

        let response: DataResponse<Agency> = self
            .client
            .get_json(&format!("/packages/{id}/agency"), &[], Priority::Interactive)
            .await?;
        self.cache
            .set_agency(id, &codec::encode_entity(&response.data))
            .await;
        Ok(response.data)
    }

    /// Fetch similar-package recommendations, cache-aside.
    pub async fn similar_packages(&self, id: u64, limit: u32) -> Result<Vec<PackageSummary>> {
        if let Some(raw) = self.cache.get_similar(id).await {
            if let Some(hit) = codec::decode_entity(&raw) {
                debug!(id, "similar packages served from cache");
                return Ok(hit);
            }
        }

        let query = [
            ("limit", limit.to_string()),
            ("fields", SIMILAR_FIELDS.to_string()),
        ];
        let response: DataResponse<Vec<PackageSummary>> = self
            .client
            .get_json(&format!("/packages/{id}/similar"), &query, Priority::Interactive)
            .await?;
        self.cache
            .set_similar(id, &codec::encode_entity(&response.data))
            .await;
        Ok(response.data)
    }

    /// Fetch a filtered listing, cache-aside under the canonical filter
    /// key. Listing failures propagate to the caller; there is no stale
    /// fallback for listings.
    pub async fn packages(&self, filters: &PackageFilters) -> Result<PackagePage> {
        let filter_key = filters.canonical_string();
        if let Some(raw) = self.cache.get_listing(&filter_key).await {
            if let Some(hit) = codec::decode_entity(&raw) {
                debug!(filter = %filter_key, "listing served from cache");
                return Ok(hit);
            }
        }

        let page = self.fetch_packages(filters, Priority::Interactive).await?;
        self.cache
            .set_listing(&filter_key, &codec::encode_entity(&page))
            .await;
        Ok(page)
    }

    /// Post a review, then invalidate the package's cache entries so the
    /// next read observes it.
    pub async fn add_review(&self, id: u64, review: &NewReview) -> Result<()> {
        self.client
            .post_json(&format!("/packages/{id}/reviews"), review)
            .await?;
        self.cache.invalidate_package(id).await;
        Ok(())
    }

    /// Drop every cache entry for a package. Callers invoke this after
    /// editing or deleting a package upstream.
    pub async fn invalidate_package(&self, id: u64) {
        self.cache.invalidate_package(id).await;
    }

    /// Drop every cached listing. Callers invoke this after any package is
    /// created, edited, or removed.
    pub async fn invalidate_listings(&self) {
        self.cache.invalidate_listings().await;
    }

    /// Warm the default "first page, published" listing if it is not
    /// already cached. Runs at background priority and swallows every
    /// failure; prefetch problems must never be user-visible.
    pub async fn prefetch_popular_packages(&self) {
        let filters = PackageFilters::default();
        let filter_key = filters.canonical_string();
        if self.cache.get_listing(&filter_key).await.is_some() {
            debug!("popular listing already cached, skipping prefetch");
            return;
        }

        match self.fetch_packages(&filters, Priority::Background).await {
            Ok(page) => {
                self.cache
                    .set_listing(&filter_key, &codec::encode_entity(&page))
                    .await;
                debug!(count = page.packages.len(), "prefetched popular packages");
            }
            Err(e) => debug!(error = %e, "popular package prefetch failed"),
        }
    }

    async fn fetch_packages(
        &self,
        filters: &PackageFilters,
        priority: Priority,
    ) -> Result<PackagePage> {
        let mut query = filters.to_query();
        query.push(("fields", SUMMARY_FIELDS.to_string()));
        let response: PagedResponse<PackageSummary> =
            self.client.get_json("/packages", &query, priority).await?;
        Ok(PackagePage {
            packages: response.data,
            pagination: response.pagination,
        })
    }
}
