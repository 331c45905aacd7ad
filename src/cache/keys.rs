// Cache key construction and TTL classes.
// Builds the namespaced keys for every cached catalog entity.

use std::time::Duration;

/// Package summaries and details change rarely: 1 hour.
pub const PACKAGE_TTL: Duration = Duration::from_secs(60 * 60);

/// Package detail blobs share the package TTL class.
pub const DETAILS_TTL: Duration = PACKAGE_TTL;

/// Reviews accrue over time: 30 minutes.
pub const REVIEWS_TTL: Duration = Duration::from_secs(30 * 60);

/// Agency records share the package TTL class.
pub const AGENCY_TTL: Duration = PACKAGE_TTL;

/// Similar-package recommendations share the package TTL class.
pub const SIMILAR_TTL: Duration = PACKAGE_TTL;

/// Filtered listings are the most volatile: 15 minutes.
pub const LISTING_TTL: Duration = Duration::from_secs(15 * 60);

/// Pattern matching every cached listing, for bulk invalidation.
pub const LISTING_PATTERN: &str = "packages:list:*";

/// Key for a package summary.
pub fn package(id: u64) -> String {
    format!("package:{id}")
}

/// Key for a package's detail blob.
pub fn details(id: u64) -> String {
    format!("package:{id}:details")
}

/// Key for a package's first page of reviews.
pub fn reviews(id: u64) -> String {
    format!("package:{id}:reviews")
}

/// Key for the agency owning a package.
pub fn agency(id: u64) -> String {
    format!("package:{id}:agency")
}

/// Key for a package's similar-package recommendations.
pub fn similar(id: u64) -> String {
    format!("package:{id}:similar")
}

/// Key for a filtered listing. `filter` must already be canonical
/// (see `PackageFilters::canonical_string`).
pub fn listing(filter: &str) -> String {
    format!("packages:list:{filter}")
}

/// Every key namespaced under a single package, for batched invalidation.
pub fn all_for_package(id: u64) -> [String; 5] {
    [package(id), details(id), reviews(id), agency(id), similar(id)]
}
