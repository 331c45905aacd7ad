// Catalog API response types.
// Defines structs for deserializing upstream catalog responses and the
// filter set used for listings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publication state of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    Published,
    Draft,
    Archived,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PackageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PackageStatus::Published => "published",
            PackageStatus::Draft => "draft",
            PackageStatus::Archived => "archived",
            PackageStatus::Unknown => "unknown",
        }
    }
}

/// Travel package summary, as shown in listings and cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub id: u64,
    pub title: String,
    pub destination: String,
    pub price: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub status: PackageStatus,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

/// Full package detail blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDetails {
    pub id: u64,
    pub description: String,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    #[serde(default)]
    pub included: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub max_group_size: Option<u32>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One day of a package itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Traveler review of a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    pub author: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for posting a new review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub rating: u8,
    pub comment: String,
}

/// Agency operating a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub verified: bool,
}

/// Pagination block attached to list responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// One page of a filtered package listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagePage {
    pub packages: Vec<PackageSummary>,
    pub pagination: Pagination,
}

/// One page of reviews for a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub pagination: Pagination,
}

/// Filter set for package listings.
///
/// The default is the "popular" listing: first page, published packages.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageFilters {
    pub destination: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub status: Option<PackageStatus>,
    pub sort: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for PackageFilters {
    fn default() -> Self {
        Self {
            destination: None,
            category: None,
            min_price: None,
            max_price: None,
            status: Some(PackageStatus::Published),
            sort: None,
            page: 1,
            limit: 20,
        }
    }
}

impl PackageFilters {
    /// Deterministic cache-key fragment for this filter set.
    ///
    /// Pairs are sorted by key and joined as `key=value&…`, so logically
    /// equal filter sets always map to the same cache key.
    pub fn canonical_string(&self) -> String {
        let pairs: BTreeMap<&str, String> = self.pairs().into_iter().collect();
        pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Query parameters for the upstream listing request.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        self.pairs()
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(destination) = &self.destination {
            pairs.push(("destination", destination.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(min_price) = self.min_price {
            pairs.push(("min_price", min_price.to_string()));
        }
        if let Some(max_price) = self.max_price {
            pairs.push(("max_price", max_price.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        pairs
    }
}
