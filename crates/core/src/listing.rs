//! Listing: the external entity retrieval ranks and returns (spec §3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attribute::AttributeValue;
use crate::intent::Intent;
use crate::Language;

/// A classifieds listing as consumed by the retrieval layer. Owned by the
/// catalog; this crate only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub city_id: i64,
    pub neighborhood_id: Option<i64>,
    pub transaction_type_id: i64,
    pub is_boosted: bool,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub attributes: HashMap<String, AttributeValue>,
}

impl Listing {
    pub fn price(&self) -> Option<f64> {
        self.attributes
            .get(crate::attribute::slugs::PRICE)
            .and_then(AttributeValue::as_number)
    }
}

/// Precomputed per-language embedding for a listing, stored alongside it
/// in a fixed-dimensional vector column (spec §3, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingEmbedding {
    pub listing_id: i64,
    pub language: Language,
    pub vector: Vec<f32>,
}

/// A semantic-cache entry: a previously parsed `Intent` keyed by the
/// embedding of its normalized query text (spec §3 "ParsedResultRecord").
/// Unique on `query_text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedResultRecord {
    pub id: i64,
    pub query_text: String,
    pub query_embedding: Vec<f32>,
    pub parsed_result: Intent,
    pub hit_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParsedResultRecord {
    /// Eviction predicate (spec §3 "Lifecycle"): low-hit-count entries die
    /// young, everything else dies old.
    pub fn is_evictable(&self, now: DateTime<Utc>, max_age_days: i64) -> bool {
        let age = now.signed_duration_since(self.created_at);
        (self.hit_count < 2 && age > chrono::Duration::days(7)) || age > chrono::Duration::days(max_age_days)
    }
}
