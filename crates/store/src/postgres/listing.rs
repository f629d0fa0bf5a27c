//! Postgres-backed `ListingRepository` (spec §4.8, §6).
//!
//! Predicates are always bound as positional parameters via
//! `sqlx::QueryBuilder`; user text never reaches the SQL string itself
//! (spec §4.7 "must never interpolate user text into predicate syntax").

use std::collections::HashMap;

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::{FromRow, Postgres, QueryBuilder};
use souq_core::{attribute::slugs, AttributeValue, Language, Listing, ListingPredicate, Result};

use crate::postgres::client::PgStore;

#[derive(FromRow)]
struct ListingRow {
    id: i64,
    title: String,
    description: String,
    category_id: i64,
    city_id: i64,
    neighborhood_id: Option<i64>,
    transaction_type_id: i64,
    is_boosted: bool,
    priority: i32,
    created_at: chrono::DateTime<chrono::Utc>,
    attributes: serde_json::Value,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        let attributes: HashMap<String, AttributeValue> =
            serde_json::from_value(row.attributes).unwrap_or_default();
        Listing {
            id: row.id,
            title: row.title,
            description: row.description,
            category_id: row.category_id,
            city_id: row.city_id,
            neighborhood_id: row.neighborhood_id,
            transaction_type_id: row.transaction_type_id,
            is_boosted: row.is_boosted,
            priority: row.priority,
            created_at: row.created_at,
            attributes,
        }
    }
}

pub struct PgListingRepository {
    store: PgStore,
}

impl PgListingRepository {
    pub fn new(store: PgStore) -> Self {
        Self { store }
    }
}

/// Appends `WHERE status = 'active' AND ...` clauses for `predicate` to
/// `qb`, binding every value positionally.
fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &ListingPredicate) {
    qb.push(" WHERE status = 'active'");

    if let Some(category_id) = predicate.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(prefix) = &predicate.category_path_prefix {
        qb.push(" AND category_path LIKE ").push_bind(format!("{prefix}%"));
    }
    if let Some(city_id) = predicate.city_id {
        qb.push(" AND city_id = ").push_bind(city_id);
    }
    if let Some(neighborhood_id) = predicate.neighborhood_id {
        qb.push(" AND neighborhood_id = ").push_bind(neighborhood_id);
    }
    if let Some(transaction_type_id) = predicate.transaction_type_id {
        qb.push(" AND transaction_type_id = ").push_bind(transaction_type_id);
    }
    if let Some(min) = predicate.price_min {
        qb.push(" AND (attributes->>'price')::float8 >= ").push_bind(min);
    }
    if let Some(max) = predicate.price_max {
        qb.push(" AND (attributes->>'price')::float8 <= ").push_bind(max);
    }
    if let Some(min) = predicate.area_min {
        qb.push(" AND (attributes->>'area')::float8 >= ").push_bind(min);
    }
    if let Some(max) = predicate.area_max {
        qb.push(" AND (attributes->>'area')::float8 <= ").push_bind(max);
    }
    for (slug, min, max) in &predicate.extra_numeric {
        if let Some(min) = min {
            qb.push(" AND (attributes->>").push_bind(slug.clone()).push(")::float8 >= ").push_bind(*min);
        }
        if let Some(max) = max {
            qb.push(" AND (attributes->>").push_bind(slug.clone()).push(")::float8 <= ").push_bind(*max);
        }
    }
    for (slug, value) in &predicate.extra_enum {
        qb.push(" AND lower(attributes->>").push_bind(slug.clone()).push(") = ").push_bind(value.clone());
    }
    let _ = slugs::PRICE_HINT; // documents that price_hint rides extra_enum like any other enum/hint slug.
}

fn embedding_column(language: Language) -> &'static str {
    match language {
        Language::Ar => "embedding_ar",
        Language::En => "embedding_en",
    }
}

#[async_trait]
impl souq_core::ListingRepository for PgListingRepository {
    async fn has_any(&self, predicate: &ListingPredicate) -> Result<bool> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT EXISTS(SELECT 1 FROM listings");
        push_predicate(&mut qb, predicate);
        qb.push(")");

        let exists: bool = qb
            .build_query_scalar()
            .fetch_one(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;
        Ok(exists)
    }

    async fn has_embedded(&self, language: Language, predicate: &ListingPredicate) -> Result<bool> {
        let column = embedding_column(language);
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT EXISTS(SELECT 1 FROM listings");
        push_predicate(&mut qb, predicate);
        qb.push(format!(" AND {column} IS NOT NULL)"));

        let exists: bool = qb
            .build_query_scalar()
            .fetch_one(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;
        Ok(exists)
    }

    async fn has_indexed_text(&self, predicate: &ListingPredicate) -> Result<bool> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT EXISTS(SELECT 1 FROM listings");
        push_predicate(&mut qb, predicate);
        qb.push(" AND search_vector IS NOT NULL)");

        let exists: bool = qb
            .build_query_scalar()
            .fetch_one(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;
        Ok(exists)
    }

    async fn fetch_page(&self, predicate: &ListingPredicate, offset: u32, limit: u32) -> Result<Vec<Listing>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, title, description, category_id, city_id, neighborhood_id, transaction_type_id, \
             is_boosted, priority, created_at, attributes FROM listings",
        );
        push_predicate(&mut qb, predicate);
        qb.push(" ORDER BY is_boosted DESC, priority DESC, created_at DESC");
        qb.push(" LIMIT ").push_bind(limit as i64).push(" OFFSET ").push_bind(offset as i64);

        let rows: Vec<ListingRow> = qb
            .build_query_as()
            .fetch_all(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(Listing::from).collect())
    }

    async fn nearest_by_embedding(
        &self,
        language: Language,
        query_vector: &[f32],
        predicate: &ListingPredicate,
        k: u32,
    ) -> Result<Vec<(Listing, f32)>> {
        let column = embedding_column(language);
        let vector = Vector::from(query_vector.to_vec());

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            format!(
                "SELECT id, title, description, category_id, city_id, neighborhood_id, transaction_type_id, \
                 is_boosted, priority, created_at, attributes, 1 - ({column} <=> "
            ),
        );
        qb.push_bind(vector).push(") AS cosine_similarity FROM listings");
        push_predicate(&mut qb, predicate);
        qb.push(format!(
            " ORDER BY cosine_similarity DESC, is_boosted DESC, priority DESC, created_at DESC LIMIT "
        ));
        qb.push_bind(k as i64);

        let rows: Vec<(
            i64,
            String,
            String,
            i64,
            i64,
            Option<i64>,
            i64,
            bool,
            i32,
            chrono::DateTime<chrono::Utc>,
            serde_json::Value,
            f32,
        )> = qb
            .build_query_as()
            .fetch_all(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;

        Ok(rows
            .into_iter()
            .map(|(id, title, description, category_id, city_id, neighborhood_id, transaction_type_id, is_boosted, priority, created_at, attributes, score)| {
                let listing = Listing::from(ListingRow {
                    id,
                    title,
                    description,
                    category_id,
                    city_id,
                    neighborhood_id,
                    transaction_type_id,
                    is_boosted,
                    priority,
                    created_at,
                    attributes,
                });
                (listing, score)
            })
            .collect())
    }

    async fn lexical_search(
        &self,
        language: Language,
        query_text: &str,
        predicate: &ListingPredicate,
        k: u32,
    ) -> Result<Vec<(Listing, f32)>> {
        let config = language.fts_config();

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT id, title, description, category_id, city_id, neighborhood_id, transaction_type_id, \
             is_boosted, priority, created_at, attributes, \
             ts_rank(search_vector, websearch_to_tsquery('{config}', "
        ));
        qb.push_bind(query_text.to_string());
        qb.push(format!(")) AS rank FROM listings"));
        push_predicate(&mut qb, predicate);
        qb.push(format!(" AND search_vector @@ websearch_to_tsquery('{config}', "));
        qb.push_bind(query_text.to_string());
        qb.push(")");
        qb.push(" ORDER BY rank DESC, is_boosted DESC, priority DESC, created_at DESC LIMIT ");
        qb.push_bind(k as i64);

        let rows: Vec<(
            i64,
            String,
            String,
            i64,
            i64,
            Option<i64>,
            i64,
            bool,
            i32,
            chrono::DateTime<chrono::Utc>,
            serde_json::Value,
            f32,
        )> = qb
            .build_query_as()
            .fetch_all(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;

        Ok(rows
            .into_iter()
            .map(|(id, title, description, category_id, city_id, neighborhood_id, transaction_type_id, is_boosted, priority, created_at, attributes, rank)| {
                let listing = Listing::from(ListingRow {
                    id,
                    title,
                    description,
                    category_id,
                    city_id,
                    neighborhood_id,
                    transaction_type_id,
                    is_boosted,
                    priority,
                    created_at,
                    attributes,
                });
                (listing, rank)
            })
            .collect())
    }

    /// `titleOnlySearch` fallback (spec §4.8): ILIKE on title only,
    /// expanding each token with its ta-marbuta-swapped variant.
    async fn title_only_search(&self, tokens: &[String], predicate: &ListingPredicate, k: u32) -> Result<Vec<Listing>> {
        let expanded = expand_tokens(tokens);
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, title, description, category_id, city_id, neighborhood_id, transaction_type_id, \
             is_boosted, priority, created_at, attributes FROM listings",
        );
        qb.push(" WHERE status = 'active'");
        push_token_ilike(&mut qb, &expanded, &["title"]);
        append_extra_predicate(&mut qb, predicate);
        qb.push(" ORDER BY is_boosted DESC, priority DESC, created_at DESC LIMIT ").push_bind(k as i64);

        let rows: Vec<ListingRow> = qb
            .build_query_as()
            .fetch_all(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(Listing::from).collect())
    }

    /// `fallbackSearch` (spec §4.8): ILIKE on title and description with
    /// the same token expansion.
    async fn fallback_search(&self, tokens: &[String], predicate: &ListingPredicate, k: u32) -> Result<Vec<Listing>> {
        let expanded = expand_tokens(tokens);
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, title, description, category_id, city_id, neighborhood_id, transaction_type_id, \
             is_boosted, priority, created_at, attributes FROM listings",
        );
        qb.push(" WHERE status = 'active'");
        push_token_ilike(&mut qb, &expanded, &["title", "description"]);
        append_extra_predicate(&mut qb, predicate);
        qb.push(" ORDER BY is_boosted DESC, priority DESC, created_at DESC LIMIT ").push_bind(k as i64);

        let rows: Vec<ListingRow> = qb
            .build_query_as()
            .fetch_all(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(Listing::from).collect())
    }
}

fn expand_tokens(tokens: &[String]) -> Vec<String> {
    let mut expanded = Vec::with_capacity(tokens.len() * 2);
    for token in tokens {
        expanded.push(token.clone());
        let variant = souq_text::ta_marbuta_variant(token);
        if variant != *token {
            expanded.push(variant);
        }
    }
    expanded
}

fn push_token_ilike(qb: &mut QueryBuilder<'_, Postgres>, tokens: &[String], columns: &[&str]) {
    if tokens.is_empty() {
        return;
    }
    qb.push(" AND (");
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push("(");
        for (j, column) in columns.iter().enumerate() {
            if j > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("{column} ILIKE "));
            qb.push_bind(format!("%{token}%"));
        }
        qb.push(")");
    }
    qb.push(")");
}

/// Only the non-category/location/transaction predicate fields apply to
/// the global fallback searches, which intentionally drop the category
/// filter (spec §4.9 step 6 "call `titleOnlySearch` globally, no
/// category filter").
fn append_extra_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &ListingPredicate) {
    if let Some(city_id) = predicate.city_id {
        qb.push(" AND city_id = ").push_bind(city_id);
    }
    if let Some(neighborhood_id) = predicate.neighborhood_id {
        qb.push(" AND neighborhood_id = ").push_bind(neighborhood_id);
    }
    if let Some(transaction_type_id) = predicate.transaction_type_id {
        qb.push(" AND transaction_type_id = ").push_bind(transaction_type_id);
    }
}
