//! Postgres-backed `TransactionTypeRepository` (spec §3, §6).

use async_trait::async_trait;
use sqlx::FromRow;
use souq_core::{Result, TransactionType, TransactionTypeSlug};

use crate::postgres::client::PgStore;

#[derive(FromRow)]
struct TransactionTypeRow {
    id: i64,
    slug: String,
    name_ar: String,
    name_en: String,
}

impl TryFrom<TransactionTypeRow> for TransactionType {
    type Error = souq_core::Error;

    fn try_from(row: TransactionTypeRow) -> Result<Self> {
        let slug = parse_slug(&row.slug).ok_or_else(|| {
            souq_core::Error::InternalInvariantViolation(format!("unknown transaction type slug: {}", row.slug))
        })?;
        Ok(TransactionType {
            id: row.id,
            slug,
            name_ar: row.name_ar,
            name_en: row.name_en,
        })
    }
}

fn parse_slug(s: &str) -> Option<TransactionTypeSlug> {
    TransactionTypeSlug::all().into_iter().find(|slug| slug.as_str() == s)
}

pub struct PgTransactionTypeRepository {
    store: PgStore,
}

impl PgTransactionTypeRepository {
    pub fn new(store: PgStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl souq_core::TransactionTypeRepository for PgTransactionTypeRepository {
    async fn load_all(&self) -> Result<Vec<TransactionType>> {
        let rows: Vec<TransactionTypeRow> =
            sqlx::query_as("SELECT id, slug, name_ar, name_en FROM transaction_types")
                .fetch_all(self.store.pool())
                .await
                .map_err(crate::error::StoreError::from)?;
        rows.into_iter().map(TransactionType::try_from).collect()
    }
}
