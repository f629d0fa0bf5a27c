//! Postgres-backed `CategoryRepository` (spec §4.3.1, §6).

use async_trait::async_trait;
use sqlx::FromRow;
use souq_core::{Category, CategoryKeywords, CategoryWithKeywords, Language, Result};

use crate::postgres::client::PgStore;

#[derive(FromRow)]
struct CategoryRow {
    id: i64,
    slug: String,
    name_ar: String,
    name_en: String,
    level: i32,
    parent_id: Option<i64>,
    path: String,
    active: bool,
    sort_order: i32,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            slug: row.slug,
            name_ar: row.name_ar,
            name_en: row.name_en,
            level: row.level,
            parent_id: row.parent_id,
            path: row.path,
            active: row.active,
            sort_order: row.sort_order,
        }
    }
}

#[derive(FromRow)]
struct CategoryKeywordsRow {
    category_id: i64,
    keywords_ar: Vec<String>,
    keywords_en: Vec<String>,
    meta_keywords_ar: String,
    meta_keywords_en: String,
}

impl From<CategoryKeywordsRow> for CategoryKeywords {
    fn from(row: CategoryKeywordsRow) -> Self {
        CategoryKeywords {
            category_id: row.category_id,
            keywords_ar: row.keywords_ar,
            keywords_en: row.keywords_en,
            meta_keywords_ar: row.meta_keywords_ar,
            meta_keywords_en: row.meta_keywords_en,
        }
    }
}

pub struct PgCategoryRepository {
    store: PgStore,
}

impl PgCategoryRepository {
    pub fn new(store: PgStore) -> Self {
        Self { store }
    }
}

fn keyword_column(language: Language) -> &'static str {
    match language {
        Language::Ar => "keywords_ar",
        Language::En => "keywords_en",
    }
}

fn meta_keyword_column(language: Language) -> &'static str {
    match language {
        Language::Ar => "meta_keywords_ar",
        Language::En => "meta_keywords_en",
    }
}

#[async_trait]
impl souq_core::CategoryRepository for PgCategoryRepository {
    async fn load_all_with_keywords(&self) -> Result<Vec<CategoryWithKeywords>> {
        let categories: Vec<CategoryRow> = sqlx::query_as(
            "SELECT id, slug, name_ar, name_en, level, parent_id, path, active, sort_order \
             FROM categories WHERE active = true ORDER BY level DESC, sort_order ASC",
        )
        .fetch_all(self.store.pool())
        .await
        .map_err(crate::error::StoreError::from)?;

        let mut out = Vec::with_capacity(categories.len());
        for row in categories {
            let category: Category = row.into();
            let keywords: Option<CategoryKeywordsRow> = sqlx::query_as(
                "SELECT category_id, keywords_ar, keywords_en, meta_keywords_ar, meta_keywords_en \
                 FROM category_keywords WHERE category_id = $1",
            )
            .bind(category.id)
            .fetch_optional(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;

            let keywords = keywords
                .map(CategoryKeywords::from)
                .unwrap_or_else(|| CategoryKeywords {
                    category_id: category.id,
                    ..Default::default()
                });

            out.push(CategoryWithKeywords { category, keywords });
        }
        Ok(out)
    }

    async fn get(&self, id: i64) -> Result<Option<Category>> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "SELECT id, slug, name_ar, name_en, level, parent_id, path, active, sort_order \
             FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.store.pool())
        .await
        .map_err(crate::error::StoreError::from)?;
        Ok(row.map(Category::from))
    }

    async fn children(&self, parent_id: i64) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            "SELECT id, slug, name_ar, name_en, level, parent_id, path, active, sort_order \
             FROM categories WHERE parent_id = $1 AND active = true ORDER BY sort_order ASC",
        )
        .bind(parent_id)
        .fetch_all(self.store.pool())
        .await
        .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn active_child_count(&self, id: i64) -> Result<usize> {
        let count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM categories WHERE parent_id = $1 AND active = true")
                .bind(id)
                .fetch_one(self.store.pool())
                .await
                .map_err(crate::error::StoreError::from)?;
        Ok(count as usize)
    }

    async fn keyword_array_match(&self, tokens: &[String], language: Language) -> Result<Vec<(Category, usize)>> {
        let column = keyword_column(language);
        let sql = format!(
            "SELECT c.id, c.slug, c.name_ar, c.name_en, c.level, c.parent_id, c.path, c.active, c.sort_order, \
             cardinality(ARRAY(SELECT unnest(k.{column}) INTERSECT SELECT unnest($1::text[]))) AS match_count \
             FROM categories c JOIN category_keywords k ON k.category_id = c.id \
             WHERE c.active = true AND k.{column} && $1::text[] \
             ORDER BY match_count DESC, c.level DESC, c.sort_order ASC"
        );
        let rows: Vec<(CategoryRow, i64)> = sqlx::query_as(&sql)
            .bind(tokens)
            .fetch_all(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(|(row, count)| (row.into(), count as usize)).collect())
    }

    async fn meta_keyword_ilike(&self, token: &str, language: Language) -> Result<Vec<Category>> {
        let column = meta_keyword_column(language);
        let sql = format!(
            "SELECT c.id, c.slug, c.name_ar, c.name_en, c.level, c.parent_id, c.path, c.active, c.sort_order \
             FROM categories c JOIN category_keywords k ON k.category_id = c.id \
             WHERE c.active = true AND k.{column} ILIKE '%' || $1 || '%' \
             ORDER BY c.level DESC, c.sort_order ASC"
        );
        let rows: Vec<CategoryRow> = sqlx::query_as(&sql)
            .bind(token)
            .fetch_all(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn fulltext_search(&self, query: &str, language: Language) -> Result<Vec<(Category, f32)>> {
        let config = language.fts_config();
        let sql = format!(
            "SELECT id, slug, name_ar, name_en, level, parent_id, path, active, sort_order, \
             ts_rank(to_tsvector('{config}', name_en || ' ' || name_ar), plainto_tsquery('{config}', $1)) AS rank \
             FROM categories \
             WHERE active = true AND to_tsvector('{config}', name_en || ' ' || name_ar) @@ plainto_tsquery('{config}', $1) \
             ORDER BY rank DESC, level DESC"
        );
        let rows: Vec<(CategoryRow, f32)> = sqlx::query_as(&sql)
            .bind(query)
            .fetch_all(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(|(row, rank)| (row.into(), rank)).collect())
    }

    async fn trigram_similar(&self, token: &str) -> Result<Vec<(Category, f32)>> {
        let rows: Vec<(CategoryRow, f32)> = sqlx::query_as(
            "SELECT id, slug, name_ar, name_en, level, parent_id, path, active, sort_order, \
             GREATEST(similarity(name_en, $1), similarity(slug, $1)) AS score \
             FROM categories WHERE active = true ORDER BY score DESC LIMIT 20",
        )
        .bind(token)
        .fetch_all(self.store.pool())
        .await
        .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(|(row, score)| (row.into(), score)).collect())
    }

    async fn active_descendants(&self, parent_id: i64) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            "WITH RECURSIVE descendants AS ( \
               SELECT id, slug, name_ar, name_en, level, parent_id, path, active, sort_order \
               FROM categories WHERE parent_id = $1 AND active = true \
               UNION ALL \
               SELECT c.id, c.slug, c.name_ar, c.name_en, c.level, c.parent_id, c.path, c.active, c.sort_order \
               FROM categories c JOIN descendants d ON c.parent_id = d.id WHERE c.active = true \
             ) SELECT * FROM descendants",
        )
        .bind(parent_id)
        .fetch_all(self.store.pool())
        .await
        .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn active_descendants_with_keywords(&self, parent_id: i64) -> Result<Vec<CategoryWithKeywords>> {
        let categories = self.active_descendants(parent_id).await?;
        let mut out = Vec::with_capacity(categories.len());
        for category in categories {
            let keywords: Option<CategoryKeywordsRow> = sqlx::query_as(
                "SELECT category_id, keywords_ar, keywords_en, meta_keywords_ar, meta_keywords_en \
                 FROM category_keywords WHERE category_id = $1",
            )
            .bind(category.id)
            .fetch_optional(self.store.pool())
            .await
            .map_err(crate::error::StoreError::from)?;

            let keywords = keywords
                .map(CategoryKeywords::from)
                .unwrap_or_else(|| CategoryKeywords {
                    category_id: category.id,
                    ..Default::default()
                });

            out.push(CategoryWithKeywords { category, keywords });
        }
        Ok(out)
    }
}
