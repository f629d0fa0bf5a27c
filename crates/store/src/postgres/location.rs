//! Postgres-backed `LocationRepository` (spec §4.3.2, §6).

use async_trait::async_trait;
use sqlx::FromRow;
use souq_core::{City, Neighborhood, Result};

use crate::postgres::client::PgStore;

#[derive(FromRow)]
struct CityRow {
    id: i64,
    name_ar: String,
    name_en: String,
    province_name_ar: String,
    province_name_en: String,
    lat: Option<f64>,
    lon: Option<f64>,
    active: bool,
}

impl From<CityRow> for City {
    fn from(row: CityRow) -> Self {
        City {
            id: row.id,
            name_ar: row.name_ar,
            name_en: row.name_en,
            province_name_ar: row.province_name_ar,
            province_name_en: row.province_name_en,
            lat: row.lat,
            lon: row.lon,
            active: row.active,
        }
    }
}

#[derive(FromRow)]
struct NeighborhoodRow {
    id: i64,
    name_ar: String,
    name_en: String,
    city_id: i64,
}

impl From<NeighborhoodRow> for Neighborhood {
    fn from(row: NeighborhoodRow) -> Self {
        Neighborhood {
            id: row.id,
            name_ar: row.name_ar,
            name_en: row.name_en,
            city_id: row.city_id,
        }
    }
}

pub struct PgLocationRepository {
    store: PgStore,
}

impl PgLocationRepository {
    pub fn new(store: PgStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl souq_core::LocationRepository for PgLocationRepository {
    async fn load_all_cities(&self) -> Result<Vec<City>> {
        let rows: Vec<CityRow> = sqlx::query_as(
            "SELECT id, name_ar, name_en, province_name_ar, province_name_en, lat, lon, active \
             FROM cities WHERE active = true",
        )
        .fetch_all(self.store.pool())
        .await
        .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(City::from).collect())
    }

    async fn load_all_neighborhoods(&self) -> Result<Vec<Neighborhood>> {
        let rows: Vec<NeighborhoodRow> =
            sqlx::query_as("SELECT id, name_ar, name_en, city_id FROM neighborhoods")
                .fetch_all(self.store.pool())
                .await
                .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(Neighborhood::from).collect())
    }

    async fn get_city(&self, id: i64) -> Result<Option<City>> {
        let row: Option<CityRow> = sqlx::query_as(
            "SELECT id, name_ar, name_en, province_name_ar, province_name_en, lat, lon, active \
             FROM cities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.store.pool())
        .await
        .map_err(crate::error::StoreError::from)?;
        Ok(row.map(City::from))
    }

    async fn trigram_similar_cities(&self, token: &str) -> Result<Vec<(City, f32)>> {
        let rows: Vec<(CityRow, f32)> = sqlx::query_as(
            "SELECT id, name_ar, name_en, province_name_ar, province_name_en, lat, lon, active, \
             GREATEST(similarity(name_en, $1), similarity(province_name_en, $1)) AS score \
             FROM cities WHERE active = true ORDER BY score DESC LIMIT 10",
        )
        .bind(token)
        .fetch_all(self.store.pool())
        .await
        .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(|(row, score)| (row.into(), score)).collect())
    }

    async fn trigram_similar_neighborhoods(&self, token: &str) -> Result<Vec<(Neighborhood, f32)>> {
        let rows: Vec<(NeighborhoodRow, f32)> = sqlx::query_as(
            "SELECT id, name_ar, name_en, city_id, similarity(name_en, $1) AS score \
             FROM neighborhoods ORDER BY score DESC LIMIT 10",
        )
        .bind(token)
        .fetch_all(self.store.pool())
        .await
        .map_err(crate::error::StoreError::from)?;
        Ok(rows.into_iter().map(|(row, score)| (row.into(), score)).collect())
    }
}
