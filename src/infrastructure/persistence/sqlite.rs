//! SQLite persistence adapter
//!
//! Each record is stored as a JSON document, one table per record type.
//! Columns beside `document` exist only for lookups.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::application::ports::outbound::{
    FactionRepositoryPort, PoiRepositoryPort, RegionRepositoryPort, RelationshipRepositoryPort,
    RepositoryError, RepositoryResult, TensionRepositoryPort, WarRepositoryPort,
};
use crate::domain::entities::{
    Faction, FactionPair, FactionRelationship, PointOfInterest, Region, TensionSnapshot, WarState,
};
use crate::domain::value_objects::{FactionId, PoiId, RegionId, WarId};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS regions (
        id TEXT PRIMARY KEY,
        document TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS factions (
        id TEXT PRIMARY KEY,
        document TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS points_of_interest (
        id TEXT PRIMARY KEY,
        region_id TEXT NOT NULL,
        document TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS relationships (
        id TEXT PRIMARY KEY,
        document TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS wars (
        id TEXT PRIMARY KEY,
        pair TEXT NOT NULL,
        is_active INTEGER NOT NULL,
        document TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tension_states (
        id TEXT PRIMARY KEY,
        document TEXT NOT NULL
    )
    "#,
];

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> RepositoryResult<String> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(document: &str) -> RepositoryResult<T> {
    serde_json::from_str(document).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<(String,)>) -> RepositoryResult<Vec<T>> {
    rows.iter().map(|(document,)| decode(document)).collect()
}

fn location_key(region_id: RegionId, poi_id: PoiId) -> String {
    format!("{}/{}", region_id, poi_id)
}

/// Repository for all simulation records in one SQLite database
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch<T: DeserializeOwned>(&self, table: &str, id: String) -> RepositoryResult<Option<T>> {
        let row: Option<(String,)> =
            sqlx::query_as(&format!("SELECT document FROM {table} WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        row.map(|(document,)| decode(&document)).transpose()
    }

    async fn fetch_all<T: DeserializeOwned>(&self, table: &str) -> RepositoryResult<Vec<T>> {
        let rows: Vec<(String,)> =
            sqlx::query_as(&format!("SELECT document FROM {table} ORDER BY id"))
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
        decode_rows(rows)
    }

    async fn upsert(&self, table: &str, id: String, document: String) -> RepositoryResult<()> {
        sqlx::query(&format!(
            "INSERT OR REPLACE INTO {table} (id, document) VALUES (?, ?)"
        ))
        .bind(id)
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn replace(
        &self,
        table: &str,
        kind: &'static str,
        id: String,
        document: String,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(&format!("UPDATE {table} SET document = ? WHERE id = ?"))
            .bind(document)
            .bind(&id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(kind, id));
        }
        Ok(())
    }

    async fn remove(&self, table: &str, id: String) -> RepositoryResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Regions and factions
// =============================================================================

#[async_trait]
impl RegionRepositoryPort for SqliteRepository {
    async fn get(&self, id: RegionId) -> RepositoryResult<Option<Region>> {
        self.fetch("regions", id.to_string()).await
    }

    async fn save(&self, region: &Region) -> RepositoryResult<()> {
        self.upsert("regions", region.id.to_string(), encode(region)?).await
    }

    async fn update(&self, region: &Region) -> RepositoryResult<()> {
        self.replace("regions", "Region", region.id.to_string(), encode(region)?)
            .await
    }

    async fn delete(&self, id: RegionId) -> RepositoryResult<bool> {
        self.remove("regions", id.to_string()).await
    }

    async fn list(&self) -> RepositoryResult<Vec<Region>> {
        self.fetch_all("regions").await
    }
}

#[async_trait]
impl FactionRepositoryPort for SqliteRepository {
    async fn get(&self, id: FactionId) -> RepositoryResult<Option<Faction>> {
        self.fetch("factions", id.to_string()).await
    }

    async fn save(&self, faction: &Faction) -> RepositoryResult<()> {
        self.upsert("factions", faction.id.to_string(), encode(faction)?).await
    }

    async fn update(&self, faction: &Faction) -> RepositoryResult<()> {
        self.replace("factions", "Faction", faction.id.to_string(), encode(faction)?)
            .await
    }

    async fn delete(&self, id: FactionId) -> RepositoryResult<bool> {
        self.remove("factions", id.to_string()).await
    }

    async fn list(&self) -> RepositoryResult<Vec<Faction>> {
        self.fetch_all("factions").await
    }
}

// =============================================================================
// Points of interest
// =============================================================================

#[async_trait]
impl PoiRepositoryPort for SqliteRepository {
    async fn get(&self, id: PoiId) -> RepositoryResult<Option<PointOfInterest>> {
        self.fetch("points_of_interest", id.to_string()).await
    }

    async fn save(&self, poi: &PointOfInterest) -> RepositoryResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO points_of_interest (id, region_id, document) VALUES (?, ?, ?)",
        )
        .bind(poi.id.to_string())
        .bind(poi.region_id.to_string())
        .bind(encode(poi)?)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn update(&self, poi: &PointOfInterest) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE points_of_interest SET region_id = ?, document = ? WHERE id = ?",
        )
        .bind(poi.region_id.to_string())
        .bind(encode(poi)?)
        .bind(poi.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Point of interest", poi.id));
        }
        Ok(())
    }

    async fn delete(&self, id: PoiId) -> RepositoryResult<bool> {
        self.remove("points_of_interest", id.to_string()).await
    }

    async fn list(&self) -> RepositoryResult<Vec<PointOfInterest>> {
        self.fetch_all("points_of_interest").await
    }

    async fn list_by_region(&self, region_id: RegionId) -> RepositoryResult<Vec<PointOfInterest>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT document FROM points_of_interest WHERE region_id = ? ORDER BY id",
        )
        .bind(region_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        decode_rows(rows)
    }
}

// =============================================================================
// Relationships and tension
// =============================================================================

#[async_trait]
impl RelationshipRepositoryPort for SqliteRepository {
    async fn get(&self, pair: FactionPair) -> RepositoryResult<Option<FactionRelationship>> {
        self.fetch("relationships", pair.to_string()).await
    }

    async fn save(&self, relationship: &FactionRelationship) -> RepositoryResult<()> {
        self.upsert("relationships", relationship.pair.to_string(), encode(relationship)?)
            .await
    }

    async fn update(&self, relationship: &FactionRelationship) -> RepositoryResult<()> {
        self.replace(
            "relationships",
            "Relationship",
            relationship.pair.to_string(),
            encode(relationship)?,
        )
        .await
    }

    async fn delete(&self, pair: FactionPair) -> RepositoryResult<bool> {
        self.remove("relationships", pair.to_string()).await
    }

    async fn list(&self) -> RepositoryResult<Vec<FactionRelationship>> {
        self.fetch_all("relationships").await
    }
}

#[async_trait]
impl TensionRepositoryPort for SqliteRepository {
    async fn get(&self, region_id: RegionId, poi_id: PoiId) -> RepositoryResult<Option<TensionSnapshot>> {
        self.fetch("tension_states", location_key(region_id, poi_id)).await
    }

    async fn save(&self, snapshot: &TensionSnapshot) -> RepositoryResult<()> {
        self.upsert(
            "tension_states",
            location_key(snapshot.region_id, snapshot.poi_id),
            encode(snapshot)?,
        )
        .await
    }

    async fn update(&self, snapshot: &TensionSnapshot) -> RepositoryResult<()> {
        self.replace(
            "tension_states",
            "Tension state",
            location_key(snapshot.region_id, snapshot.poi_id),
            encode(snapshot)?,
        )
        .await
    }

    async fn delete(&self, region_id: RegionId, poi_id: PoiId) -> RepositoryResult<bool> {
        self.remove("tension_states", location_key(region_id, poi_id)).await
    }

    async fn list(&self) -> RepositoryResult<Vec<TensionSnapshot>> {
        self.fetch_all("tension_states").await
    }
}

// =============================================================================
// Wars
// =============================================================================

#[async_trait]
impl WarRepositoryPort for SqliteRepository {
    async fn get(&self, id: WarId) -> RepositoryResult<Option<WarState>> {
        self.fetch("wars", id.to_string()).await
    }

    async fn save(&self, war: &WarState) -> RepositoryResult<()> {
        sqlx::query("INSERT OR REPLACE INTO wars (id, pair, is_active, document) VALUES (?, ?, ?, ?)")
            .bind(war.id.to_string())
            .bind(war.pair().to_string())
            .bind(war.is_active)
            .bind(encode(war)?)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn update(&self, war: &WarState) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE wars SET pair = ?, is_active = ?, document = ? WHERE id = ?")
            .bind(war.pair().to_string())
            .bind(war.is_active)
            .bind(encode(war)?)
            .bind(war.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("War", war.id));
        }
        Ok(())
    }

    async fn delete(&self, id: WarId) -> RepositoryResult<bool> {
        self.remove("wars", id.to_string()).await
    }

    async fn list(&self) -> RepositoryResult<Vec<WarState>> {
        self.fetch_all("wars").await
    }

    async fn list_active(&self) -> RepositoryResult<Vec<WarState>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT document FROM wars WHERE is_active = 1 ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
        decode_rows(rows)
    }

    async fn find_active_between(
        &self,
        a: FactionId,
        b: FactionId,
    ) -> RepositoryResult<Option<WarState>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT document FROM wars WHERE is_active = 1 AND pair = ? ORDER BY id LIMIT 1",
        )
        .bind(FactionPair::new(a, b).to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(|(document,)| decode(&document)).transpose()
    }
}
