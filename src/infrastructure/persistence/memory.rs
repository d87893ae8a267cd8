//! In-memory persistence adapter
//!
//! Backs every repository port with ordered maps behind `tokio` locks.
//! Listing returns records in key order, so runs are reproducible.

use std::collections::BTreeMap;
use std::fmt::Display;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::outbound::{
    FactionRepositoryPort, PoiRepositoryPort, RegionRepositoryPort, RelationshipRepositoryPort,
    RepositoryError, RepositoryResult, TensionRepositoryPort, WarRepositoryPort,
};
use crate::domain::entities::{
    Faction, FactionPair, FactionRelationship, PointOfInterest, Region, TensionSnapshot, WarState,
};
use crate::domain::value_objects::{FactionId, PoiId, RegionId, WarId};

struct Table<K, V> {
    kind: &'static str,
    rows: RwLock<BTreeMap<K, V>>,
}

impl<K: Ord + Copy + Display, V: Clone> Table<K, V> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    async fn get(&self, key: K) -> Option<V> {
        self.rows.read().await.get(&key).cloned()
    }

    async fn save(&self, key: K, value: &V) {
        self.rows.write().await.insert(key, value.clone());
    }

    async fn update(&self, key: K, value: &V) -> RepositoryResult<()> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&key) {
            Some(row) => {
                *row = value.clone();
                Ok(())
            }
            None => Err(RepositoryError::not_found(self.kind, key)),
        }
    }

    async fn delete(&self, key: K) -> bool {
        self.rows.write().await.remove(&key).is_some()
    }

    async fn list(&self) -> Vec<V> {
        self.rows.read().await.values().cloned().collect()
    }

    async fn filter(&self, predicate: impl Fn(&V) -> bool) -> Vec<V> {
        self.rows
            .read()
            .await
            .values()
            .filter(|v| predicate(v))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct LocationKey(RegionId, PoiId);

impl Display for LocationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

/// Process-local store implementing every repository port
pub struct InMemoryRepository {
    regions: Table<RegionId, Region>,
    factions: Table<FactionId, Faction>,
    pois: Table<PoiId, PointOfInterest>,
    relationships: Table<FactionPair, FactionRelationship>,
    wars: Table<WarId, WarState>,
    tension: Table<LocationKey, TensionSnapshot>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            regions: Table::new("Region"),
            factions: Table::new("Faction"),
            pois: Table::new("Point of interest"),
            relationships: Table::new("Relationship"),
            wars: Table::new("War"),
            tension: Table::new("Tension state"),
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegionRepositoryPort for InMemoryRepository {
    async fn get(&self, id: RegionId) -> RepositoryResult<Option<Region>> {
        Ok(self.regions.get(id).await)
    }

    async fn save(&self, region: &Region) -> RepositoryResult<()> {
        self.regions.save(region.id, region).await;
        Ok(())
    }

    async fn update(&self, region: &Region) -> RepositoryResult<()> {
        self.regions.update(region.id, region).await
    }

    async fn delete(&self, id: RegionId) -> RepositoryResult<bool> {
        Ok(self.regions.delete(id).await)
    }

    async fn list(&self) -> RepositoryResult<Vec<Region>> {
        Ok(self.regions.list().await)
    }
}

#[async_trait]
impl FactionRepositoryPort for InMemoryRepository {
    async fn get(&self, id: FactionId) -> RepositoryResult<Option<Faction>> {
        Ok(self.factions.get(id).await)
    }

    async fn save(&self, faction: &Faction) -> RepositoryResult<()> {
        self.factions.save(faction.id, faction).await;
        Ok(())
    }

    async fn update(&self, faction: &Faction) -> RepositoryResult<()> {
        self.factions.update(faction.id, faction).await
    }

    async fn delete(&self, id: FactionId) -> RepositoryResult<bool> {
        Ok(self.factions.delete(id).await)
    }

    async fn list(&self) -> RepositoryResult<Vec<Faction>> {
        Ok(self.factions.list().await)
    }
}

#[async_trait]
impl PoiRepositoryPort for InMemoryRepository {
    async fn get(&self, id: PoiId) -> RepositoryResult<Option<PointOfInterest>> {
        Ok(self.pois.get(id).await)
    }

    async fn save(&self, poi: &PointOfInterest) -> RepositoryResult<()> {
        self.pois.save(poi.id, poi).await;
        Ok(())
    }

    async fn update(&self, poi: &PointOfInterest) -> RepositoryResult<()> {
        self.pois.update(poi.id, poi).await
    }

    async fn delete(&self, id: PoiId) -> RepositoryResult<bool> {
        Ok(self.pois.delete(id).await)
    }

    async fn list(&self) -> RepositoryResult<Vec<PointOfInterest>> {
        Ok(self.pois.list().await)
    }

    async fn list_by_region(&self, region_id: RegionId) -> RepositoryResult<Vec<PointOfInterest>> {
        Ok(self.pois.filter(|poi| poi.region_id == region_id).await)
    }
}

#[async_trait]
impl RelationshipRepositoryPort for InMemoryRepository {
    async fn get(&self, pair: FactionPair) -> RepositoryResult<Option<FactionRelationship>> {
        Ok(self.relationships.get(pair).await)
    }

    async fn save(&self, relationship: &FactionRelationship) -> RepositoryResult<()> {
        self.relationships.save(relationship.pair, relationship).await;
        Ok(())
    }

    async fn update(&self, relationship: &FactionRelationship) -> RepositoryResult<()> {
        self.relationships.update(relationship.pair, relationship).await
    }

    async fn delete(&self, pair: FactionPair) -> RepositoryResult<bool> {
        Ok(self.relationships.delete(pair).await)
    }

    async fn list(&self) -> RepositoryResult<Vec<FactionRelationship>> {
        Ok(self.relationships.list().await)
    }
}

#[async_trait]
impl WarRepositoryPort for InMemoryRepository {
    async fn get(&self, id: WarId) -> RepositoryResult<Option<WarState>> {
        Ok(self.wars.get(id).await)
    }

    async fn save(&self, war: &WarState) -> RepositoryResult<()> {
        self.wars.save(war.id, war).await;
        Ok(())
    }

    async fn update(&self, war: &WarState) -> RepositoryResult<()> {
        self.wars.update(war.id, war).await
    }

    async fn delete(&self, id: WarId) -> RepositoryResult<bool> {
        Ok(self.wars.delete(id).await)
    }

    async fn list(&self) -> RepositoryResult<Vec<WarState>> {
        Ok(self.wars.list().await)
    }

    async fn list_active(&self) -> RepositoryResult<Vec<WarState>> {
        Ok(self.wars.filter(|war| war.is_active).await)
    }

    async fn find_active_between(
        &self,
        a: FactionId,
        b: FactionId,
    ) -> RepositoryResult<Option<WarState>> {
        let pair = FactionPair::new(a, b);
        Ok(self
            .wars
            .filter(|war| war.is_active && war.pair() == pair)
            .await
            .into_iter()
            .next())
    }
}

#[async_trait]
impl TensionRepositoryPort for InMemoryRepository {
    async fn get(&self, region_id: RegionId, poi_id: PoiId) -> RepositoryResult<Option<TensionSnapshot>> {
        Ok(self.tension.get(LocationKey(region_id, poi_id)).await)
    }

    async fn save(&self, snapshot: &TensionSnapshot) -> RepositoryResult<()> {
        self.tension
            .save(LocationKey(snapshot.region_id, snapshot.poi_id), snapshot)
            .await;
        Ok(())
    }

    async fn update(&self, snapshot: &TensionSnapshot) -> RepositoryResult<()> {
        self.tension
            .update(LocationKey(snapshot.region_id, snapshot.poi_id), snapshot)
            .await
    }

    async fn delete(&self, region_id: RegionId, poi_id: PoiId) -> RepositoryResult<bool> {
        Ok(self.tension.delete(LocationKey(region_id, poi_id)).await)
    }

    async fn list(&self) -> RepositoryResult<Vec<TensionSnapshot>> {
        Ok(self.tension.list().await)
    }
}
