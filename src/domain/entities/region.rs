//! Region entity - A single simulated cell of the world map

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{FactionId, HexCoordinate, RegionId};

/// A region of the world
///
/// `resources`, `stability` and `danger_level` are normalized to 0..1.
/// `controlling_faction` and `control_level` are derived from
/// `faction_influence` by the political control engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    #[serde(default)]
    pub biome: String,
    #[serde(default)]
    pub hex: Option<HexCoordinate>,
    #[serde(default)]
    pub neighbors: Vec<RegionId>,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub max_population: u64,
    #[serde(default)]
    pub resources: f64,
    #[serde(default)]
    pub stability: f64,
    #[serde(default)]
    pub danger_level: f64,
    #[serde(default)]
    pub controlling_faction: Option<FactionId>,
    #[serde(default)]
    pub faction_influence: BTreeMap<FactionId, f64>,
    #[serde(default)]
    pub control_level: f64,
    /// Resource name to abundance in 0..1
    #[serde(default)]
    pub resource_deposits: BTreeMap<String, f64>,
}

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RegionId::new(),
            name: name.into(),
            biome: String::new(),
            hex: None,
            neighbors: Vec::new(),
            population: 0,
            max_population: 0,
            resources: 0.0,
            stability: 0.5,
            danger_level: 0.0,
            controlling_faction: None,
            faction_influence: BTreeMap::new(),
            control_level: 0.0,
            resource_deposits: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: RegionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_biome(mut self, biome: impl Into<String>) -> Self {
        self.biome = biome.into();
        self
    }

    pub fn with_hex(mut self, hex: HexCoordinate) -> Self {
        self.hex = Some(hex);
        self
    }

    pub fn with_population(mut self, population: u64, max_population: u64) -> Self {
        self.population = population;
        self.max_population = max_population;
        self
    }

    pub fn with_resources(mut self, resources: f64) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_stability(mut self, stability: f64) -> Self {
        self.stability = stability;
        self
    }

    pub fn with_danger(mut self, danger_level: f64) -> Self {
        self.danger_level = danger_level;
        self
    }

    pub fn with_influence(mut self, faction_id: FactionId, influence: f64) -> Self {
        self.faction_influence.insert(faction_id, influence);
        self
    }

    pub fn with_neighbor(mut self, neighbor: RegionId) -> Self {
        if !self.neighbors.contains(&neighbor) {
            self.neighbors.push(neighbor);
        }
        self
    }

    /// Influence of a faction, 0.0 when absent or malformed
    pub fn influence_of(&self, faction_id: FactionId) -> f64 {
        self.faction_influence
            .get(&faction_id)
            .copied()
            .map(sanitize_unit)
            .unwrap_or(0.0)
    }

    pub fn resources_value(&self) -> f64 {
        sanitize_unit(self.resources)
    }

    pub fn stability_value(&self) -> f64 {
        sanitize_unit(self.stability)
    }

    pub fn danger_value(&self) -> f64 {
        sanitize_unit(self.danger_level)
    }
}

/// Clamp to 0..1, reading NaN as 0
pub(crate) fn sanitize_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Externally supplied adjacency between regions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionAdjacency {
    edges: BTreeMap<RegionId, Vec<RegionId>>,
}

impl RegionAdjacency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `neighbors` lists stored on each region
    pub fn from_regions<'a>(regions: impl IntoIterator<Item = &'a Region>) -> Self {
        let mut adjacency = Self::new();
        for region in regions {
            for neighbor in &region.neighbors {
                adjacency.connect(region.id, *neighbor);
            }
        }
        adjacency
    }

    /// Add a symmetric edge
    pub fn connect(&mut self, a: RegionId, b: RegionId) {
        if a == b {
            return;
        }
        let forward = self.edges.entry(a).or_default();
        if !forward.contains(&b) {
            forward.push(b);
        }
        let backward = self.edges.entry(b).or_default();
        if !backward.contains(&a) {
            backward.push(a);
        }
    }

    pub fn neighbors(&self, region_id: RegionId) -> &[RegionId] {
        self.edges.get(&region_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_influence_of_tolerates_bad_values() {
        let faction = FactionId::new();
        let region = Region::new("Marsh").with_influence(faction, f64::NAN);
        assert_eq!(region.influence_of(faction), 0.0);
        assert_eq!(region.influence_of(FactionId::new()), 0.0);
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let a = Region::new("A");
        let b = Region::new("B").with_neighbor(a.id);
        let adjacency = RegionAdjacency::from_regions([&a, &b]);
        assert_eq!(adjacency.neighbors(a.id), &[b.id]);
        assert_eq!(adjacency.neighbors(b.id), &[a.id]);
    }
}
