//! Biome placement engine
//!
//! Cells are scored against every biome, smoothed by a clustering pass and
//! then checked for forbidden neighbour pairs. Grid order is the ordering of
//! `HexCoordinate`; registry order breaks every tie.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::{SimulationError, SimulationResult};
use crate::domain::value_objects::{BiomeConfig, BiomeRegistry, HexCoordinate, PlacementConfig};

const PEAK_POI_TYPES: [&str; 3] = ["peak", "monastery", "observatory"];
const FALLBACK_POI_TYPE: &str = "ruins";

fn builtin_poi_pool(biome: &str) -> Option<&'static [&'static str]> {
    let pool: &'static [&'static str] = match biome {
        "mountains" | "mountain" => &["cave", "peak", "mine", "monastery"],
        "forest" => &["grove", "ruins", "village", "tower"],
        "plains" => &["settlement", "farm", "crossroads", "monument"],
        "desert" => &["oasis", "tomb", "caravan_stop", "mirage"],
        "swamp" => &["hut", "bog", "shrine", "bridge"],
        "coastal" => &["port", "lighthouse", "shipwreck", "fishing_village"],
        _ => return None,
    };
    Some(pool)
}

/// Environmental parameters of one cell, each normalized to 0..1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSample {
    pub elevation: f64,
    pub temperature: f64,
    pub humidity: f64,
}

impl EnvironmentSample {
    pub fn new(elevation: f64, temperature: f64, humidity: f64) -> Self {
        Self {
            elevation,
            temperature,
            humidity,
        }
    }

    fn is_finite(&self) -> bool {
        self.elevation.is_finite() && self.temperature.is_finite() && self.humidity.is_finite()
    }
}

fn best_biome_index<'a>(
    candidates: impl Iterator<Item = (usize, &'a BiomeConfig)>,
    sample: &EnvironmentSample,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, biome) in candidates {
        let score = biome.score(sample.elevation, sample.temperature, sample.humidity);
        match best {
            // strictly greater keeps the earliest biome on ties
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// Highest-scoring biome for the given environment
pub fn determine_biome<'a>(
    elevation: f64,
    temperature: f64,
    humidity: f64,
    registry: &'a BiomeRegistry,
) -> SimulationResult<&'a BiomeConfig> {
    if registry.is_empty() {
        return Err(SimulationError::configuration("no biomes configured"));
    }
    let sample = EnvironmentSample::new(elevation, temperature, humidity);
    if !sample.is_finite() {
        return Err(SimulationError::SimulationData(format!(
            "non-finite environment ({elevation}, {temperature}, {humidity})"
        )));
    }
    let biomes: Vec<&BiomeConfig> = registry.iter().collect();
    best_biome_index(biomes.iter().copied().enumerate(), &sample)
        .map(|index| biomes[index])
        .ok_or_else(|| SimulationError::configuration("no biomes configured"))
}

/// Pick a POI type for a location in the given biome
pub fn select_poi_type<R: Rng + ?Sized>(
    biome: &str,
    elevation: f64,
    registry: &BiomeRegistry,
    rng: &mut R,
) -> String {
    let is_mountain = biome.starts_with("mountain");

    if elevation > 0.8 {
        if is_mountain {
            return PEAK_POI_TYPES
                .choose(rng)
                .copied()
                .unwrap_or(FALLBACK_POI_TYPE)
                .to_string();
        }
        return "cave".to_string();
    }
    if elevation < 0.2 {
        return if biome == "desert" { "oasis" } else { "lake" }.to_string();
    }

    if let Some(config) = registry.get(biome) {
        if let Some(poi_type) = config.poi_types.choose(rng) {
            return poi_type.clone();
        }
    }
    builtin_poi_pool(biome)
        .and_then(|pool| pool.choose(rng))
        .copied()
        .unwrap_or(FALLBACK_POI_TYPE)
        .to_string()
}

/// Result of running the placement pipeline over a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementReport {
    pub biomes: BTreeMap<HexCoordinate, String>,
    pub clustering_iterations: u32,
    pub validation_iterations: u32,
    /// Forbidden neighbour pairs that remediation could not resolve
    pub remaining_violations: Vec<(HexCoordinate, HexCoordinate)>,
}

/// Working grid of registry indices
pub type BiomeGrid = BTreeMap<HexCoordinate, usize>;

pub struct BiomePlacer<'a> {
    biomes: Vec<&'a BiomeConfig>,
    config: PlacementConfig,
    forbidden: Vec<Vec<bool>>,
}

impl<'a> BiomePlacer<'a> {
    pub fn new(registry: &'a BiomeRegistry, config: PlacementConfig) -> Self {
        let biomes: Vec<&BiomeConfig> = registry.iter().collect();
        let forbidden = biomes
            .iter()
            .map(|a| {
                biomes
                    .iter()
                    .map(|b| Self::forbidden_pair(a, b, config.forbidden_difficulty))
                    .collect()
            })
            .collect();
        Self {
            biomes,
            config,
            forbidden,
        }
    }

    fn forbidden_pair(a: &BiomeConfig, b: &BiomeConfig, threshold: f64) -> bool {
        a.id != b.id
            && !a.allows_neighbor(&b.id)
            && !b.allows_neighbor(&a.id)
            && (a.transition_difficulty > threshold || b.transition_difficulty > threshold)
    }

    /// Whether two biomes may not touch
    pub fn is_forbidden(&self, a: &BiomeConfig, b: &BiomeConfig) -> bool {
        Self::forbidden_pair(a, b, self.config.forbidden_difficulty)
    }

    fn forbidden_index(&self, a: usize, b: usize) -> bool {
        self.forbidden[a][b]
    }

    pub fn biome(&self, index: usize) -> Option<&'a BiomeConfig> {
        self.biomes.get(index).copied()
    }

    /// Score every cell independently
    pub fn assign(&self, samples: &BTreeMap<HexCoordinate, EnvironmentSample>) -> SimulationResult<BiomeGrid> {
        let mut grid = BiomeGrid::new();
        for (coord, sample) in samples {
            if !sample.is_finite() {
                return Err(SimulationError::SimulationData(format!(
                    "non-finite environment at {coord}"
                )));
            }
            let index = best_biome_index(self.biomes.iter().copied().enumerate(), sample)
                .ok_or_else(|| SimulationError::configuration("no biomes configured"))?;
            grid.insert(*coord, index);
        }
        Ok(grid)
    }

    fn present_neighbors(grid: &BiomeGrid, coord: HexCoordinate) -> impl Iterator<Item = (HexCoordinate, usize)> + '_ {
        coord
            .neighbors()
            .into_iter()
            .filter_map(move |n| grid.get(&n).map(|index| (n, *index)))
    }

    /// Pull cells towards their most common neighbour biome
    ///
    /// Returns the number of iterations run.
    pub fn cluster<R: Rng + ?Sized>(&self, grid: &mut BiomeGrid, rng: &mut R) -> u32 {
        let probability = if self.config.clustering_factor.is_finite() {
            self.config.clustering_factor.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut iterations = 0;
        for _ in 0..self.config.clustering_iterations {
            iterations += 1;
            let snapshot = grid.clone();
            let mut changed = 0;

            for (coord, current) in &snapshot {
                let mut counts = vec![0usize; self.biomes.len()];
                for (_, neighbor) in Self::present_neighbors(&snapshot, *coord) {
                    counts[neighbor] += 1;
                }
                let mut dominant: Option<(usize, usize)> = None;
                for (index, count) in counts.iter().enumerate() {
                    if *count > 0 && dominant.map_or(true, |(_, best)| *count > best) {
                        dominant = Some((index, *count));
                    }
                }
                let Some((candidate, _)) = dominant else {
                    continue;
                };
                if candidate == *current {
                    continue;
                }
                let allowed = Self::present_neighbors(&snapshot, *coord)
                    .all(|(_, neighbor)| !self.forbidden_index(candidate, neighbor));
                if allowed && rng.gen_bool(probability) {
                    grid.insert(*coord, candidate);
                    changed += 1;
                }
            }

            debug!(iteration = iterations, changed, "biome clustering pass");
            if changed == 0 {
                break;
            }
        }
        iterations
    }

    /// Every forbidden neighbour pair, each reported once
    pub fn find_violations(&self, grid: &BiomeGrid) -> Vec<(HexCoordinate, HexCoordinate)> {
        let mut violations = Vec::new();
        for (coord, index) in grid {
            for (neighbor, neighbor_index) in Self::present_neighbors(grid, *coord) {
                if *coord < neighbor && self.forbidden_index(*index, neighbor_index) {
                    violations.push((*coord, neighbor));
                }
            }
        }
        violations
    }

    fn replacement_for(
        &self,
        grid: &BiomeGrid,
        coord: HexCoordinate,
        sample: Option<&EnvironmentSample>,
    ) -> Option<usize> {
        let neighbors: Vec<usize> = Self::present_neighbors(grid, coord).map(|(_, i)| i).collect();
        let candidates = self
            .biomes
            .iter()
            .copied()
            .enumerate()
            .filter(|(index, _)| neighbors.iter().all(|n| !self.forbidden_index(*index, *n)));
        match sample {
            Some(sample) => best_biome_index(candidates, sample),
            None => candidates.map(|(index, _)| index).next(),
        }
    }

    /// Replace biomes until no forbidden pairs remain or iterations run out
    ///
    /// Returns the iterations used and the unresolved violations.
    pub fn remediate(
        &self,
        grid: &mut BiomeGrid,
        samples: &BTreeMap<HexCoordinate, EnvironmentSample>,
    ) -> (u32, Vec<(HexCoordinate, HexCoordinate)>) {
        let mut iterations = 0;
        for _ in 0..self.config.validation_iterations {
            if self.find_violations(grid).is_empty() {
                break;
            }
            iterations += 1;

            let coords: Vec<HexCoordinate> = grid.keys().copied().collect();
            for coord in coords {
                let Some(current) = grid.get(&coord).copied() else {
                    continue;
                };
                let offender = Self::present_neighbors(grid, coord)
                    .find(|(_, neighbor)| self.forbidden_index(current, *neighbor))
                    .map(|(neighbor, _)| neighbor);
                let Some(offender) = offender else {
                    continue;
                };

                if let Some(transition) = self.replacement_for(grid, coord, samples.get(&coord)) {
                    grid.insert(coord, transition);
                } else if let Some(swap) = self.replacement_for(grid, offender, samples.get(&offender)) {
                    grid.insert(offender, swap);
                }
            }
        }
        (iterations, self.find_violations(grid))
    }

    /// Full pipeline: score, cluster, validate
    pub fn place<R: Rng + ?Sized>(
        &self,
        samples: &BTreeMap<HexCoordinate, EnvironmentSample>,
        rng: &mut R,
    ) -> SimulationResult<PlacementReport> {
        let mut grid = self.assign(samples)?;
        let clustering_iterations = self.cluster(&mut grid, rng);
        let (validation_iterations, remaining_violations) = self.remediate(&mut grid, samples);
        if !remaining_violations.is_empty() {
            tracing::warn!(
                remaining = remaining_violations.len(),
                "biome adjacency violations left after remediation"
            );
        }

        let biomes = grid
            .into_iter()
            .map(|(coord, index)| (coord, self.biomes[index].id.clone()))
            .collect();
        Ok(PlacementReport {
            biomes,
            clustering_iterations,
            validation_iterations,
            remaining_violations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn two_biome_registry() -> BiomeRegistry {
        BiomeRegistry::new(vec![
            BiomeConfig::new("mountain", (0.0, 1.0), (0.0, 1.0), (0.6, 1.0)),
            BiomeConfig::new("plains", (0.0, 1.0), (0.0, 1.0), (0.1, 0.5)),
        ])
        .unwrap()
    }

    #[test]
    fn test_high_elevation_selects_mountain() {
        let registry = two_biome_registry();
        let biome = determine_biome(0.85, 0.5, 0.5, &registry).unwrap();
        assert_eq!(biome.id, "mountain");
        let low = determine_biome(0.3, 0.5, 0.5, &registry).unwrap();
        assert_eq!(low.id, "plains");
    }

    #[test]
    fn test_equal_scores_keep_registry_order() {
        let registry = BiomeRegistry::new(vec![
            BiomeConfig::new("first", (0.0, 1.0), (0.0, 1.0), (0.0, 1.0)),
            BiomeConfig::new("second", (0.0, 1.0), (0.0, 1.0), (0.0, 1.0)),
        ])
        .unwrap();
        assert_eq!(determine_biome(0.5, 0.5, 0.5, &registry).unwrap().id, "first");
    }

    #[test]
    fn test_rarity_scales_score() {
        let registry = BiomeRegistry::new(vec![
            BiomeConfig::new("common", (0.0, 1.0), (0.0, 1.0), (0.0, 1.0)).with_rarity(0.5),
            BiomeConfig::new("rare", (0.0, 1.0), (0.0, 1.0), (0.0, 1.0)),
        ])
        .unwrap();
        assert_eq!(determine_biome(0.5, 0.5, 0.5, &registry).unwrap().id, "rare");
    }

    #[test]
    fn test_non_finite_environment_is_rejected() {
        let registry = two_biome_registry();
        assert!(determine_biome(f64::NAN, 0.5, 0.5, &registry).is_err());
    }

    #[test]
    fn test_forbidden_pairs_are_symmetric() {
        let registry = BiomeRegistry::default();
        let placer = BiomePlacer::new(&registry, PlacementConfig::default());
        let ocean = registry.get("ocean").unwrap();
        let plains = registry.get("plains").unwrap();
        let coastal = registry.get("coastal").unwrap();
        assert!(placer.is_forbidden(ocean, plains));
        assert!(placer.is_forbidden(plains, ocean));
        assert!(!placer.is_forbidden(ocean, coastal));
        assert!(!placer.is_forbidden(ocean, ocean));
    }

    #[test]
    fn test_clustering_absorbs_isolated_cell() {
        let registry = BiomeRegistry::default();
        let config = PlacementConfig {
            clustering_factor: 1.0,
            ..PlacementConfig::default()
        };
        let placer = BiomePlacer::new(&registry, config);
        let forest = registry.position("forest").unwrap();
        let plains = registry.position("plains").unwrap();

        let mut grid: BiomeGrid = HexCoordinate::ORIGIN
            .neighbors()
            .into_iter()
            .map(|c| (c, forest))
            .collect();
        grid.insert(HexCoordinate::ORIGIN, plains);

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let iterations = placer.cluster(&mut grid, &mut rng);
        assert_eq!(grid[&HexCoordinate::ORIGIN], forest);
        assert_eq!(iterations, 2);
    }

    #[test]
    fn test_zero_clustering_factor_changes_nothing() {
        let registry = BiomeRegistry::default();
        let config = PlacementConfig {
            clustering_factor: 0.0,
            ..PlacementConfig::default()
        };
        let placer = BiomePlacer::new(&registry, config);
        let forest = registry.position("forest").unwrap();
        let plains = registry.position("plains").unwrap();
        let mut grid: BiomeGrid = HexCoordinate::ORIGIN
            .neighbors()
            .into_iter()
            .map(|c| (c, forest))
            .collect();
        grid.insert(HexCoordinate::ORIGIN, plains);
        let before = grid.clone();

        placer.cluster(&mut grid, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_remediation_inserts_transition_biome() {
        let registry = BiomeRegistry::default();
        let placer = BiomePlacer::new(&registry, PlacementConfig::default());
        let ocean = registry.position("ocean").unwrap();
        let plains = registry.position("plains").unwrap();

        let left = HexCoordinate::new(0, 0);
        let right = HexCoordinate::new(1, 0);
        let mut grid: BiomeGrid = [(left, ocean), (right, plains)].into_iter().collect();
        assert_eq!(placer.find_violations(&grid), vec![(left, right)]);

        let samples: BTreeMap<_, _> = [
            (left, EnvironmentSample::new(0.1, 0.6, 0.8)),
            (right, EnvironmentSample::new(0.3, 0.6, 0.5)),
        ]
        .into_iter()
        .collect();
        let (iterations, remaining) = placer.remediate(&mut grid, &samples);
        assert_eq!(iterations, 1);
        assert!(remaining.is_empty());
        assert_ne!(grid[&left], ocean);
    }

    #[test]
    fn test_place_reports_every_cell() {
        let registry = BiomeRegistry::default();
        let placer = BiomePlacer::new(&registry, PlacementConfig::default());
        let samples: BTreeMap<_, _> = HexCoordinate::spiral(2)
            .into_iter()
            .enumerate()
            .map(|(i, c)| (c, EnvironmentSample::new((i as f64 * 0.07) % 1.0, 0.5, 0.5)))
            .collect();
        let report = placer
            .place(&samples, &mut ChaCha8Rng::seed_from_u64(1))
            .unwrap();
        assert_eq!(report.biomes.len(), samples.len());
        assert!(report.biomes.values().all(|b| registry.get(b).is_some()));
    }

    #[test]
    fn test_poi_elevation_overrides() {
        let registry = BiomeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let peak = select_poi_type("mountains", 0.9, &registry, &mut rng);
        assert!(PEAK_POI_TYPES.contains(&peak.as_str()));
        assert_eq!(select_poi_type("forest", 0.9, &registry, &mut rng), "cave");
        assert_eq!(select_poi_type("desert", 0.1, &registry, &mut rng), "oasis");
        assert_eq!(select_poi_type("plains", 0.1, &registry, &mut rng), "lake");
    }

    #[test]
    fn test_poi_pools() {
        let registry = BiomeRegistry::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let swamp = select_poi_type("swamp", 0.5, &registry, &mut rng);
        assert!(["hut", "bog", "shrine", "bridge"].contains(&swamp.as_str()));
        assert_eq!(select_poi_type("crystal_wastes", 0.5, &registry, &mut rng), "ruins");

        let custom = BiomeRegistry::new(vec![
            BiomeConfig::new("glade", (0.0, 1.0), (0.0, 1.0), (0.0, 1.0)).with_poi_types(&["fairy_ring"]),
        ])
        .unwrap();
        assert_eq!(select_poi_type("glade", 0.5, &custom, &mut rng), "fairy_ring");
    }
}
