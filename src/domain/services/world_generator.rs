//! Seeded world generation
//!
//! Builds a hex map, runs biome placement on it and turns every cell into a
//! region with points of interest. All randomness comes from one
//! `ChaCha8Rng` seeded from `WorldConfig::seed`.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::domain::entities::{PointOfInterest, Region};
use crate::domain::errors::{SimulationError, SimulationResult};
use crate::domain::services::biome_placement::{
    select_poi_type, BiomePlacer, EnvironmentSample, PlacementReport,
};
use crate::domain::value_objects::{
    BiomeConfig, BiomeRegistry, HexCoordinate, PlacementConfig, PoiId, RegionId, WorldConfig,
};

const SMOOTHING_PASSES: usize = 2;

/// Baseline danger and population density per biome
fn biome_profile(biome: &str) -> (f64, u64) {
    match biome {
        "ocean" => (0.3, 0),
        "coastal" => (0.2, 800),
        "plains" => (0.1, 1000),
        "forest" => (0.3, 600),
        "hills" => (0.3, 400),
        "mountains" | "mountain" => (0.5, 200),
        "desert" => (0.4, 150),
        "tundra" => (0.4, 100),
        "swamp" => (0.5, 250),
        _ => (0.3, 300),
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedWorld {
    pub seed: u64,
    pub regions: Vec<Region>,
    pub points_of_interest: Vec<PointOfInterest>,
    pub placement: PlacementReport,
}

pub struct WorldGenerator<'a> {
    registry: &'a BiomeRegistry,
    placement: PlacementConfig,
    config: WorldConfig,
}

impl<'a> WorldGenerator<'a> {
    pub fn new(registry: &'a BiomeRegistry, placement: PlacementConfig, config: WorldConfig) -> Self {
        Self {
            registry,
            placement,
            config,
        }
    }

    pub fn generate(&self) -> SimulationResult<GeneratedWorld> {
        if !self.config.resource_abundance.is_finite() || self.config.resource_abundance < 0.0 {
            return Err(SimulationError::configuration(
                "world resource_abundance must be a non-negative number",
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let cells = HexCoordinate::spiral(self.config.radius);

        let elevation = self.elevation_field(&cells, &mut rng);
        let samples = self.climate(&cells, &elevation, &mut rng);

        let placer = BiomePlacer::new(self.registry, self.placement.clone());
        let placement = placer.place(&samples, &mut rng)?;

        let ids: BTreeMap<HexCoordinate, RegionId> = cells
            .iter()
            .map(|cell| (*cell, RegionId::from_rng(&mut rng)))
            .collect();

        let mut regions = Vec::with_capacity(cells.len());
        let mut points_of_interest = Vec::new();
        for (index, cell) in cells.iter().enumerate() {
            let biome_id = placement
                .biomes
                .get(cell)
                .ok_or_else(|| SimulationError::SimulationData(format!("no biome placed at {cell}")))?;
            let biome = self
                .registry
                .get(biome_id)
                .ok_or_else(|| SimulationError::missing("biome", biome_id))?;
            let cell_elevation = elevation.get(cell).copied().unwrap_or(0.0);
            let region_id = ids[cell];

            let region = self.build_region(region_id, index, *cell, biome, cell_elevation, &ids, &mut rng);
            points_of_interest.extend(self.place_pois(&region, cell_elevation, &mut rng));
            regions.push(region);
        }

        info!(
            seed = self.config.seed,
            regions = regions.len(),
            points_of_interest = points_of_interest.len(),
            remaining_violations = placement.remaining_violations.len(),
            "world generated"
        );

        Ok(GeneratedWorld {
            seed: self.config.seed,
            regions,
            points_of_interest,
            placement,
        })
    }

    /// Value noise smoothed against neighbours, rescaled to 0..1
    fn elevation_field<R: Rng + ?Sized>(
        &self,
        cells: &[HexCoordinate],
        rng: &mut R,
    ) -> BTreeMap<HexCoordinate, f64> {
        let mut field: BTreeMap<HexCoordinate, f64> =
            cells.iter().map(|cell| (*cell, rng.gen::<f64>())).collect();

        for _ in 0..SMOOTHING_PASSES {
            let snapshot = field.clone();
            for (cell, value) in field.iter_mut() {
                let neighbors: Vec<f64> = cell
                    .neighbors()
                    .iter()
                    .filter_map(|n| snapshot.get(n).copied())
                    .collect();
                if !neighbors.is_empty() {
                    let mean = neighbors.iter().sum::<f64>() / neighbors.len() as f64;
                    *value = 0.5 * *value + 0.5 * mean;
                }
            }
        }

        let min = field.values().copied().fold(f64::INFINITY, f64::min);
        let max = field.values().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;
        if span > f64::EPSILON {
            for value in field.values_mut() {
                *value = (*value - min) / span;
            }
        }
        field
    }

    fn climate<R: Rng + ?Sized>(
        &self,
        cells: &[HexCoordinate],
        elevation: &BTreeMap<HexCoordinate, f64>,
        rng: &mut R,
    ) -> BTreeMap<HexCoordinate, EnvironmentSample> {
        let radius = self.config.radius.max(1) as f64;
        cells
            .iter()
            .map(|cell| {
                let height = elevation.get(cell).copied().unwrap_or(0.0);
                let latitude = 1.0 - (cell.r.abs() as f64 / radius);
                let temperature =
                    (latitude - 0.5 * height + rng.gen_range(-0.1..0.1)).clamp(0.0, 1.0);
                let water_bonus = if height < 0.3 { 0.3 } else { 0.0 };
                let humidity = (rng.gen::<f64>() * 0.7 + water_bonus).clamp(0.0, 1.0);
                (*cell, EnvironmentSample::new(height, temperature, humidity))
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn build_region<R: Rng + ?Sized>(
        &self,
        id: RegionId,
        index: usize,
        cell: HexCoordinate,
        biome: &BiomeConfig,
        elevation: f64,
        ids: &BTreeMap<HexCoordinate, RegionId>,
        rng: &mut R,
    ) -> Region {
        let (base_danger, density) = biome_profile(&biome.id);

        let mut region = Region::new(format!("{} {}", biome.name, index + 1))
            .with_id(id)
            .with_biome(biome.id.clone())
            .with_hex(cell);
        for neighbor in cell.neighbors() {
            if let Some(neighbor_id) = ids.get(&neighbor) {
                region = region.with_neighbor(*neighbor_id);
            }
        }

        for (resource, base) in &biome.resources {
            let amount = (base * self.config.resource_abundance * rng.gen_range(0.7..1.3)).clamp(0.0, 1.0);
            region.resource_deposits.insert(resource.clone(), amount);
        }
        let resources = if region.resource_deposits.is_empty() {
            0.0
        } else {
            region.resource_deposits.values().sum::<f64>() / region.resource_deposits.len() as f64
        };

        let mut danger = base_danger;
        if elevation > 0.8 {
            danger += 0.2;
        } else if elevation > 0.6 {
            danger += 0.1;
        }

        let population = (density as f64 * rng.gen_range(0.7..1.3)).round() as u64;
        region
            .with_resources(resources)
            .with_danger(danger.clamp(0.0, 1.0))
            .with_stability(0.5)
            .with_population(population, density * 2)
    }

    fn place_pois<R: Rng + ?Sized>(&self, region: &Region, elevation: f64, rng: &mut R) -> Vec<PointOfInterest> {
        (0..self.config.poi_density)
            .map(|n| {
                let poi_elevation = (elevation + rng.gen_range(-0.1..0.1)).clamp(0.0, 1.0);
                let poi_type = select_poi_type(&region.biome, poi_elevation, self.registry, rng);
                let name = format!("{} {} {}", region.name, poi_type.replace('_', " "), n + 1);
                let hex = region.hex.unwrap_or(HexCoordinate::ORIGIN);
                PointOfInterest::new(region.id, name, poi_type)
                    .with_id(PoiId::from_rng(rng))
                    .with_location(hex, poi_elevation)
            })
            .collect()
    }
}
