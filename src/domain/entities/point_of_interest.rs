//! Point of interest entity - Places inside a region that carry tension

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{HexCoordinate, PoiId, RegionId};

/// A point of interest within a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: PoiId,
    pub region_id: RegionId,
    pub name: String,
    /// Free-form type such as "city", "cave" or "oasis"
    pub poi_type: String,
    #[serde(default)]
    pub hex: Option<HexCoordinate>,
    #[serde(default)]
    pub elevation: f64,
}

impl PointOfInterest {
    pub fn new(region_id: RegionId, name: impl Into<String>, poi_type: impl Into<String>) -> Self {
        Self {
            id: PoiId::new(),
            region_id,
            name: name.into(),
            poi_type: poi_type.into(),
            hex: None,
            elevation: 0.0,
        }
    }

    pub fn with_id(mut self, id: PoiId) -> Self {
        self.id = id;
        self
    }

    pub fn with_location(mut self, hex: HexCoordinate, elevation: f64) -> Self {
        self.hex = Some(hex);
        self.elevation = elevation;
        self
    }
}
