//! Axial hex coordinates for the generated world grid

use serde::{Deserialize, Serialize};

/// Axial hex coordinate (q, r); the implicit third axis is s = -q - r
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexCoordinate {
    pub q: i32,
    pub r: i32,
}

const AXIAL_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

impl HexCoordinate {
    pub const ORIGIN: HexCoordinate = HexCoordinate { q: 0, r: 0 };

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// The six adjacent cells, in a fixed clockwise order
    pub fn neighbors(&self) -> [HexCoordinate; 6] {
        AXIAL_DIRECTIONS.map(|(dq, dr)| HexCoordinate::new(self.q + dq, self.r + dr))
    }

    pub fn distance(&self, other: &HexCoordinate) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        dq.max(dr).max(ds) as u32
    }

    /// Every cell within `radius` of the origin, ordered by (r, q)
    pub fn spiral(radius: u32) -> Vec<HexCoordinate> {
        let radius = radius as i32;
        let mut cells = Vec::new();
        for r in -radius..=radius {
            let q_min = (-radius).max(-r - radius);
            let q_max = radius.min(-r + radius);
            for q in q_min..=q_max {
                cells.push(HexCoordinate::new(q, r));
            }
        }
        cells
    }
}

impl std::fmt::Display for HexCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}
