//! Political control value objects

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::FactionId;

/// Result of resolving which faction dominates a region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactionControl {
    pub controlling_faction: Option<FactionId>,
    pub control_level: f64,
    /// Whether a runner-up was close enough to reduce control
    pub contested: bool,
}

impl FactionControl {
    pub fn uncontrolled() -> Self {
        Self {
            controlling_faction: None,
            control_level: 0.0,
            contested: false,
        }
    }

    pub fn band(&self) -> ControlBand {
        ControlBand::from_level(self.control_level)
    }
}

/// Named bands of control strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlBand {
    None,
    Minimal,
    Minor,
    Moderate,
    Major,
    Dominant,
    Absolute,
}

impl ControlBand {
    pub fn from_level(level: f64) -> Self {
        if level < 0.1 {
            Self::None
        } else if level < 0.25 {
            Self::Minimal
        } else if level < 0.4 {
            Self::Minor
        } else if level < 0.6 {
            Self::Moderate
        } else if level < 0.8 {
            Self::Major
        } else if level < 0.95 {
            Self::Dominant
        } else {
            Self::Absolute
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Minimal => "Minimal",
            Self::Minor => "Minor",
            Self::Moderate => "Moderate",
            Self::Major => "Major",
            Self::Dominant => "Dominant",
            Self::Absolute => "Absolute",
        }
    }
}

impl std::fmt::Display for ControlBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Deltas actually applied to a region by its controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlEffects {
    pub stability_delta: f64,
    pub resources_delta: f64,
}

/// Multiplicative growth-rate modifiers for a region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthFactors {
    pub stability: f64,
    pub resources: f64,
    pub danger: f64,
}

impl GrowthFactors {
    pub fn combined(&self) -> f64 {
        self.stability * self.resources * self.danger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_bands() {
        assert_eq!(ControlBand::from_level(0.0), ControlBand::None);
        assert_eq!(ControlBand::from_level(0.3), ControlBand::Minor);
        assert_eq!(ControlBand::from_level(0.9), ControlBand::Dominant);
        assert_eq!(ControlBand::from_level(1.0), ControlBand::Absolute);
    }
}
