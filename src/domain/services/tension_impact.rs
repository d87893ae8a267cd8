//! Impact scoring for tension updates
//!
//! Each scorer maps an event description to a normalized impact in 0..1;
//! the tension manager then weights it with the location's config.

use serde::{Deserialize, Serialize};

/// Something a player did at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAction {
    pub kind: PlayerActionKind,
    #[serde(default)]
    pub lethal: bool,
    #[serde(default)]
    pub stealth: bool,
    #[serde(default)]
    pub enemies_defeated: u32,
}

impl PlayerAction {
    pub fn new(kind: PlayerActionKind) -> Self {
        Self {
            kind,
            lethal: false,
            stealth: false,
            enemies_defeated: 0,
        }
    }

    pub fn combat(enemies_defeated: u32) -> Self {
        Self {
            enemies_defeated,
            ..Self::new(PlayerActionKind::Combat)
        }
    }

    pub fn lethal(mut self) -> Self {
        self.lethal = true;
        self
    }

    pub fn stealthy(mut self) -> Self {
        self.stealth = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerActionKind {
    Combat,
    Theft,
    Murder,
    Diplomacy,
    HeroicDeed,
}

/// A change among the NPCs at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcChange {
    pub kind: NpcChangeKind,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub civilian: bool,
    #[serde(default)]
    pub hostile: bool,
    #[serde(default)]
    pub authority: bool,
}

impl NpcChange {
    pub fn new(kind: NpcChangeKind) -> Self {
        Self {
            kind,
            important: false,
            civilian: false,
            hostile: false,
            authority: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcChangeKind {
    Death,
    Arrival,
    Departure,
}

/// A change in the surroundings of a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvironmentalChange {
    Disaster { severity: f64 },
    MagicalEvent { severity: f64, beneficial: bool },
    Economic { severity: f64, prosperity: bool },
    Political { regime_change: bool },
}

/// Pluggable scoring of the three impact sources
pub trait ImpactScorer: Send + Sync {
    fn player_score(&self, action: &PlayerAction) -> f64;
    fn npc_score(&self, change: &NpcChange) -> f64;
    fn environmental_score(&self, change: &EnvironmentalChange) -> f64;
}

/// Built-in event impact table
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultImpactScorer;

fn severity_scale(severity: f64) -> f64 {
    let severity = if severity.is_finite() { severity.clamp(0.0, 1.0) } else { 0.0 };
    0.5 + severity
}

impl ImpactScorer for DefaultImpactScorer {
    fn player_score(&self, action: &PlayerAction) -> f64 {
        let score = match action.kind {
            PlayerActionKind::Combat => {
                let mut base = 0.15;
                if action.lethal {
                    base += 0.3;
                }
                if action.stealth {
                    base -= 0.1;
                }
                let enemies = action.enemies_defeated.max(1) as f64;
                base * (1.0 + (enemies - 1.0) * 0.2).min(2.0)
            }
            PlayerActionKind::Theft => 0.2,
            PlayerActionKind::Murder => 0.45,
            PlayerActionKind::Diplomacy => 0.02,
            PlayerActionKind::HeroicDeed => 0.05,
        };
        score.clamp(0.0, 1.0)
    }

    fn npc_score(&self, change: &NpcChange) -> f64 {
        let score: f64 = match change.kind {
            NpcChangeKind::Death => {
                let mut base = 0.1;
                if change.important {
                    base += 0.3;
                }
                if change.civilian {
                    base += 0.2;
                }
                base
            }
            NpcChangeKind::Arrival => {
                if change.hostile {
                    0.15
                } else {
                    0.02
                }
            }
            NpcChangeKind::Departure => {
                if change.authority {
                    0.15
                } else {
                    0.05
                }
            }
        };
        score.clamp(0.0, 1.0)
    }

    fn environmental_score(&self, change: &EnvironmentalChange) -> f64 {
        let score = match change {
            EnvironmentalChange::Disaster { severity } => 0.3 * severity_scale(*severity),
            EnvironmentalChange::MagicalEvent { beneficial: true, .. } => 0.0,
            EnvironmentalChange::MagicalEvent { severity, .. } => 0.2 * severity_scale(*severity),
            EnvironmentalChange::Economic { prosperity: true, .. } => 0.0,
            EnvironmentalChange::Economic { severity, .. } => 0.1 * severity_scale(*severity),
            EnvironmentalChange::Political { regime_change: true } => 0.2,
            EnvironmentalChange::Political { regime_change: false } => 0.05,
        };
        score.clamp(0.0, 1.0)
    }
}
