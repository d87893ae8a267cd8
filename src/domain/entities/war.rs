//! War entities - War state, battles, peace offers and outcomes

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::FactionPair;
use crate::domain::value_objects::{BattleId, FactionId, RegionId, WarId};

/// Lifecycle phase of a war
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarPhase {
    NoWar,
    AtWar,
    NegotiatingPeace,
    Concluded,
}

impl WarPhase {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::NoWar => "No War",
            Self::AtWar => "At War",
            Self::NegotiatingPeace => "Negotiating Peace",
            Self::Concluded => "Concluded",
        }
    }
}

impl std::fmt::Display for WarPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A war between two factions
///
/// Archived with `is_active = false` once concluded; the outcome is kept on
/// the record so the archive is self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarState {
    pub id: WarId,
    pub faction_a_id: FactionId,
    pub faction_b_id: FactionId,
    pub start_date: DateTime<Utc>,
    pub exhaustion_a: f64,
    pub exhaustion_b: f64,
    pub battles: Vec<Battle>,
    pub current_peace_offer: Option<PeaceOffer>,
    pub disputed_regions: Vec<RegionId>,
    pub is_active: bool,
    pub phase: WarPhase,
    pub negotiation_started: Option<DateTime<Utc>>,
    /// When the last peace offer was turned down
    #[serde(default)]
    pub peace_rejected_at: Option<DateTime<Utc>>,
    pub outcome: Option<WarOutcome>,
}

impl WarState {
    pub fn new(
        faction_a_id: FactionId,
        faction_b_id: FactionId,
        disputed_regions: Vec<RegionId>,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: WarId::new(),
            faction_a_id,
            faction_b_id,
            start_date,
            exhaustion_a: 0.0,
            exhaustion_b: 0.0,
            battles: Vec::new(),
            current_peace_offer: None,
            disputed_regions,
            is_active: true,
            phase: WarPhase::AtWar,
            negotiation_started: None,
            peace_rejected_at: None,
            outcome: None,
        }
    }

    pub fn pair(&self) -> FactionPair {
        FactionPair::new(self.faction_a_id, self.faction_b_id)
    }

    pub fn is_participant(&self, faction_id: FactionId) -> bool {
        self.faction_a_id == faction_id || self.faction_b_id == faction_id
    }

    pub fn opponent_of(&self, faction_id: FactionId) -> Option<FactionId> {
        self.pair().other(faction_id)
    }

    pub fn exhaustion_of(&self, faction_id: FactionId) -> f64 {
        if faction_id == self.faction_a_id {
            self.exhaustion_a
        } else if faction_id == self.faction_b_id {
            self.exhaustion_b
        } else {
            0.0
        }
    }

    /// Add exhaustion to one side, capped at `max`
    pub fn add_exhaustion(&mut self, faction_id: FactionId, amount: f64, max: f64) {
        if faction_id == self.faction_a_id {
            self.exhaustion_a = (self.exhaustion_a + amount).clamp(0.0, max);
        } else if faction_id == self.faction_b_id {
            self.exhaustion_b = (self.exhaustion_b + amount).clamp(0.0, max);
        }
    }

    pub fn battle_wins(&self, faction_id: FactionId) -> usize {
        self.battles
            .iter()
            .filter(|b| b.winner == Some(faction_id))
            .count()
    }

    pub fn duration_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_date).num_days().max(0)
    }

    /// Sum of a side's battle losses as a fraction of its forces
    pub fn total_losses(&self, faction_id: FactionId) -> f64 {
        self.battles
            .iter()
            .map(|b| {
                if b.attacker == faction_id {
                    b.attacker_losses
                } else if b.defender == faction_id {
                    b.defender_losses
                } else {
                    0.0
                }
            })
            .sum()
    }
}

/// One resolved battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battle {
    pub id: BattleId,
    pub region_id: Option<RegionId>,
    pub date: DateTime<Utc>,
    pub attacker: FactionId,
    pub defender: FactionId,
    pub winner: Option<FactionId>,
    pub attacker_losses: f64,
    pub defender_losses: f64,
    pub terrain: String,
}

/// A proposal to end the war
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeaceOffer {
    pub offered_by: FactionId,
    pub offered_at: DateTime<Utc>,
    #[serde(default)]
    pub terms: Vec<String>,
    /// Both sides accepted a white peace
    #[serde(default)]
    pub mutual: bool,
}

impl PeaceOffer {
    pub fn new(offered_by: FactionId, offered_at: DateTime<Utc>) -> Self {
        Self {
            offered_by,
            offered_at,
            terms: Vec::new(),
            mutual: false,
        }
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.terms.push(term.into());
        self
    }

    pub fn mutual(mut self) -> Self {
        self.mutual = true;
        self
    }
}

/// How a war ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarOutcomeType {
    DecisiveVictory,
    Victory,
    Stalemate,
    Ceasefire,
    WhitePeace,
}

impl WarOutcomeType {
    pub fn has_winner(&self) -> bool {
        matches!(self, Self::DecisiveVictory | Self::Victory)
    }

    /// Share of disputed regions handed to the winner
    pub fn territory_share(&self) -> f64 {
        match self {
            Self::DecisiveVictory => 0.8,
            Self::Victory => 0.5,
            _ => 0.0,
        }
    }

    /// Change to the pair's relationship tension once peace is signed
    pub fn tension_change(&self) -> f64 {
        match self {
            Self::DecisiveVictory => -30.0,
            Self::Victory => -20.0,
            Self::Stalemate => -10.0,
            Self::Ceasefire => -5.0,
            Self::WhitePeace => -15.0,
        }
    }

    pub fn treaty_duration_days(&self) -> i64 {
        match self {
            Self::DecisiveVictory => 60,
            Self::Victory => 36,
            Self::Stalemate | Self::Ceasefire => 12,
            Self::WhitePeace => 24,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DecisiveVictory => "Decisive Victory",
            Self::Victory => "Victory",
            Self::Stalemate => "Stalemate",
            Self::Ceasefire => "Ceasefire",
            Self::WhitePeace => "White Peace",
        }
    }
}

impl std::fmt::Display for WarOutcomeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A region changing hands as part of a peace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritorialChange {
    pub region_id: RegionId,
    pub from: FactionId,
    pub to: FactionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTransfer {
    pub from: FactionId,
    pub to: FactionId,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairTensionChange {
    pub pair: FactionPair,
    pub delta: f64,
}

/// Immutable record produced once when a war concludes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarOutcome {
    pub war_id: WarId,
    pub winner: Option<FactionId>,
    pub loser: Option<FactionId>,
    pub outcome_type: WarOutcomeType,
    pub territorial_changes: Vec<TerritorialChange>,
    pub resource_transfers: Vec<ResourceTransfer>,
    pub reputation_changes: BTreeMap<FactionId, f64>,
    pub tension_changes: Vec<PairTensionChange>,
    pub casualties: BTreeMap<FactionId, u64>,
    pub duration_days: i64,
    pub treaty_duration_days: i64,
    pub concluded_at: DateTime<Utc>,
}
