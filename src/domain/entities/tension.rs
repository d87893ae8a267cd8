//! Tension records kept per (region, point of interest)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{PoiId, RegionId};

/// Number of applied impacts retained per location
pub const RECENT_EVENT_LIMIT: usize = 10;

/// Stored tension of one location
///
/// `level` is the decayed value without modifiers. Modifiers are applied on
/// read so an active modifier is never counted twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionState {
    pub level: f64,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub modifiers: Vec<TensionModifier>,
    #[serde(default)]
    pub recent_events: Vec<TensionEventRecord>,
}

impl TensionState {
    pub fn new(level: f64, at: DateTime<Utc>) -> Self {
        Self {
            level,
            last_updated: at,
            modifiers: Vec::new(),
            recent_events: Vec::new(),
        }
    }

    /// Drop modifiers whose expiry is at or before `now`
    pub fn prune_modifiers(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.modifiers.len();
        self.modifiers.retain(|m| m.expires_at > now);
        before - self.modifiers.len()
    }

    pub fn modifier_total(&self) -> f64 {
        self.modifiers.iter().map(|m| m.value).sum()
    }

    pub fn record_event(&mut self, record: TensionEventRecord) {
        self.recent_events.push(record);
        if self.recent_events.len() > RECENT_EVENT_LIMIT {
            let excess = self.recent_events.len() - RECENT_EVENT_LIMIT;
            self.recent_events.drain(..excess);
        }
    }
}

/// Temporary signed adjustment such as festival relief or revolt aftermath
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionModifier {
    pub kind: String,
    pub value: f64,
    pub expires_at: DateTime<Utc>,
    pub source: String,
}

/// Audit entry for an applied impact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionEventRecord {
    pub at: DateTime<Utc>,
    pub delta: f64,
    pub resulting_level: f64,
    pub description: String,
}

/// Persisted snapshot row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionSnapshot {
    pub region_id: RegionId,
    pub poi_id: PoiId,
    pub state: TensionState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_recent_events_are_bounded() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut state = TensionState::new(0.3, at);
        for i in 0..15 {
            state.record_event(TensionEventRecord {
                at,
                delta: 0.01,
                resulting_level: 0.3,
                description: format!("event {}", i),
            });
        }
        assert_eq!(state.recent_events.len(), RECENT_EVENT_LIMIT);
        assert_eq!(state.recent_events[0].description, "event 5");
    }

    #[test]
    fn test_prune_removes_expired_modifiers() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut state = TensionState::new(0.3, at);
        state.modifiers.push(TensionModifier {
            kind: "festival".into(),
            value: -0.1,
            expires_at: at + Duration::hours(2),
            source: "harvest".into(),
        });
        assert_eq!(state.prune_modifiers(at + Duration::hours(1)), 0);
        assert_eq!(state.prune_modifiers(at + Duration::hours(2)), 1);
        assert_eq!(state.modifier_total(), 0.0);
    }
}
