//! Box-score snapshots and the half-time snapshot store.

use crate::normalizers::dominance_score;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One side's box score. Missing upstream fields deserialize to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamStats {
    pub goals:             u32,
    pub shots_total:       u32,
    pub shots_on_target:   u32,
    /// Ball possession, percent.
    pub possession:        f64,
    pub dangerous_attacks: u32,
    pub corners:           u32,
    pub fouls:             u32,
    pub yellow_cards:      u32,
    pub red_cards:         u32,
    /// Reported expected goals; `None` when the provider has no xG.
    pub xg:                Option<f64>,
}

impl TeamStats {
    pub fn xg_or_zero(&self) -> f64 {
        self.xg.unwrap_or(0.0)
    }

    /// RDS of this side.
    pub fn dominance(&self) -> f64 {
        dominance_score(
            self.shots_total as f64,
            self.shots_on_target as f64,
            self.possession,
            self.dangerous_attacks as f64,
            self.xg,
        )
    }
}

/// Box score of a fixture at one point in time. Home is the favourite,
/// away is the HA+ side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchStatSnapshot {
    pub fixture_id: u64,
    #[serde(default)]
    pub home_team:  String,
    #[serde(default)]
    pub away_team:  String,
    #[serde(default)]
    pub minute:     u32,
    #[serde(default)]
    pub home:       TeamStats,
    #[serde(default)]
    pub away:       TeamStats,
}

impl MatchStatSnapshot {
    /// Home goals minus away goals.
    pub fn score_diff(&self) -> i32 {
        self.home.goals as i32 - self.away.goals as i32
    }

    pub fn total_goals(&self) -> u32 {
        self.home.goals + self.away.goals
    }

    pub fn total_shots(&self) -> u32 {
        self.home.shots_total + self.away.shots_total
    }

    pub fn total_dangerous_attacks(&self) -> u32 {
        self.home.dangerous_attacks + self.away.dangerous_attacks
    }

    pub fn total_red_cards(&self) -> u32 {
        self.home.red_cards + self.away.red_cards
    }

    pub fn total_xg(&self) -> f64 {
        self.home.xg_or_zero() + self.away.xg_or_zero()
    }

    pub fn score_line(&self) -> String {
        format!("{}-{}", self.home.goals, self.away.goals)
    }
}

/// A first-half read kept for comparison with later live snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalfTimeSnapshot {
    pub stats:          MatchStatSnapshot,
    pub rds_home:       f64,
    pub rds_away:       f64,
    /// |away RDS − home RDS|
    pub dominance:      f64,
    /// Away RDS, the HA+ side.
    pub underdog_score: f64,
    pub profile:        String,
    pub tendency:       String,
    pub captured_at:    DateTime<Utc>,
}

impl HalfTimeSnapshot {
    pub fn capture(stats: MatchStatSnapshot, captured_at: DateTime<Utc>) -> Self {
        let rds_home = stats.home.dominance();
        let rds_away = stats.away.dominance();
        let diff = rds_away - rds_home;
        let dominance = diff.abs();

        let profile = if dominance < 15.0 {
            "Jogo equilibrado"
        } else if diff > 15.0 {
            "Visitante dominando"
        } else if diff < -15.0 {
            "Mandante dominando"
        } else if stats.total_shots() < 10 {
            "Jogo truncado"
        } else {
            "Jogo competitivo"
        };

        let tendency = if rds_away >= 70.0 {
            "Visitante vivo e competitivo - HA+ favorável"
        } else if rds_away >= 50.0 {
            "Visitante presente - HA+ possível"
        } else if rds_away < 40.0 {
            "Visitante apagado - HA+ arriscado"
        } else {
            "Cenário neutro - avaliar 2º tempo"
        };

        Self {
            stats,
            rds_home,
            rds_away,
            dominance,
            underdog_score: rds_away,
            profile: profile.to_string(),
            tendency: tendency.to_string(),
            captured_at,
        }
    }

    pub fn fixture_id(&self) -> u64 {
        self.stats.fixture_id
    }
}

/// Store of half-time snapshots keyed by fixture id, passed into the
/// pipeline instead of living in a global.
pub trait SnapshotRepository {
    fn get(&self, fixture_id: u64) -> Option<&HalfTimeSnapshot>;
    /// Stores the snapshot, replacing any earlier read of the same fixture.
    fn put(&mut self, snapshot: HalfTimeSnapshot);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime store; nothing expires.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: HashMap<u64, HalfTimeSnapshot>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotRepository for InMemorySnapshotStore {
    fn get(&self, fixture_id: u64) -> Option<&HalfTimeSnapshot> {
        self.snapshots.get(&fixture_id)
    }

    fn put(&mut self, snapshot: HalfTimeSnapshot) {
        self.snapshots.insert(snapshot.fixture_id(), snapshot);
    }

    fn len(&self) -> usize {
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(shots: u32, sot: u32, poss: f64, da: u32) -> TeamStats {
        TeamStats {
            shots_total: shots,
            shots_on_target: sot,
            possession: poss,
            dangerous_attacks: da,
            ..TeamStats::default()
        }
    }

    #[test]
    fn capture_labels_away_dominance() {
        let stats = MatchStatSnapshot {
            fixture_id: 7,
            home_team: "Palmeiras".into(),
            away_team: "Cuiabá".into(),
            minute: 45,
            home: side(3, 1, 35.0, 10),
            away: side(12, 6, 65.0, 40),
        };
        let ht = HalfTimeSnapshot::capture(stats, Utc::now());

        assert!(ht.rds_away > ht.rds_home);
        assert_eq!(ht.profile, "Visitante dominando");
        assert_eq!(ht.underdog_score, ht.rds_away);
        assert!(ht.dominance > 15.0, "dominance {}", ht.dominance);
    }

    #[test]
    fn store_replaces_by_fixture() {
        let mut store = InMemorySnapshotStore::new();
        let mut stats = MatchStatSnapshot {
            fixture_id: 1,
            home_team: String::new(),
            away_team: String::new(),
            minute: 45,
            home: TeamStats::default(),
            away: TeamStats::default(),
        };
        store.put(HalfTimeSnapshot::capture(stats.clone(), Utc::now()));
        stats.away = side(10, 5, 55.0, 30);
        store.put(HalfTimeSnapshot::capture(stats, Utc::now()));

        assert_eq!(store.len(), 1);
        assert!(store.get(1).map(|s| s.rds_away > 0.0).unwrap_or(false));
        assert!(store.get(2).is_none());
    }
}
