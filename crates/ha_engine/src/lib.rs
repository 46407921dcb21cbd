//! HA+ decision engine.
//!
//! Pure heuristics that turn a live box score into a bet / no-bet verdict on
//! the Asian-handicap-positive side (always the away team here), plus the
//! pre-game read, signal combination and post-match settlement.
//!
//! The only state is the half-time snapshot store and the per-fixture
//! cooldown tracker, both owned by [`HaEngine`] and passed explicitly into
//! the pipeline.

pub mod adjustments;
pub mod aggro;
pub mod classifiers;
pub mod combine;
pub mod composer;
pub mod direction;
pub mod gates;
pub mod mirror;
pub mod normalizers;
pub mod opc;
pub mod pregame;
pub mod shield;
pub mod snapshot;
pub mod thresholds;
pub mod validation;

pub use aggro::AggroLevel;
pub use classifiers::{Coherence, PatternBreak, RiskMap};
pub use combine::{combine_signals, CombinedSignals};
pub use composer::{analyze_live, AnalysisResult, Decision, LiveAnalysisInput, Mode, Profile};
pub use direction::{evaluate_direction, Direction, DirectionReport, FullTimeData};
pub use gates::{CooldownTracker, GateDecision, RedFlag};
pub use opc::{OpcStatus, OpcVerdict};
pub use pregame::{analyze_pregame, PregameInput, PregameResult};
pub use shield::HandicapLine;
pub use snapshot::{HalfTimeSnapshot, InMemorySnapshotStore, MatchStatSnapshot, SnapshotRepository, TeamStats};
pub use thresholds::EngineConfig;
pub use validation::{ValidationError, ValidationErrors};

use chrono::{DateTime, Utc};
use tracing::info;

/// Owns the engine state for one process.
pub struct HaEngine<R: SnapshotRepository = InMemorySnapshotStore> {
    snapshots: R,
    cooldowns: CooldownTracker,
    config:    EngineConfig,
}

impl HaEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_repository(InMemorySnapshotStore::new(), config)
    }
}

impl Default for HaEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<R: SnapshotRepository> HaEngine<R> {
    pub fn with_repository(snapshots: R, config: EngineConfig) -> Self {
        let cooldowns = CooldownTracker::new(config.lock_window_secs);
        Self { snapshots, cooldowns, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshots(&self) -> &R {
        &self.snapshots
    }

    /// First-half read: derives the half-time scores and stores them for
    /// later comparison, replacing any earlier read of the fixture.
    pub fn read_half_time(&mut self, stats: MatchStatSnapshot, now: DateTime<Utc>) -> HalfTimeSnapshot {
        let snapshot = HalfTimeSnapshot::capture(stats, now);
        info!(
            fixture_id = snapshot.fixture_id(),
            rds_home = snapshot.rds_home,
            rds_away = snapshot.rds_away,
            profile = %snapshot.profile,
            "half-time snapshot stored"
        );
        self.snapshots.put(snapshot.clone());
        snapshot
    }

    pub fn analyze_live(&mut self, input: &LiveAnalysisInput, now: DateTime<Utc>) -> AnalysisResult {
        self.cooldowns.purge(now);
        composer::analyze_live(input, &self.snapshots, &mut self.cooldowns, &self.config, now)
    }
}
