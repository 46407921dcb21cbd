//! Gate / block evaluator: absolute red flags, dead zone, lock window and
//! the soft yellow flags.

use crate::classifiers::RiskMap;
use crate::normalizers::Level;
use crate::thresholds::{
    EngineConfig, DEAD_ZONE_CHANCES_AGAINST, DEAD_ZONE_SHADOW_XG, EXTREME_PRESSURE_INDEX,
    EXTREME_PRESSURE_XG, LOCK_SPIKE_PRESSURE, LOCK_SPIKE_SHADOW_XG,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Any one of these forces confidence to 0 and a no-bet verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedFlag {
    LowAwayXg { xg: f64, threshold: f64, cutoff_minute: u32 },
    AwayInert,
    MultipleRedCards { count: u32 },
    AwayRedCard,
    OddBelowFloor { odd: f64, floor: f64 },
    ReversalAboveCeiling { erp: f64, ceiling: f64 },
    RiskMapDead,
    ExtremePressure { index: f64, xg: f64 },
    DeadZone { reasons: Vec<String> },
    LockWindow { remaining_secs: i64 },
}

impl RedFlag {
    pub fn message(&self) -> String {
        match self {
            RedFlag::LowAwayXg { threshold, cutoff_minute, .. } => {
                format!("🚫 xG VISITANTE < {threshold:.2} até minuto {cutoff_minute}")
            }
            RedFlag::AwayInert => "🚫 VISITANTE SEM xG E SEM CHUTES".to_string(),
            RedFlag::MultipleRedCards { count } => {
                format!("🚫 {count} EXPULSÕES - APENAS UNDER/CARTÕES")
            }
            RedFlag::AwayRedCard => "🔴 EXPULSÃO CONTRA UNDERDOG".to_string(),
            RedFlag::OddBelowFloor { odd, floor } => format!("🚫 ODD {odd:.2} < {floor:.2}"),
            RedFlag::ReversalAboveCeiling { erp, ceiling } => {
                format!("🚫 ERP {erp:.0}% > {ceiling:.0}%")
            }
            RedFlag::RiskMapDead => "🚫 RISK MAP = DEAD".to_string(),
            RedFlag::ExtremePressure { index, xg } => {
                format!("🔥 PRESSÃO EXTREMA DO FAVORITO ({index:.0}/100, xG {xg:.2})")
            }
            RedFlag::DeadZone { reasons } => format!("☠️ DEAD ZONE: {}", reasons.join(", ")),
            RedFlag::LockWindow { remaining_secs } => {
                format!("🔒 LOCK WINDOW ATIVA ({remaining_secs}s restantes)")
            }
        }
    }
}

/// Soft flags: a small confidence penalty, never a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YellowFlag {
    WeakMomentum,
    LowXg,
    LowTempo,
    ModeratePressure,
}

impl YellowFlag {
    pub fn penalty(&self) -> f64 {
        match self {
            YellowFlag::WeakMomentum     => -3.0,
            YellowFlag::LowXg            => -3.0,
            YellowFlag::LowTempo         => -2.0,
            YellowFlag::ModeratePressure => -3.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            YellowFlag::WeakMomentum     => "🟡 Momentum fraco",
            YellowFlag::LowXg            => "🟡 xG visitante baixo",
            YellowFlag::LowTempo         => "🟡 Ritmo baixo",
            YellowFlag::ModeratePressure => "🟡 Pressão moderada do favorito",
        }
    }
}

/// Per-fixture cooldown armed by shadow-xG or pressure spikes.
#[derive(Debug)]
pub struct CooldownTracker {
    window: Duration,
    locked_until: HashMap<u64, DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new(window_secs: i64) -> Self {
        Self { window: Duration::seconds(window_secs), locked_until: HashMap::new() }
    }

    /// Locks the fixture for one window from `now`.
    pub fn arm(&mut self, fixture_id: u64, now: DateTime<Utc>) {
        self.locked_until.insert(fixture_id, now + self.window);
        debug!(fixture_id, until = %(now + self.window), "lock window armed");
    }

    /// Seconds left on the fixture's lock, if any.
    pub fn remaining(&self, fixture_id: u64, now: DateTime<Utc>) -> Option<i64> {
        self.locked_until
            .get(&fixture_id)
            .map(|until| (*until - now).num_seconds())
            .filter(|secs| *secs > 0)
    }

    pub fn is_locked(&self, fixture_id: u64, now: DateTime<Utc>) -> bool {
        self.remaining(fixture_id, now).is_some()
    }

    /// Drops expired locks.
    pub fn purge(&mut self, now: DateTime<Utc>) {
        self.locked_until.retain(|_, until| *until > now);
    }

    pub fn active_locks(&self) -> usize {
        self.locked_until.len()
    }
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new(EngineConfig::default().lock_window_secs)
    }
}

#[derive(Debug, Clone)]
pub struct GateInputs {
    pub fixture_id:             u64,
    pub minute:                 u32,
    pub odd:                    f64,
    pub away_xg:                f64,
    pub away_shots:             u32,
    pub total_red_cards:        u32,
    pub away_red_cards:         u32,
    pub erp:                    f64,
    pub risk_map:               RiskMap,
    pub shadow_xg:              f64,
    pub favourite_pressure:     f64,
    pub favourite_xg:           f64,
    /// New favourite shots on target since a home-favoured half-time read.
    pub chances_against:        u32,
    pub momentum_last5:         f64,
    pub tempo:                  Level,
}

impl GateInputs {
    fn extreme_pressure(&self) -> bool {
        self.favourite_pressure > EXTREME_PRESSURE_INDEX && self.favourite_xg > EXTREME_PRESSURE_XG
    }

    fn spike(&self) -> bool {
        self.shadow_xg >= LOCK_SPIKE_SHADOW_XG || self.favourite_pressure >= LOCK_SPIKE_PRESSURE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub red_flags:    Vec<RedFlag>,
    pub yellow_flags: Vec<YellowFlag>,
    pub dead_zone:    bool,
    pub lock_window:  bool,
}

impl GateDecision {
    pub fn blocked(&self) -> bool {
        !self.red_flags.is_empty()
    }

    pub fn yellow_penalty(&self) -> f64 {
        self.yellow_flags.iter().map(|f| f.penalty()).sum()
    }
}

fn absolute_flags(i: &GateInputs, config: &EngineConfig) -> Vec<RedFlag> {
    let mut flags = Vec::new();

    if i.away_xg < config.xg_low_threshold && i.minute <= config.xg_low_minute {
        flags.push(RedFlag::LowAwayXg {
            xg:            i.away_xg,
            threshold:     config.xg_low_threshold,
            cutoff_minute: config.xg_low_minute,
        });
    }
    if i.away_xg == 0.0 && i.away_shots == 0 {
        flags.push(RedFlag::AwayInert);
    }
    if i.total_red_cards >= 2 {
        flags.push(RedFlag::MultipleRedCards { count: i.total_red_cards });
    }
    if i.away_red_cards > 0 {
        flags.push(RedFlag::AwayRedCard);
    }
    if i.odd < config.min_odd {
        flags.push(RedFlag::OddBelowFloor { odd: i.odd, floor: config.min_odd });
    }
    if i.erp > config.max_erp {
        flags.push(RedFlag::ReversalAboveCeiling { erp: i.erp, ceiling: config.max_erp });
    }
    if i.risk_map == RiskMap::Dead {
        flags.push(RedFlag::RiskMapDead);
    }
    if i.extreme_pressure() {
        flags.push(RedFlag::ExtremePressure { index: i.favourite_pressure, xg: i.favourite_xg });
    }

    flags
}

fn dead_zone_reasons(i: &GateInputs, absolute: &[RedFlag]) -> Vec<String> {
    let mut reasons = Vec::new();
    if !absolute.is_empty() {
        reasons.push(format!("{} red flag(s)", absolute.len()));
    }
    if i.shadow_xg > DEAD_ZONE_SHADOW_XG {
        reasons.push(format!("shadow xG {:.2}", i.shadow_xg));
    }
    if i.chances_against >= DEAD_ZONE_CHANCES_AGAINST {
        reasons.push(format!("{} chances contra", i.chances_against));
    }
    if i.extreme_pressure() {
        reasons.push("pressão extrema".to_string());
    }
    reasons
}

pub fn yellow_flags(i: &GateInputs) -> Vec<YellowFlag> {
    let mut flags = Vec::new();
    if i.momentum_last5 < 35.0 {
        flags.push(YellowFlag::WeakMomentum);
    }
    if i.away_xg < 0.5 {
        flags.push(YellowFlag::LowXg);
    }
    if i.tempo == Level::Low {
        flags.push(YellowFlag::LowTempo);
    }
    if (40.0..60.0).contains(&i.favourite_pressure) {
        flags.push(YellowFlag::ModeratePressure);
    }
    flags
}

/// Runs every gate. A spike arms the fixture's lock window, which then
/// blocks this and every later analysis of the fixture until it expires.
pub fn evaluate_gates(
    inputs:    &GateInputs,
    cooldowns: &mut CooldownTracker,
    now:       DateTime<Utc>,
    config:    &EngineConfig,
) -> GateDecision {
    let mut red_flags = absolute_flags(inputs, config);

    let reasons = dead_zone_reasons(inputs, &red_flags);
    let dead_zone = !reasons.is_empty();
    if dead_zone {
        red_flags.push(RedFlag::DeadZone { reasons });
    }

    if inputs.spike() && !cooldowns.is_locked(inputs.fixture_id, now) {
        cooldowns.arm(inputs.fixture_id, now);
    }
    let lock = cooldowns.remaining(inputs.fixture_id, now);
    if let Some(remaining_secs) = lock {
        red_flags.push(RedFlag::LockWindow { remaining_secs });
    }

    GateDecision {
        red_flags,
        yellow_flags: yellow_flags(inputs),
        dead_zone,
        lock_window: lock.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm(fixture_id: u64) -> GateInputs {
        GateInputs {
            fixture_id,
            minute:             65,
            odd:                1.90,
            away_xg:            0.9,
            away_shots:         8,
            total_red_cards:    0,
            away_red_cards:     0,
            erp:                15.0,
            risk_map:           RiskMap::Locked,
            shadow_xg:          0.2,
            favourite_pressure: 25.0,
            favourite_xg:       0.8,
            chances_against:    0,
            momentum_last5:     60.0,
            tempo:              Level::Medium,
        }
    }

    #[test]
    fn calm_game_passes() {
        let mut cd = CooldownTracker::new(180);
        let g = evaluate_gates(&calm(1), &mut cd, Utc::now(), &EngineConfig::default());
        assert!(!g.blocked(), "{:?}", g.red_flags);
        assert!(!g.dead_zone);
        assert!(g.yellow_flags.is_empty());
    }

    #[test]
    fn low_odd_is_absolute_and_opens_dead_zone() {
        let mut cd = CooldownTracker::new(180);
        let i = GateInputs { odd: 1.5, ..calm(1) };
        let g = evaluate_gates(&i, &mut cd, Utc::now(), &EngineConfig::default());

        assert!(g.blocked());
        assert!(g.dead_zone);
        assert!(g.red_flags.iter().any(|f| matches!(f, RedFlag::OddBelowFloor { .. })));
    }

    #[test]
    fn early_low_xg_only_counts_before_cutoff() {
        let mut cd = CooldownTracker::new(180);
        let early = GateInputs { minute: 50, away_xg: 0.3, ..calm(1) };
        let late = GateInputs { minute: 60, away_xg: 0.3, ..calm(2) };
        let cfg = EngineConfig::default();

        assert!(evaluate_gates(&early, &mut cd, Utc::now(), &cfg)
            .red_flags
            .iter()
            .any(|f| matches!(f, RedFlag::LowAwayXg { .. })));
        let g = evaluate_gates(&late, &mut cd, Utc::now(), &cfg);
        assert!(!g.blocked());
        assert_eq!(g.yellow_flags, vec![YellowFlag::LowXg]);
    }

    #[test]
    fn spike_locks_only_its_fixture() {
        let mut cd = CooldownTracker::new(180);
        let cfg = EngineConfig::default();
        let t0 = Utc::now();

        let spike = GateInputs { favourite_pressure: 80.0, ..calm(10) };
        let g = evaluate_gates(&spike, &mut cd, t0, &cfg);
        assert!(g.lock_window);

        // same fixture, calm again, still inside the window
        let g = evaluate_gates(&calm(10), &mut cd, t0 + Duration::seconds(120), &cfg);
        assert!(g.lock_window);
        assert!(g.red_flags.iter().any(|f| matches!(f, RedFlag::LockWindow { remaining_secs: 60 })));

        // another fixture analysed meanwhile is not affected
        let g = evaluate_gates(&calm(11), &mut cd, t0 + Duration::seconds(120), &cfg);
        assert!(!g.blocked());

        // window over
        let g = evaluate_gates(&calm(10), &mut cd, t0 + Duration::seconds(181), &cfg);
        assert!(!g.lock_window);
        cd.purge(t0 + Duration::seconds(181));
        assert_eq!(cd.active_locks(), 0);
    }

    #[test]
    fn shadow_xg_above_dead_zone_without_absolute_flag() {
        let mut cd = CooldownTracker::new(0);
        let i = GateInputs { shadow_xg: 0.65, ..calm(3) };
        let g = evaluate_gates(&i, &mut cd, Utc::now(), &EngineConfig::default());
        assert!(g.dead_zone);
        assert_eq!(g.red_flags.len(), 1);
    }

    #[test]
    fn yellow_penalties_add_up() {
        let i = GateInputs {
            momentum_last5:     20.0,
            away_xg:            0.45,
            tempo:              Level::Low,
            favourite_pressure: 55.0,
            minute:             70,
            ..calm(4)
        };
        let flags = yellow_flags(&i);
        assert_eq!(flags.len(), 4);
        let total: f64 = flags.iter().map(|f| f.penalty()).sum();
        assert_eq!(total, -11.0);
    }
}
