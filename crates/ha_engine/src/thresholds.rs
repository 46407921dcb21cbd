//! Hand-tuned constants of the decision pipeline.
//!
//! None of these values has a derivation behind it; they were tuned against
//! live matches and are kept here so a change is a one-line diff.

use serde::{Deserialize, Serialize};

/// Dead-game detector fires at this accumulated score.
pub const DEAD_GAME_MIN_SCORE: u32 = 5;
/// Time-bomb detector fires at this accumulated score.
pub const TIME_BOMB_MIN_SCORE: u32 = 6;
/// Mirror-check archetype activation.
pub const MIRROR_ACTIVATION: f64 = 0.70;

pub const SHADOW_XG_CAP: f64 = 1.5;
pub const PRESSURE_HOT_MOMENT: f64 = 60.0;

/// Professional odd range accepted at the input boundary.
pub const ODD_MIN: f64 = 1.40;
pub const ODD_MAX: f64 = 3.50;

/// Dead zone / lock window triggers.
pub const DEAD_ZONE_SHADOW_XG: f64 = 0.60;
pub const DEAD_ZONE_CHANCES_AGAINST: u32 = 2;
pub const EXTREME_PRESSURE_INDEX: f64 = 75.0;
pub const EXTREME_PRESSURE_XG: f64 = 2.5;
pub const LOCK_SPIKE_SHADOW_XG: f64 = 0.50;
pub const LOCK_SPIKE_PRESSURE: f64 = 80.0;

/// Confidence needed before any primary entry is considered.
pub const PRIMARY_EDGE_EV: f64 = 2.0;
pub const PRIMARY_EDGE_CONFIDENCE: f64 = 60.0;
/// Balanced / LAB approval also needs this real probability.
pub const PRIMARY_EDGE_PROBABILITY: f64 = 62.0;

/// OPC eligibility.
pub const OPC_EV_FLOOR: f64 = -10.0;
pub const OPC_MIN_POSITIVITY: usize = 4;
pub const OPC_MIN_SIGNALS: usize = 3;

/// Green light demands at least this confidence.
pub const GREEN_LIGHT_CONFIDENCE: f64 = 65.0;
pub const GREEN_LIGHT_MAX_SHADOW_XG: f64 = 0.30;

/// In-memory history kept by the server.
pub const HISTORY_LEN: usize = 10;
/// Session record freshness, hours.
pub const SESSION_TTL_HOURS: i64 = 4;

pub const LEVEL3_DISCLAIMER: &str =
    "⚠️ Entrada com EV negativo controlado — Modo Agressivo Inteligente.";

/// Runtime-tunable knobs of the gate evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Odd below this is an absolute red flag.
    pub min_odd: f64,
    /// Expected reversal probability above this is an absolute red flag.
    pub max_erp: f64,
    /// Away xG below `xg_low_threshold` up to `xg_low_minute` blocks entry.
    pub xg_low_threshold: f64,
    pub xg_low_minute: u32,
    /// Cooldown armed by a shadow-xG or pressure spike.
    pub lock_window_secs: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_odd:          1.60,
            max_erp:          35.0,
            xg_low_threshold: 0.40,
            xg_low_minute:    55,
            lock_window_secs: 180,
        }
    }
}
