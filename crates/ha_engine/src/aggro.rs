//! Aggressiveness auto-tuner.

use crate::classifiers::{Coherence, PatternBreak, RiskMap};
use crate::normalizers::{Level, Momentum};
use serde::{Deserialize, Serialize};

/// Risk appetite of one analysis; each tier has its own EV floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum AggroLevel {
    UltraSafe,
    ConservativePro,
    ModeratePro,
    SmartAggressive,
}

impl AggroLevel {
    pub const ALL: [AggroLevel; 4] = [
        AggroLevel::UltraSafe,
        AggroLevel::ConservativePro,
        AggroLevel::ModeratePro,
        AggroLevel::SmartAggressive,
    ];

    pub fn number(&self) -> u8 {
        match self {
            AggroLevel::UltraSafe       => 0,
            AggroLevel::ConservativePro => 1,
            AggroLevel::ModeratePro     => 2,
            AggroLevel::SmartAggressive => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggroLevel::UltraSafe       => "Ultra Seguro",
            AggroLevel::ConservativePro => "Conservador Pro",
            AggroLevel::ModeratePro     => "Moderado Pro",
            AggroLevel::SmartAggressive => "Agressivo Inteligente",
        }
    }

    /// Minimum EV, percentage points, for a primary entry.
    pub fn ev_floor(&self) -> f64 {
        match self {
            AggroLevel::UltraSafe       => 0.01,
            AggroLevel::ConservativePro => -1.5,
            AggroLevel::ModeratePro     => -2.5,
            AggroLevel::SmartAggressive => -4.0,
        }
    }
}

impl From<AggroLevel> for u8 {
    fn from(level: AggroLevel) -> u8 {
        level.number()
    }
}

impl TryFrom<u8> for AggroLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        AggroLevel::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("aggro level {value} out of range 0..=3"))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AggroInputs {
    pub momentum:       Momentum,
    pub shadow_xg:      f64,
    pub time_bomb:      bool,
    pub pattern_break:  PatternBreak,
    pub dead_game:      bool,
    pub risk_map:       RiskMap,
    pub pressure_index: f64,
}

pub fn determine_aggro_level(i: &AggroInputs) -> AggroLevel {
    if i.dead_game || i.momentum.last5 < 25.0 || i.risk_map == RiskMap::Dead {
        AggroLevel::UltraSafe
    } else if (i.time_bomb || i.pattern_break == PatternBreak::Strong)
        && i.pressure_index >= 70.0
        && i.risk_map.is_volatile()
    {
        AggroLevel::SmartAggressive
    } else if i.shadow_xg >= 0.4 && i.momentum.last5 >= 60.0 && i.risk_map.is_volatile() {
        AggroLevel::ModeratePro
    } else {
        AggroLevel::ConservativePro
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TripleInputs {
    pub momentum_last5: f64,
    pub pressure_index: f64,
    pub pattern_break:  PatternBreak,
    pub time_bomb:      bool,
    pub shadow_xg:      f64,
    pub coherence:      Coherence,
    pub tempo:          Level,
    pub odd:            f64,
    pub min_odd:        f64,
    pub risk_map:       RiskMap,
}

/// Level 3 confirmation. Returns the failed checks; empty means confirmed.
pub fn triple_confirmation(i: &TripleInputs) -> Vec<&'static str> {
    let checks: [(bool, &'static str); 7] = [
        (i.momentum_last5 >= 45.0, "momentum < 45"),
        (i.pressure_index >= 60.0, "pressão < 60"),
        (
            i.pattern_break != PatternBreak::None || i.time_bomb || i.shadow_xg >= 0.20,
            "sem sinal secundário",
        ),
        (i.coherence != Coherence::ScriptBroken, "roteiro rompido"),
        (i.tempo != Level::Low, "ritmo baixo"),
        (i.odd >= i.min_odd, "odd abaixo do piso"),
        (i.risk_map != RiskMap::Dead, "risk map dead"),
    ];

    checks.iter().filter(|(ok, _)| !ok).map(|(_, label)| *label).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizers::Trend;

    fn momentum(last5: f64) -> Momentum {
        Momentum { last5, last10: last5, last15: last5, trend: Trend::Neutral }
    }

    fn inputs() -> AggroInputs {
        AggroInputs {
            momentum:       momentum(50.0),
            shadow_xg:      0.1,
            time_bomb:      false,
            pattern_break:  PatternBreak::None,
            dead_game:      false,
            risk_map:       RiskMap::Locked,
            pressure_index: 30.0,
        }
    }

    #[test]
    fn default_is_conservative() {
        assert_eq!(determine_aggro_level(&inputs()), AggroLevel::ConservativePro);
    }

    #[test]
    fn low_momentum_forces_level_zero() {
        let i = AggroInputs { momentum: momentum(20.0), time_bomb: true, ..inputs() };
        assert_eq!(determine_aggro_level(&i), AggroLevel::UltraSafe);
    }

    #[test]
    fn bomb_under_pressure_in_chaos_is_level_three() {
        let i = AggroInputs {
            time_bomb: true,
            pressure_index: 75.0,
            risk_map: RiskMap::Chaotic,
            ..inputs()
        };
        assert_eq!(determine_aggro_level(&i), AggroLevel::SmartAggressive);
    }

    #[test]
    fn shadow_and_momentum_is_level_two() {
        let i = AggroInputs {
            momentum: momentum(65.0),
            shadow_xg: 0.45,
            risk_map: RiskMap::Explosive,
            ..inputs()
        };
        assert_eq!(determine_aggro_level(&i), AggroLevel::ModeratePro);
    }

    #[test]
    fn floors_descend_with_level() {
        let floors: Vec<f64> = AggroLevel::ALL.iter().map(|l| l.ev_floor()).collect();
        assert_eq!(floors, vec![0.01, -1.5, -2.5, -4.0]);
        assert_eq!(AggroLevel::try_from(3u8), Ok(AggroLevel::SmartAggressive));
        assert!(AggroLevel::try_from(4u8).is_err());
    }

    #[test]
    fn triple_confirmation_lists_failures() {
        let ok = TripleInputs {
            momentum_last5: 60.0,
            pressure_index: 70.0,
            pattern_break:  PatternBreak::None,
            time_bomb:      true,
            shadow_xg:      0.1,
            coherence:      Coherence::Neutral,
            tempo:          Level::High,
            odd:            1.9,
            min_odd:        1.6,
            risk_map:       RiskMap::Chaotic,
        };
        assert!(triple_confirmation(&ok).is_empty());

        let slow = TripleInputs { tempo: Level::Low, coherence: Coherence::ScriptBroken, ..ok };
        assert_eq!(triple_confirmation(&slow), vec!["roteiro rompido", "ritmo baixo"]);
    }
}
