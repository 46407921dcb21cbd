//! Handicap shield: line-dependent protection factor, decision regimes,
//! score shield and timing score.

use crate::classifiers::RiskMap;
use crate::normalizers::MinutePhase;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A positive Asian handicap line, stored in quarter-goal steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HandicapLine {
    quarters: u32,
}

impl HandicapLine {
    pub fn from_goals(goals: f64) -> Option<Self> {
        let quarters = goals * 4.0;
        if goals <= 0.0 || !quarters.is_finite() || (quarters - quarters.round()).abs() > 1e-9 {
            return None;
        }
        Some(Self { quarters: quarters.round() as u32 })
    }

    pub fn goals(&self) -> f64 {
        self.quarters as f64 / 4.0
    }

    /// Half-line quarters (+0.25, +0.75 ...) settle half-won/half-lost.
    pub fn is_split(&self) -> bool {
        self.quarters % 2 == 1
    }

    pub fn shield_factor(&self) -> f64 {
        match self.quarters {
            1 => 0.02,
            2 => 0.05,
            3 => 0.07,
            4 => 0.09,
            5 => 0.11,
            6 => 0.13,
            8 => 0.16,
            _ => 0.0,
        }
    }

    pub fn regime(&self) -> Regime {
        match self.quarters {
            1 | 2 => Regime::A,
            5 | 6 | 8 => Regime::C,
            _ => Regime::B,
        }
    }
}

impl FromStr for HandicapLine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        let goals: f64 = digits.parse().map_err(|_| format!("invalid handicap line: {s}"))?;
        Self::from_goals(goals).ok_or_else(|| format!("handicap line must be a positive quarter step: {s}"))
    }
}

impl TryFrom<String> for HandicapLine {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HandicapLine> for String {
    fn from(line: HandicapLine) -> String {
        line.to_string()
    }
}

impl fmt::Display for HandicapLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_split() {
            write!(f, "+{:.2}", self.goals())
        } else {
            write!(f, "+{:.1}", self.goals())
        }
    }
}

/// Probability (0..=1) plus the line's shield, capped at 0.80.
pub fn apply_shield(probability: f64, line: HandicapLine) -> f64 {
    f64::min(0.80, probability + line.shield_factor())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    /// Tight line, +0.25 / +0.5.
    A,
    /// Intermediate line, +0.75 / +1.0 and anything unmapped.
    B,
    /// Heavy shield, +1.25 / +1.5 / +2.0.
    C,
}

impl Regime {
    pub fn name(&self) -> &'static str {
        match self {
            Regime::A => "HA Apertado",
            Regime::B => "HA Intermediário",
            Regime::C => "HA Escudo Pesado",
        }
    }

    pub fn ev_min(&self) -> f64 {
        match self {
            Regime::A => 3.0,
            Regime::B => 0.0,
            Regime::C => -2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeVerdict {
    pub regime:   Regime,
    pub approved: bool,
    pub reason:   String,
}

#[derive(Debug, Clone, Copy)]
pub struct RegimeInputs {
    pub ev:          f64,
    pub ha_friendly: bool,
    pub risk_map:    RiskMap,
    pub shadow_xg:   f64,
    pub locked_game: bool,
}

/// Line-specific approval used by the green light.
pub fn regime_approval(line: HandicapLine, i: &RegimeInputs) -> RegimeVerdict {
    let regime = line.regime();
    let reject = |reason: String| RegimeVerdict { regime, approved: false, reason };

    match regime {
        Regime::A => {
            if i.ev < regime.ev_min() {
                return reject(format!("Regime A: EV insuficiente ({:.1}% < 3%)", i.ev));
            }
            if !i.ha_friendly {
                return reject("Regime A: HA Friendly obrigatório não ativo".to_string());
            }
            if i.risk_map == RiskMap::Dead {
                return reject("Regime A: Risk Map DEAD não permitido".to_string());
            }
        }
        Regime::B => {
            let strong_context = i.shadow_xg < 0.3 && i.risk_map != RiskMap::Chaotic;
            if line.quarters == 4 && (0.0..=3.0).contains(&i.ev) && !strong_context {
                return reject(
                    "Regime B (+1.0): EV baixo requer contexto forte (Shadow xG baixo + jogo não caótico)"
                        .to_string(),
                );
            }
            if i.ev < regime.ev_min() {
                return reject(format!("Regime B: EV insuficiente ({:.1}% < 0%)", i.ev));
            }
            if i.risk_map == RiskMap::Dead {
                return reject("Regime B: Risk Map DEAD não permitido".to_string());
            }
            if i.risk_map == RiskMap::Chaotic && i.shadow_xg > 0.5 {
                return reject("Regime B: Jogo descontrolado com Shadow xG crítico".to_string());
            }
        }
        Regime::C => {
            if line.quarters == 6 && (0.0..=2.0).contains(&i.ev) && (!i.locked_game || i.shadow_xg > 0.4) {
                return reject("Regime C (+1.5): EV baixo requer jogo travado e Shadow xG baixo".to_string());
            }
            if i.ev < regime.ev_min() {
                return reject(format!("Regime C: EV muito negativo ({:.1}% < -2%)", i.ev));
            }
            if i.shadow_xg > 0.6 {
                return reject("Regime C: Shadow xG muito alto - risco elevado mesmo com escudo".to_string());
            }
        }
    }

    RegimeVerdict {
        regime,
        approved: true,
        reason: format!("Regime {regime:?} ({}): critérios atendidos", regime.name()),
    }
}

/// Score shield: the line absorbs a goal while the underdog holds on.
pub fn score_shield(line: HandicapLine, shadow_xg: f64, solid_defence: bool, holding_score: bool) -> bool {
    line.goals() >= 1.0 && ((shadow_xg < 0.3 && solid_defence) || (holding_score && shadow_xg < 0.4))
}

fn phase_base(phase: MinutePhase) -> f64 {
    match phase {
        MinutePhase::FirstHalf => 70.0,
        MinutePhase::Early     => 80.0,
        MinutePhase::Middle    => 65.0,
        MinutePhase::Late      => 40.0,
    }
}

/// How good this moment is to enter at this line, in [0, 100].
pub fn timing_score(phase: MinutePhase, line: HandicapLine, locked_game: bool, no_pressure: bool) -> f64 {
    let mut score = phase_base(phase);
    if line.goals() >= 1.0 && locked_game {
        score += 5.0;
    }
    if line.goals() >= 1.5 && no_pressure {
        score += 10.0;
    }
    f64::min(100.0, score)
}
