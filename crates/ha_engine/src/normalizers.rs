//! Statistic normalizers: raw box-score numbers into bounded scores.
//!
//! Every function here is pure. Negative inputs are treated as zero so the
//! documented output intervals hold for any `f64` a caller can build.

use crate::thresholds::{PRESSURE_HOT_MOMENT, SHADOW_XG_CAP};
use serde::{Deserialize, Serialize};

pub(crate) fn clamp100(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

fn capped_share(value: f64, full: f64, weight: f64) -> f64 {
    (value.max(0.0) / full).min(1.0) * weight
}

/// RDS: shots 25, on target 30, possession 20, dangerous attacks 15 and
/// xG 10 points. Each term saturates at its weight; result in [0, 100].
pub fn dominance_score(
    shots_total:       f64,
    shots_on_target:   f64,
    possession:        f64,
    dangerous_attacks: f64,
    xg:                Option<f64>,
) -> f64 {
    let mut rds = capped_share(shots_total, 20.0, 25.0)
        + capped_share(shots_on_target, 10.0, 30.0)
        + capped_share(possession, 100.0, 20.0)
        + capped_share(dangerous_attacks, 50.0, 15.0);

    rds += match xg {
        Some(v) if v > 0.0 => capped_share(v, 3.0, 10.0),
        // no xG: on-target volume carries the slot
        _ => capped_share(shots_on_target, 10.0, 10.0),
    };

    clamp100(rds)
}

/// Unconverted danger not captured by reported xG, in [0, 1.5].
pub fn shadow_xg(dangerous_attacks: f64, corners: f64, shots_on_target: f64, xg: Option<f64>) -> f64 {
    let mut shadow = dangerous_attacks.max(0.0) / 50.0 * 0.3;

    if corners >= 5.0 {
        shadow += 0.2;
    }

    // many shots on target for very little xG: chances the model undervalues
    if let Some(v) = xg.filter(|v| *v > 0.0) {
        if shots_on_target > 0.0 && v / shots_on_target < 0.1 {
            shadow += 0.15;
        }
    }

    shadow.min(SHADOW_XG_CAP)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Neutral,
    Falling,
}

impl Trend {
    pub fn label(&self) -> &'static str {
        match self {
            Trend::Rising  => "crescendo",
            Trend::Neutral => "neutro",
            Trend::Falling => "caindo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Momentum {
    pub last5:  f64,
    pub last10: f64,
    pub last15: f64,
    pub trend:  Trend,
}

fn window_score(attacks: f64, shots: f64, possession: f64, window: f64) -> f64 {
    let attacks_norm = attacks.max(0.0) / window * 5.0;
    let shots_norm = shots.max(0.0) / window * 3.0;
    let possession_norm = possession.max(0.0) / 100.0;
    clamp100((attacks_norm * 0.4 + shots_norm * 0.4 + possession_norm * 0.2) * 100.0)
}

fn trend_of(last5: f64, last10: f64, last15: f64) -> Trend {
    if last5 > last10 && last10 > last15 {
        Trend::Rising
    } else if last5 < last10 && last10 < last15 {
        Trend::Falling
    } else {
        Trend::Neutral
    }
}

/// Three simulated windows from cumulative totals. With one cumulative
/// snapshot the 5 and 10 windows scale identically.
pub fn momentum(dangerous_attacks: f64, shots_on_target: f64, possession: f64) -> Momentum {
    let last5 = window_score(dangerous_attacks * 0.3, shots_on_target * 0.3, possession, 5.0);
    let last10 = window_score(dangerous_attacks * 0.6, shots_on_target * 0.6, possession, 10.0);
    let last15 = window_score(dangerous_attacks, shots_on_target, possession, 15.0);

    Momentum { last5, last10, last15, trend: trend_of(last5, last10, last15) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pressure {
    pub index:      f64,
    pub hot_moment: bool,
    pub occasions:  Vec<String>,
}

/// Additive point buckets capped at 100.
pub fn pressure_index(shots_on_target: f64, dangerous_attacks: f64, xg: Option<f64>) -> Pressure {
    let mut index = 0.0;
    let mut occasions = Vec::new();

    if shots_on_target >= 5.0 {
        index += 30.0;
        occasions.push(format!("{shots_on_target:.0} finalizações no alvo"));
    }
    if dangerous_attacks >= 30.0 {
        index += 25.0;
        occasions.push(format!("{dangerous_attacks:.0} ataques perigosos"));
    }
    if let Some(v) = xg.filter(|v| *v >= 1.5) {
        index += 25.0;
        occasions.push(format!("xG de {v:.2}"));
    }
    if dangerous_attacks >= 40.0 {
        index += 20.0;
        occasions.push("Sequência de ataques seguidos".to_string());
    }

    let index = f64::min(100.0, index);
    Pressure { index, hot_moment: index >= PRESSURE_HOT_MOMENT, occasions }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinutePhase {
    #[serde(rename = "1-45")]
    FirstHalf,
    #[serde(rename = "46-60")]
    Early,
    #[serde(rename = "61-75")]
    Middle,
    #[serde(rename = "76+")]
    Late,
}

impl MinutePhase {
    pub fn label(&self) -> &'static str {
        match self {
            MinutePhase::FirstHalf => "1-45",
            MinutePhase::Early     => "46-60",
            MinutePhase::Middle    => "61-75",
            MinutePhase::Late      => "76+",
        }
    }
}

pub fn minute_phase(minute: u32) -> MinutePhase {
    match minute {
        0..=45  => MinutePhase::FirstHalf,
        46..=60 => MinutePhase::Early,
        61..=75 => MinutePhase::Middle,
        _       => MinutePhase::Late,
    }
}

/// xG per shot; 0.5 when either side of the ratio is unknown.
pub fn shot_quality_index(shots_total: f64, xg: Option<f64>) -> f64 {
    match xg {
        Some(v) if v > 0.0 && shots_total > 0.0 => v / shots_total,
        _ => 0.5,
    }
}

/// How likely the favourite is to concede late.
pub fn fragility(favourite_leading: bool, minute: u32) -> f64 {
    let mut value = 30.0;
    if favourite_leading && minute >= 75 {
        value += 20.0;
    }
    f64::min(100.0, value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    Consistent,
    Volatile,
}

impl Stability {
    pub fn label(&self) -> &'static str {
        match self {
            Stability::Consistent => "consistente",
            Stability::Volatile   => "volátil",
        }
    }
}

/// Temporal dynamics of the underdog RDS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tda {
    pub score:      f64,
    pub volatility: f64,
    pub trend:      Stability,
}

/// `trend` is the ordered RDS history. Fewer than two points carry no
/// progression, so the read is volatile with the neutral score.
pub fn tda(current: f64, previous: f64, trend: &[f64]) -> Tda {
    if trend.len() < 2 {
        return Tda { score: 50.0, volatility: 0.0, trend: Stability::Volatile };
    }
    let change = current - previous;
    let volatility = trend.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>() / (trend.len() - 1) as f64;

    let consistent = volatility < 10.0 && change >= 0.0;
    let score = if consistent && change > 5.0 {
        85.0
    } else if consistent {
        70.0
    } else if volatility > 20.0 {
        30.0
    } else {
        50.0
    };

    Tda {
        score,
        volatility,
        trend: if consistent { Stability::Consistent } else { Stability::Volatile },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn label(&self) -> &'static str {
        match self {
            Level::Low    => "baixo",
            Level::Medium => "médio",
            Level::High   => "alto",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    pub value:           f64,
    pub speed:           Level,
    pub volatility_risk: f64,
}

pub fn game_tempo(total_shots: f64, dangerous_attacks: f64, fouls: f64) -> Tempo {
    let value = total_shots + dangerous_attacks * 0.5 - fouls * 0.3;
    let (speed, volatility_risk) = if value > 50.0 {
        (Level::High, 70.0)
    } else if value > 30.0 {
        (Level::Medium, 40.0)
    } else {
        (Level::Low, 20.0)
    };
    Tempo { value, speed, volatility_risk }
}

/// Expected reversal probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Erp {
    pub probability: f64,
    pub impact:      Level,
    pub factors:     Vec<String>,
}

/// `favourite_trend` is the favourite's RDS history, oldest first.
pub fn erp(favourite_rds: f64, underdog_rds: f64, minute: u32, favourite_trend: &[f64], fragility: f64) -> Erp {
    let mut probability = 0.0;
    let mut factors = Vec::new();

    if let [.., before, last] = favourite_trend {
        if last - before < -5.0 {
            probability += 20.0;
            factors.push("Favorito perdendo intensidade".to_string());
        }
    }

    if underdog_rds > favourite_rds {
        probability += 25.0;
        factors.push("Underdog dominando estatisticamente".to_string());
    } else if underdog_rds >= favourite_rds * 0.8 {
        probability += 15.0;
        factors.push("Underdog competitivo".to_string());
    }

    if minute >= 70 {
        probability += 10.0;
        factors.push("Minutos finais - maior imprevisibilidade".to_string());
    }

    if fragility > 60.0 {
        probability += 20.0;
        factors.push("Favorito frágil".to_string());
    }

    if underdog_rds > 70.0 && favourite_rds < 60.0 {
        probability += 15.0;
        factors.push("Inversão clara de domínio".to_string());
    }

    let probability = f64::min(100.0, probability);
    let impact = if probability >= 60.0 {
        Level::High
    } else if probability >= 35.0 {
        Level::Medium
    } else {
        Level::Low
    };

    Erp { probability, impact, factors }
}

/// Score context for the HA+ side; later rules overwrite earlier ones.
pub fn score_context(score_diff: i32, minute: u32, underdog_rds: f64) -> f64 {
    let mut context = 50.0;
    if score_diff == 1 && underdog_rds >= 65.0 {
        context = 80.0;
    }
    if score_diff == 0 && underdog_rds < 50.0 {
        context = 60.0;
    }
    if score_diff >= 2 && minute >= 70 {
        context = 30.0;
    }
    if score_diff == 0 && underdog_rds >= 60.0 {
        context = 75.0;
    }
    context
}

/// At least two of: few goals, dominant underdog, underdog outshooting.
pub fn ha_friendly(total_goals: u32, underdog_rds: f64, underdog_sot_ratio: f64) -> bool {
    let conditions = [total_goals <= 2, underdog_rds >= 75.0, underdog_sot_ratio >= 0.7];
    conditions.iter().filter(|c| **c).count() >= 2
}

/// Whether odd, line, minute and score make sense together, in [0, 100].
pub fn odd_line_coherence(line: f64, odd: f64, minute: u32, score_diff: i32) -> f64 {
    let mut coherence: f64 = 100.0;

    if odd < 1.5 {
        coherence -= 30.0;
    } else if odd > 2.8 {
        coherence -= 20.0;
    }
    if minute >= 75 && line < 1.0 {
        coherence -= 15.0;
    }
    if score_diff >= 2 && line < 1.5 {
        coherence -= 25.0;
    }

    coherence.max(0.0)
}
