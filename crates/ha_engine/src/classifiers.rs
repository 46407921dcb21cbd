//! Situational classifiers: normalized scores into categorical states.

use crate::snapshot::{HalfTimeSnapshot, MatchStatSnapshot};
use crate::thresholds::{DEAD_GAME_MIN_SCORE, TIME_BOMB_MIN_SCORE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskMap {
    Explosive,
    Controlled,
    Chaotic,
    Locked,
    Dead,
}

impl RiskMap {
    pub fn label(&self) -> &'static str {
        match self {
            RiskMap::Explosive  => "EXPLOSIVE",
            RiskMap::Controlled => "CONTROLLED",
            RiskMap::Chaotic    => "CHAOTIC",
            RiskMap::Locked     => "LOCKED",
            RiskMap::Dead       => "DEAD",
        }
    }

    /// Volatile maps where goals come in bursts.
    pub fn is_volatile(&self) -> bool {
        matches!(self, RiskMap::Explosive | RiskMap::Chaotic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    pub total_shots:       f64,
    pub dangerous_attacks: f64,
    pub total_xg:          f64,
    pub rds_home:          f64,
    pub rds_away:          f64,
    /// Home goals minus away goals.
    pub score_diff:        i32,
}

impl RiskInputs {
    fn rds_balance(&self) -> f64 {
        (self.rds_home - self.rds_away).abs()
    }
}

type RiskRule = (RiskMap, fn(&RiskInputs) -> bool);

/// Evaluated top to bottom; first match wins.
const RISK_RULES: &[RiskRule] = &[
    (RiskMap::Dead,       |i| i.total_xg < 0.5 && i.total_shots < 10.0),
    (RiskMap::Explosive,  |i| i.total_xg >= 3.0 && i.dangerous_attacks >= 60.0),
    (RiskMap::Controlled, |i| i.rds_balance() > 25.0 && i.score_diff >= 1),
    (RiskMap::Chaotic,    |i| i.total_shots >= 25.0 && i.rds_balance() < 10.0),
];

pub fn classify_risk_map(inputs: &RiskInputs) -> RiskMap {
    RISK_RULES
        .iter()
        .find(|(_, rule)| rule(inputs))
        .map(|(map, _)| *map)
        .unwrap_or(RiskMap::Locked)
}

/// Accumulated stagnation score.
pub fn dead_game_score(xg_home: f64, xg_away: f64, total_shots: f64, possession: f64, minute: u32) -> u32 {
    let mut score = 0;
    if xg_home + xg_away < 0.5 {
        score += 3;
    }
    if total_shots < 8.0 && minute >= 60 {
        score += 2;
    }
    if (possession - 50.0).abs() < 10.0 {
        score += 1;
    }
    if total_shots < 10.0 && minute >= 70 {
        score += 2;
    }
    score
}

pub fn detect_dead_game(xg_home: f64, xg_away: f64, total_shots: f64, possession: f64, minute: u32) -> bool {
    dead_game_score(xg_home, xg_away, total_shots, possession, minute) >= DEAD_GAME_MIN_SCORE
}

/// Accumulated unreleased-goal-pressure score.
pub fn time_bomb_score(xg: f64, shadow_xg: f64, pressure_index: f64, corners: f64) -> u32 {
    let mut score = 0;
    if xg >= 1.5 {
        score += 3;
    }
    if shadow_xg >= 0.5 {
        score += 2;
    }
    if pressure_index >= 70.0 {
        score += 3;
    }
    if corners >= 6.0 {
        score += 2;
    }
    score
}

pub fn detect_time_bomb(xg: f64, shadow_xg: f64, pressure_index: f64, corners: f64) -> bool {
    time_bomb_score(xg, shadow_xg, pressure_index, corners) >= TIME_BOMB_MIN_SCORE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternBreak {
    None,
    Mild,
    Strong,
}

impl PatternBreak {
    pub fn label(&self) -> &'static str {
        match self {
            PatternBreak::None   => "nenhum",
            PatternBreak::Mild   => "leve",
            PatternBreak::Strong => "forte",
        }
    }
}

fn tier(delta: f64, high: f64, high_points: u32, low: f64) -> u32 {
    if delta > high {
        high_points
    } else if delta > low {
        1
    } else {
        0
    }
}

/// Compares the away side now against its half-time read.
pub fn detect_pattern_break(
    half_time:          Option<&HalfTimeSnapshot>,
    current_rds:        f64,
    current_shots:      f64,
    current_possession: f64,
) -> PatternBreak {
    let Some(ht) = half_time else {
        return PatternBreak::None;
    };

    let score = tier((current_rds - ht.rds_away).abs(), 30.0, 3, 15.0)
        + tier((current_shots - ht.stats.away.shots_total as f64).abs(), 8.0, 2, 4.0)
        + tier((current_possession - ht.stats.away.possession).abs(), 20.0, 2, 10.0);

    match score {
        s if s >= 5 => PatternBreak::Strong,
        s if s >= 2 => PatternBreak::Mild,
        _ => PatternBreak::None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Coherence {
    ScriptConfirmed,
    Neutral,
    ScriptBroken,
}

impl Coherence {
    pub fn label(&self) -> &'static str {
        match self {
            Coherence::ScriptConfirmed => "ROTEIRO CONFIRMADO",
            Coherence::Neutral         => "NEUTRO",
            Coherence::ScriptBroken    => "ROTEIRO ROMPIDO",
        }
    }
}

fn sot_ratio(stats: &MatchStatSnapshot) -> f64 {
    stats.away.shots_on_target as f64 / (stats.home.shots_on_target as f64 + 0.01)
}

/// Coherence points between the half-time read and the current picture.
pub fn coherence_points(
    half_time:   &HalfTimeSnapshot,
    rds_home:    f64,
    rds_away:    f64,
    current:     &MatchStatSnapshot,
) -> i32 {
    let mut points = 0;

    let ht_away_favoured = half_time.rds_away - half_time.rds_home > 10.0;
    let now_away_favoured = rds_away - rds_home > 10.0;
    points += if ht_away_favoured == now_away_favoured { 3 } else { -2 };

    if (sot_ratio(&half_time.stats) - sot_ratio(current)).abs() < 0.2 {
        points += 2;
    }

    let ht_possession = half_time.stats.away.possession - half_time.stats.home.possession;
    let now_possession = current.away.possession - current.home.possession;
    if (ht_possession > 0.0 && now_possession > 0.0) || (ht_possession < 0.0 && now_possession < 0.0) {
        points += 1;
    }

    if half_time.underdog_score >= 60.0 && rds_away >= 60.0 {
        points += 2;
    }

    points
}

/// HT→FT coherence; neutral when the first half was never read.
pub fn compare_half_to_full_time(
    half_time: Option<&HalfTimeSnapshot>,
    rds_home:  f64,
    rds_away:  f64,
    current:   &MatchStatSnapshot,
) -> Coherence {
    let Some(ht) = half_time else {
        return Coherence::Neutral;
    };

    match coherence_points(ht, rds_home, rds_away, current) {
        p if p >= 5 => Coherence::ScriptConfirmed,
        p if p >= 2 => Coherence::Neutral,
        _ => Coherence::ScriptBroken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::TeamStats;
    use chrono::Utc;

    fn inputs(total_shots: f64, da: f64, xg: f64, rds_home: f64, rds_away: f64, score_diff: i32) -> RiskInputs {
        RiskInputs { total_shots, dangerous_attacks: da, total_xg: xg, rds_home, rds_away, score_diff }
    }

    #[test]
    fn risk_map_rules_in_order() {
        assert_eq!(classify_risk_map(&inputs(5.0, 10.0, 0.2, 50.0, 50.0, 0)), RiskMap::Dead);
        // dead takes precedence over everything else
        assert_eq!(classify_risk_map(&inputs(5.0, 100.0, 0.4, 90.0, 10.0, 3)), RiskMap::Dead);
        assert_eq!(classify_risk_map(&inputs(30.0, 70.0, 3.2, 50.0, 50.0, 0)), RiskMap::Explosive);
        assert_eq!(classify_risk_map(&inputs(14.0, 30.0, 1.0, 70.0, 30.0, 1)), RiskMap::Controlled);
        assert_eq!(classify_risk_map(&inputs(26.0, 30.0, 1.0, 55.0, 50.0, 0)), RiskMap::Chaotic);
        assert_eq!(classify_risk_map(&inputs(14.0, 30.0, 1.0, 55.0, 40.0, 0)), RiskMap::Locked);
    }

    #[test]
    fn time_bomb_threshold() {
        assert!(detect_time_bomb(1.6, 0.55, 75.0, 7.0));
        assert_eq!(time_bomb_score(1.6, 0.55, 75.0, 7.0), 10);
        // 3 + 2 = 5, one short
        assert!(!detect_time_bomb(1.6, 0.55, 10.0, 0.0));
    }

    #[test]
    fn dead_game_threshold() {
        // 3 + 2 + 1 + 2
        assert!(detect_dead_game(0.1, 0.1, 6.0, 52.0, 75));
        // only the xG bucket and passive possession
        assert!(!detect_dead_game(0.1, 0.1, 12.0, 55.0, 75));
    }

    fn ht(home: TeamStats, away: TeamStats) -> HalfTimeSnapshot {
        HalfTimeSnapshot::capture(
            MatchStatSnapshot {
                fixture_id: 1,
                home_team: "Casa".into(),
                away_team: "Fora".into(),
                minute: 45,
                home,
                away,
            },
            Utc::now(),
        )
    }

    #[test]
    fn pattern_break_requires_snapshot() {
        assert_eq!(detect_pattern_break(None, 90.0, 30.0, 80.0), PatternBreak::None);
    }

    #[test]
    fn pattern_break_tiers() {
        let away = TeamStats { shots_total: 4, possession: 40.0, ..TeamStats::default() };
        let snap = ht(TeamStats::default(), away);
        let rds = snap.rds_away;

        assert_eq!(detect_pattern_break(Some(&snap), rds, 4.0, 40.0), PatternBreak::None);
        // shots +5 and possession +11: 1 + 1
        assert_eq!(detect_pattern_break(Some(&snap), rds, 9.0, 51.0), PatternBreak::Mild);
        // rds +31, shots +9: 3 + 2
        assert_eq!(detect_pattern_break(Some(&snap), rds + 31.0, 13.0, 40.0), PatternBreak::Strong);
    }

    #[test]
    fn coherence_neutral_without_snapshot() {
        let current = ht(TeamStats::default(), TeamStats::default()).stats;
        assert_eq!(compare_half_to_full_time(None, 50.0, 50.0, &current), Coherence::Neutral);
    }
}
