//! Mirror check: matches the live picture against known HA+ archetypes.

use crate::classifiers::{PatternBreak, RiskMap};
use crate::normalizers::{shot_quality_index, Trend};
use crate::snapshot::{HalfTimeSnapshot, MatchStatSnapshot};
use crate::thresholds::MIRROR_ACTIVATION;
use serde::{Deserialize, Serialize};

pub struct MirrorInputs<'a> {
    pub current:        &'a MatchStatSnapshot,
    pub half_time:      Option<&'a HalfTimeSnapshot>,
    pub rds_home:       f64,
    pub rds_away:       f64,
    pub trend:          Trend,
    pub risk_map:       RiskMap,
    pub pattern_break:  PatternBreak,
}

type Check = fn(&MirrorInputs) -> bool;

struct Archetype {
    label:  &'static str,
    checks: &'static [Check],
}

const ARCHETYPES: &[Archetype] = &[
    Archetype {
        label: "Underdog Resiliente",
        checks: &[
            |m| m.half_time.is_some_and(|ht| ht.underdog_score >= 55.0),
            |m| m.rds_away >= 55.0,
            |m| m.current.score_diff() <= 0,
            |m| m.current.away.red_cards == 0,
        ],
    },
    Archetype {
        label: "Favorito Estéril",
        checks: &[
            |m| m.current.home.shots_total >= 12,
            |m| shot_quality_index(m.current.home.shots_total as f64, m.current.home.xg) < 0.08,
            |m| m.current.home.shots_on_target <= 4,
            |m| m.current.score_diff() <= 1,
        ],
    },
    Archetype {
        label: "Bloco Baixo Sólido",
        checks: &[
            |m| m.current.away.possession < 40.0,
            |m| m.current.home.shots_on_target <= 3,
            |m| m.risk_map == RiskMap::Locked,
            |m| m.current.score_diff() <= 0,
        ],
    },
    Archetype {
        label: "Jogo Espelhado",
        checks: &[
            |m| (m.rds_home - m.rds_away).abs() < 10.0,
            |m| m.half_time.is_some_and(|ht| ht.dominance < 10.0),
            |m| (m.current.home.possession - m.current.away.possession).abs() < 10.0,
            |m| m.pattern_break == PatternBreak::None,
        ],
    },
    Archetype {
        label: "Pressão Crescente do Visitante",
        checks: &[
            |m| m.trend == Trend::Rising,
            |m| m.half_time.is_some_and(|ht| {
                m.current.away.shots_on_target >= ht.stats.away.shots_on_target + 2
            }),
            |m| m.half_time.is_some_and(|ht| m.rds_away > ht.rds_away),
            |m| m.current.away.dangerous_attacks > m.current.home.dangerous_attacks,
        ],
    },
    Archetype {
        label: "Contra-Ataque Letal",
        checks: &[
            |m| m.current.away.possession < 45.0,
            |m| m.current.away.shots_on_target >= 4,
            |m| m.current.away.xg_or_zero() >= 0.8,
            |m| m.current.away.shots_on_target >= m.current.home.shots_on_target,
        ],
    },
    Archetype {
        label: "Favorito Cansado",
        checks: &[
            |m| m.half_time.is_some_and(|ht| m.rds_home <= ht.rds_home - 15.0),
            |m| m.half_time.is_some_and(|ht| m.rds_away >= ht.rds_away),
            |m| m.current.minute >= 60,
            |m| m.half_time.is_some_and(|ht| {
                m.current.home.shots_total <= ht.stats.home.shots_total + 3
            }),
        ],
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorCheck {
    pub active:          bool,
    /// Best archetype match, 0..=1.
    pub match_score:     f64,
    /// Set only when the check is active.
    pub archetype_label: Option<String>,
}

impl MirrorCheck {
    /// Confidence bonus granted by an active match.
    pub fn bonus(&self) -> f64 {
        if self.active {
            (self.match_score * 6.0).round()
        } else {
            0.0
        }
    }
}

pub fn check_mirror_pattern(inputs: &MirrorInputs) -> MirrorCheck {
    let mut best: Option<(&'static str, f64)> = None;

    for archetype in ARCHETYPES {
        let hits = archetype.checks.iter().filter(|check| check(inputs)).count();
        let score = hits as f64 / archetype.checks.len() as f64;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((archetype.label, score));
        }
    }

    match best {
        Some((label, score)) if score >= MIRROR_ACTIVATION => MirrorCheck {
            active:          true,
            match_score:     score,
            archetype_label: Some(label.to_string()),
        },
        Some((_, score)) => MirrorCheck { active: false, match_score: score, archetype_label: None },
        None => MirrorCheck { active: false, match_score: 0.0, archetype_label: None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::TeamStats;

    fn snapshot(home: TeamStats, away: TeamStats, minute: u32) -> MatchStatSnapshot {
        MatchStatSnapshot {
            fixture_id: 9,
            home_team: "Flamengo".into(),
            away_team: "Bragantino".into(),
            minute,
            home,
            away,
        }
    }

    #[test]
    fn counter_attack_archetype_activates() {
        let current = snapshot(
            TeamStats { possession: 62.0, shots_on_target: 4, shots_total: 9, ..TeamStats::default() },
            TeamStats { possession: 38.0, shots_on_target: 5, xg: Some(1.1), ..TeamStats::default() },
            65,
        );
        let check = check_mirror_pattern(&MirrorInputs {
            current:       &current,
            half_time:     None,
            rds_home:      current.home.dominance(),
            rds_away:      current.away.dominance(),
            trend:         Trend::Neutral,
            risk_map:      RiskMap::Locked,
            pattern_break: PatternBreak::None,
        });

        assert!(check.active, "{check:?}");
        assert_eq!(check.match_score, 1.0);
        assert_eq!(check.archetype_label.as_deref(), Some("Contra-Ataque Letal"));
        assert_eq!(check.bonus(), 6.0);
    }

    #[test]
    fn weak_match_stays_inactive() {
        let current = snapshot(
            TeamStats { possession: 50.0, shots_on_target: 6, shots_total: 8, ..TeamStats::default() },
            TeamStats { possession: 50.0, red_cards: 1, ..TeamStats::default() },
            30,
        );
        let check = check_mirror_pattern(&MirrorInputs {
            current:       &current,
            half_time:     None,
            rds_home:      80.0,
            rds_away:      10.0,
            trend:         Trend::Falling,
            risk_map:      RiskMap::Chaotic,
            pattern_break: PatternBreak::Mild,
        });

        assert!(!check.active);
        assert!(check.match_score < MIRROR_ACTIVATION);
        assert_eq!(check.bonus(), 0.0);
    }
}
