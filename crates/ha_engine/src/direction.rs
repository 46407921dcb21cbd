//! Post-match settlement of an HA+ pick.

use crate::composer::NO_BET_HANDICAP;
use crate::shield::HandicapLine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Correta,
    Errada,
    Variancia,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidePair {
    pub home: u32,
    pub away: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullTimeData {
    /// e.g. `"2-1"`, home first.
    pub final_score:        String,
    #[serde(default)]
    pub shots:              SidePair,
    #[serde(default)]
    pub dangerous_attacks:  SidePair,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionReport {
    pub result:  Direction,
    pub message: String,
    pub details: Vec<String>,
}

/// Parses `"h-a"` into (home, away).
pub fn parse_score(score: &str) -> Option<(u32, u32)> {
    let (h, a) = score.split_once('-')?;
    Some((h.trim().parse().ok()?, a.trim().parse().ok()?))
}

/// Settles a pick on the away side. The whole-goal part of the line is the
/// margin the favourite may win by; split lines lose half one goal beyond it.
pub fn evaluate_direction(line: HandicapLine, recommendation: &str, ft: &FullTimeData) -> Option<DirectionReport> {
    let (home, away) = parse_score(&ft.final_score)?;
    let diff = home as i64 - away as i64;
    let mut details = vec![
        format!("Placar final: {}", ft.final_score),
        format!("Linha HA+: {line}"),
        format!("Diferença de gols: {diff:+}"),
    ];

    if recommendation.contains(NO_BET_HANDICAP) {
        details.push("Sistema recomendou NÃO APOSTAR - avaliação de direção não aplicável".to_string());
        return Some(DirectionReport {
            result: Direction::Variancia,
            message: "Sistema vetou a aposta - direção não avaliada".to_string(),
            details,
        });
    }

    let cushion = line.goals().floor() as i64;
    if line.is_split() && diff == cushion + 1 {
        details.push(format!("HA {line} cobriu parcialmente: perdeu por {diff} (metade do stake)"));
        return Some(DirectionReport {
            result: Direction::Variancia,
            message: "Cobertura parcial (metade do stake) - dentro da variância".to_string(),
            details,
        });
    }

    let total_shots = ft.shots.home + ft.shots.away;
    let away_share = if total_shots > 0 {
        ft.shots.away as f64 / total_shots as f64 * 100.0
    } else {
        0.0
    };
    details.push(format!("Finalizações: {} x {}", ft.shots.home, ft.shots.away));
    details.push(format!("Proporção visitante: {away_share:.1}%"));
    details.push(format!(
        "Ataques perigosos: {} x {}",
        ft.dangerous_attacks.home, ft.dangerous_attacks.away
    ));

    let report = if diff <= cushion {
        DirectionReport {
            result:  Direction::Correta,
            message: format!("✅ Direção CORRETA - HA+ {line} cobriu"),
            details,
        }
    } else if away_share >= 40.0 && diff <= 2 {
        details.push("Jogo foi equilibrado estatisticamente - resultado dentro da variância esperada".to_string());
        DirectionReport {
            result:  Direction::Variancia,
            message: "Resultado adverso mas dentro da variância estatística".to_string(),
            details,
        }
    } else {
        DirectionReport {
            result:  Direction::Errada,
            message: format!("❌ Direção ERRADA - HA+ {line} não cobriu"),
            details,
        }
    };
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ft(score: &str, home_shots: u32, away_shots: u32) -> FullTimeData {
        FullTimeData {
            final_score:       score.into(),
            shots:             SidePair { home: home_shots, away: away_shots },
            dangerous_attacks: SidePair::default(),
        }
    }

    fn settle(line: &str, score: &str, shots: (u32, u32)) -> Direction {
        evaluate_direction(line.parse().unwrap(), "✅ APOSTAR: Bahia", &ft(score, shots.0, shots.1))
            .unwrap()
            .result
    }

    #[test]
    fn coverage_by_line() {
        assert_eq!(settle("+0.5", "1-1", (10, 5)), Direction::Correta);
        assert_eq!(settle("+0.5", "2-1", (20, 5)), Direction::Errada);
        assert_eq!(settle("+1.0", "2-1", (20, 5)), Direction::Correta);
        assert_eq!(settle("+2.0", "3-1", (20, 5)), Direction::Correta);
        assert_eq!(settle("+1.5", "3-0", (20, 2)), Direction::Errada);
    }

    #[test]
    fn split_lines_are_partial_one_goal_beyond() {
        assert_eq!(settle("+0.25", "1-0", (20, 2)), Direction::Variancia);
        assert_eq!(settle("+1.75", "2-0", (20, 2)), Direction::Variancia);
        assert_eq!(settle("+0.75", "2-0", (20, 2)), Direction::Errada);
    }

    #[test]
    fn balanced_loss_is_variance() {
        assert_eq!(settle("+0.5", "2-1", (10, 9)), Direction::Variancia);
    }

    #[test]
    fn no_bet_and_bad_score() {
        let r = evaluate_direction("+1.0".parse().unwrap(), "SEM RECOMENDAÇÃO – NÃO APOSTAR", &ft("4-0", 1, 1)).unwrap();
        assert_eq!(r.result, Direction::Variancia);
        assert!(evaluate_direction("+1.0".parse().unwrap(), "x", &ft("four-nil", 0, 0)).is_none());
    }
}
