//! Pre-game analysis: odds and recent form only, no match statistics.

use crate::composer::{implied_probability, statistical_score, Decision, Mode, Profile, NO_BET};
use crate::shield::HandicapLine;
use crate::thresholds::{ODD_MAX, ODD_MIN};
use crate::validation::{validate_game_data, validate_ha_odd, validate_line, GameData, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct PregameInput {
    #[serde(flatten)]
    pub game:    GameData,
    pub ha_line: String,
    pub ha_odd:  f64,
    #[serde(default)]
    pub mode:    Mode,
    #[serde(default)]
    pub profile: Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PregameRedFlag {
    pub severity: Severity,
    pub message:  String,
}

pub fn pregame_red_flags(home_odd: f64, away_odd: f64) -> Vec<PregameRedFlag> {
    let mut flags = Vec::new();

    if away_odd < 1.5 {
        flags.push(PregameRedFlag {
            severity: Severity::Critical,
            message:  format!("Visitante é favorito (odd {away_odd:.2}) - não é underdog real"),
        });
    }
    if home_odd < 1.3 {
        flags.push(PregameRedFlag {
            severity: Severity::Moderate,
            message:  format!("Mandante favorito esmagador (odd {home_odd:.2}) - cenário difícil para HA+"),
        });
    }
    let ratio = home_odd / away_odd;
    if ratio < 0.4 {
        flags.push(PregameRedFlag {
            severity: Severity::Critical,
            message:  format!("Favorito muito forte (ratio de odds: {ratio:.2}) - risco alto para HA+"),
        });
    }

    flags
}

/// Why an odd looks mispriced, if it does.
pub fn odd_bugada(odd: f64, real_probability: f64) -> Option<String> {
    if odd < ODD_MIN {
        return Some(format!("Odd {odd:.2} está abaixo do mínimo profissional ({ODD_MIN:.2})"));
    }
    if odd > ODD_MAX {
        return Some(format!("Odd {odd:.2} está acima do máximo profissional ({ODD_MAX:.2})"));
    }
    if real_probability > 65.0 && odd > 2.6 {
        return Some(format!(
            "Probabilidade real alta ({real_probability:.1}%) mas odd muito alta ({odd:.2}) - mercado pode estar errado"
        ));
    }
    if real_probability < 35.0 && odd < 1.6 {
        return Some(format!(
            "Probabilidade real baixa ({real_probability:.1}%) mas odd muito baixa ({odd:.2}) - mercado pode estar superestimando"
        ));
    }
    let implied = implied_probability(odd);
    if (real_probability - implied).abs() > 30.0 {
        return Some(format!(
            "Desbalanceamento extremo: probabilidade real {real_probability:.1}% vs implícita {implied:.1}%"
        ));
    }
    None
}

/// Wins among the five most recent results; the form string runs oldest
/// to newest.
pub fn recent_wins(form: &str) -> usize {
    let chars: Vec<char> = form.chars().collect();
    let start = chars.len().saturating_sub(5);
    chars[start..].iter().filter(|c| **c == 'V').count()
}

pub fn pregame_real_probability(ha_odd: f64, away_form: &str) -> f64 {
    let form = recent_wins(away_form) as f64 / 5.0 * 100.0;
    (implied_probability(ha_odd) * 0.6 + form * 0.4).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PregameResult {
    pub home_team:  String,
    pub away_team:  String,
    pub league:     String,
    #[serde(flatten)]
    pub decision:   Decision,
    pub red_flags:  Vec<PregameRedFlag>,
    pub odd_bugada: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub fn analyze_pregame(input: &PregameInput, now: DateTime<Utc>) -> Result<PregameResult, ValidationErrors> {
    let mut errors = match validate_game_data(&input.game) {
        Ok(()) => Vec::new(),
        Err(ValidationErrors(errors)) => errors,
    };
    if let Err(e) = validate_line(&input.ha_line) {
        errors.push(e);
    }
    if let Err(e) = validate_ha_odd(input.ha_odd) {
        errors.push(e);
    }
    let line: Option<HandicapLine> = input.ha_line.trim().parse().ok();
    let Some(line) = line.filter(|_| errors.is_empty()) else {
        return Err(ValidationErrors(errors));
    };

    let g = &input.game;
    let real = pregame_real_probability(input.ha_odd, &g.away_form);
    let implied = implied_probability(input.ha_odd);
    let ev = real - implied;
    let tactical = (real * 0.8 + 20.0).round();
    let statistical = statistical_score(real);
    let confidence = (tactical + statistical) / 2.0;

    let red_flags = pregame_red_flags(g.home_odd, g.away_odd);
    let critical = red_flags.iter().any(|f| f.severity == Severity::Critical);
    let bugada = odd_bugada(input.ha_odd, real);

    let mut justification = Vec::new();
    let (min_confidence, min_ev) = match (input.profile, input.mode) {
        (Profile::UltraConservative, Mode::Real) => (70.0, 4.0),
        _ => (65.0, 3.0),
    };

    let approved = if critical {
        justification.push("🚫 BLOQUEIO ATIVADO POR RED FLAGS CRÍTICAS:".to_string());
        justification.extend(
            red_flags
                .iter()
                .filter(|f| f.severity == Severity::Critical)
                .map(|f| format!("   {}", f.message)),
        );
        false
    } else if confidence >= min_confidence && ev > min_ev {
        justification.push(format!("✅ Confiança ≥ {min_confidence:.0}% e EV > {min_ev:.0}%"));
        true
    } else {
        if min_confidence >= 70.0 {
            justification.push("🛡️ MODO ULTRA CONSERVADOR ATIVO".to_string());
        }
        justification.push(format!("⚠️ Sem edge matemático suficiente (confiança {confidence:.1}%, EV {ev:.2}%)"));
        false
    };

    for flag in red_flags.iter().filter(|f| f.severity == Severity::Moderate) {
        justification.push(format!("🟡 {}", flag.message));
    }
    if let Some(reason) = &bugada {
        justification.push(format!("⚠️ Odd bugada: {reason}"));
    }
    justification.push(format!("Probabilidade Real: {real:.1}%"));
    justification.push(format!("Probabilidade Implícita: {implied:.1}%"));
    justification.push(format!("Score Tático: {tactical:.0}/100"));
    justification.push(format!("Score Estatístico: {statistical:.0}/100"));

    let (recommendation, handicap) = if approved {
        (format!("APOSTAR: Visitante {line}"), Some(line))
    } else {
        (NO_BET.to_string(), None)
    };

    Ok(PregameResult {
        home_team: g.home_team.clone(),
        away_team: g.away_team.clone(),
        league: g.league.clone(),
        decision: Decision {
            recommendation,
            handicap,
            odd: input.ha_odd,
            ev,
            confidence: if critical { 0.0 } else { confidence },
            real_probability: real,
            tactical_score: tactical,
            statistical_score: statistical,
            justification,
        },
        red_flags,
        odd_bugada: bugada,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(away_form: &str, ha_odd: f64) -> PregameInput {
        PregameInput {
            game: GameData {
                home_team: "Internacional".into(),
                away_team: "Juventude".into(),
                league:    "Brasileirão".into(),
                home_odd:  1.70,
                draw_odd:  3.60,
                away_odd:  4.00,
                home_form: "VEVVD".into(),
                away_form: away_form.into(),
            },
            ha_line: "+1.0".into(),
            ha_odd,
            mode:    Mode::Lab,
            profile: Profile::Balanced,
        }
    }

    #[test]
    fn recent_wins_reads_the_tail() {
        assert_eq!(recent_wins("DDDDDVVVVV"), 5);
        assert_eq!(recent_wins("VVVVVDDDDD"), 0);
        assert_eq!(recent_wins("VE"), 1);
    }

    #[test]
    fn strong_form_gets_a_bet() {
        // implied 55.6, form 80: real 65.3
        let r = analyze_pregame(&input("EVVVDV", 1.80), Utc::now()).unwrap();
        assert!(r.decision.recommends(), "{:?}", r.decision.justification);
        assert_eq!(r.decision.recommendation, "APOSTAR: Visitante +1.0");
    }

    #[test]
    fn weak_form_is_no_bet() {
        let r = analyze_pregame(&input("DDDDD", 1.80), Utc::now()).unwrap();
        assert!(!r.decision.recommends());
        assert!(r.decision.ev < 0.0);
    }

    #[test]
    fn critical_flag_blocks() {
        let mut i = input("VVVVV", 1.80);
        i.game.home_odd = 1.15;
        i.game.draw_odd = 7.0;
        i.game.away_odd = 15.0;
        let r = analyze_pregame(&i, Utc::now()).unwrap();
        assert_eq!(r.decision.confidence, 0.0);
        assert!(r.decision.recommendation.contains("NÃO APOSTAR"));
        assert_eq!(r.red_flags.len(), 2);
    }

    #[test]
    fn invalid_line_is_rejected_before_analysis() {
        let mut i = input("VVV", 1.80);
        i.ha_line = "1.0".into();
        assert!(analyze_pregame(&i, Utc::now()).is_err());
    }

    #[test]
    fn odd_bugada_criteria() {
        assert!(odd_bugada(1.30, 50.0).is_some());
        assert!(odd_bugada(2.8, 70.0).is_some());
        assert!(odd_bugada(2.0, 48.0).is_none());
        assert!(odd_bugada(2.0, 85.0).is_some());
    }
}
