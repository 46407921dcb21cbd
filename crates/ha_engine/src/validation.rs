//! Input validation at the boundary. Nothing is computed from rejected input.

use crate::thresholds::{ODD_MAX, ODD_MIN};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} não informado")]
    Missing(&'static str),
    #[error("Odd {label} inválida ({value:.2}, deve ser > 1)")]
    InvalidOdd { label: &'static str, value: f64 },
    #[error("Odd do HA+ {0:.2} fora do padrão profissional ({ODD_MIN:.2} – {ODD_MAX:.2})")]
    OddOutOfRange(f64),
    #[error("Forma {0} inválida (use apenas V, E, D)")]
    InvalidForm(&'static str),
    #[error("Forma {0} muito longa (máximo 10 jogos)")]
    FormTooLong(&'static str),
    #[error("Odds inconsistentes (margem da casa: {0:.1}% - esperado: 100-120%)")]
    InconsistentMargin(f64),
    #[error("Formato da linha HA+ inválido: {0:?} (use +0.5, +1.0, etc.)")]
    InvalidLine(String),
    #[error("Minuto inválido ({0}, deve estar entre 0 e 120)")]
    InvalidMinute(i64),
}

/// Every rule that failed, in check order.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    fn into_result(errors: Vec<ValidationError>) -> Result<(), ValidationErrors> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

fn form_regex() -> &'static Regex {
    static FORM: OnceLock<Regex> = OnceLock::new();
    FORM.get_or_init(|| Regex::new(r"^[VED]*$").expect("static regex"))
}

fn line_regex() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| Regex::new(r"^\+\d+(\.\d+)?$").expect("static regex"))
}

/// Pre-game form and odds as typed by the user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameData {
    pub home_team: String,
    pub away_team: String,
    pub league:    String,
    pub home_odd:  f64,
    pub draw_odd:  f64,
    pub away_odd:  f64,
    pub home_form: String,
    pub away_form: String,
}

/// Bookmaker margin of a 1X2 market, percent.
pub fn bookmaker_margin(home: f64, draw: f64, away: f64) -> f64 {
    (1.0 / home + 1.0 / draw + 1.0 / away) * 100.0
}

fn check_form(errors: &mut Vec<ValidationError>, form: &str, side: &'static str) {
    if !form_regex().is_match(form) {
        errors.push(ValidationError::InvalidForm(side));
    }
    if form.chars().count() > 10 {
        errors.push(ValidationError::FormTooLong(side));
    }
}

pub fn validate_game_data(data: &GameData) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    for (value, label) in [
        (&data.home_team, "Time mandante"),
        (&data.away_team, "Time visitante"),
        (&data.league, "Liga"),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::Missing(label));
        }
    }

    for (value, label) in [
        (data.home_odd, "do mandante"),
        (data.draw_odd, "do empate"),
        (data.away_odd, "do visitante"),
    ] {
        if !(value > 1.0) {
            errors.push(ValidationError::InvalidOdd { label, value });
        }
    }

    check_form(&mut errors, &data.home_form, "do mandante");
    check_form(&mut errors, &data.away_form, "do visitante");

    if data.home_odd > 0.0 && data.draw_odd > 0.0 && data.away_odd > 0.0 {
        let margin = bookmaker_margin(data.home_odd, data.draw_odd, data.away_odd);
        if !(100.0..=120.0).contains(&margin) {
            errors.push(ValidationError::InconsistentMargin(margin));
        }
    }

    ValidationErrors::into_result(errors)
}

pub fn validate_line(line: &str) -> Result<(), ValidationError> {
    if line_regex().is_match(line.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidLine(line.to_string()))
    }
}

/// HA odd of a live entry: above 1 and inside the professional range.
pub fn validate_ha_odd(odd: f64) -> Result<(), ValidationError> {
    if !(odd > 1.0) {
        return Err(ValidationError::InvalidOdd { label: "do HA+", value: odd });
    }
    if !(ODD_MIN..=ODD_MAX).contains(&odd) {
        return Err(ValidationError::OddOutOfRange(odd));
    }
    Ok(())
}

pub fn validate_live_input(team: &str, line: &str, odd: f64, minute: i64) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if team.trim().is_empty() {
        errors.push(ValidationError::Missing("Nome do time"));
    }
    if line.trim().is_empty() {
        errors.push(ValidationError::Missing("Linha do HA+"));
    } else if let Err(e) = validate_line(line) {
        errors.push(e);
    }
    if let Err(e) = validate_ha_odd(odd) {
        errors.push(e);
    }
    if !(0..=120).contains(&minute) {
        errors.push(ValidationError::InvalidMinute(minute));
    }

    ValidationErrors::into_result(errors)
}
