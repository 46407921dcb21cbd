//! Radar scoring: a coarse dominance score, the mini filter and the radar /
//! pre-live scores. Pure functions, no I/O.

use football_api::MatchOdds;
use ha_engine::TeamStats;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadarLeague {
    pub id:     u32,
    pub name:   &'static str,
    /// Importance weight applied to the final score.
    pub weight: f64,
}

pub const RADAR_LEAGUES: [RadarLeague; 5] = [
    RadarLeague { id: 71,  name: "Brasileirão A",  weight: 1.00 },
    RadarLeague { id: 72,  name: "Brasileirão B",  weight: 0.95 },
    RadarLeague { id: 73,  name: "Copa do Brasil", weight: 0.85 },
    RadarLeague { id: 128, name: "Argentina A",    weight: 0.80 },
    RadarLeague { id: 266, name: "Uruguai A",      weight: 0.75 },
];

/// Leagues to scan: all of them when `ids` is empty, otherwise the known ones
/// among `ids`.
pub fn select_leagues(ids: &[u32]) -> Vec<RadarLeague> {
    RADAR_LEAGUES
        .iter()
        .filter(|l| ids.is_empty() || ids.contains(&l.id))
        .copied()
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RadarStats {
    pub shots_on_target:   u32,
    pub total_shots:       u32,
    pub possession:        f64,
    pub corners:           u32,
    pub dangerous_attacks: u32,
}

impl From<&TeamStats> for RadarStats {
    fn from(s: &TeamStats) -> Self {
        Self {
            shots_on_target:   s.shots_on_target,
            total_shots:       s.shots_total,
            possession:        s.possession,
            corners:           s.corners,
            dangerous_attacks: s.dangerous_attacks,
        }
    }
}

/// Radar RDS in [0, 100]; a lighter cousin of the engine's dominance score.
pub fn radar_rds(s: &RadarStats) -> f64 {
    let raw = s.shots_on_target as f64 * 2.5 + s.total_shots as f64 + s.possession * 0.8 + s.corners as f64 * 1.2;
    (raw / 150.0 * 100.0).min(100.0).round()
}

fn share(away: u32, home: u32) -> f64 {
    away as f64 / (home as f64 + away as f64 + 0.01)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterResult {
    pub passed:  bool,
    pub reasons: Vec<String>,
}

/// Minimum balance the away side must show before it is scored at all.
pub fn mini_filter(home: &RadarStats, away: &RadarStats, rds_home: f64, rds_away: f64, red_away: u32) -> FilterResult {
    if red_away > 0 {
        return FilterResult { passed: false, reasons: vec!["❌ Expulsão contra o underdog".to_string()] };
    }

    let checks = [
        (rds_away / (rds_home + 0.01) >= 0.80, "✅ RDS ≥ 80% do favorito"),
        (share(away.shots_on_target, home.shots_on_target) >= 0.40, "✅ Finalizações no alvo ≥ 40%"),
        (away.possession / 100.0 >= 0.40, "✅ Posse ≥ 40%"),
        (away.total_shots >= 5 && away.shots_on_target >= 2, "✅ Equilíbrio ofensivo consistente"),
    ];
    let mut reasons: Vec<String> = checks.iter().filter(|(hit, _)| *hit).map(|(_, r)| r.to_string()).collect();
    let passed = !reasons.is_empty();
    if !passed {
        reasons.push("❌ Não atingiu critérios mínimos de equilíbrio".to_string());
    }
    FilterResult { passed, reasons }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarScore {
    pub score:    u32,
    pub gold:     bool,
    pub criteria: Vec<String>,
}

/// Context of the scoreline for the away side, `score_diff` = home − away.
fn score_factor(score_diff: i32) -> (f64, &'static str) {
    match score_diff {
        0 => (80.0, "Placar empatado (favorável)"),
        1 => (65.0, "Perdendo por 1 (aceitável)"),
        -1 => (90.0, "Ganhando por 1 (excelente)"),
        d if d >= 2 => (30.0, "Perdendo por 2+ (arriscado)"),
        _ => (95.0, "Ganhando por 2+ (muito favorável)"),
    }
}

fn minute_factor(minute: u32) -> (f64, &'static str) {
    match minute {
        m if m >= 80 => (40.0, "Minuto ≥ 80 (tempo limitado)"),
        m if m >= 70 => (60.0, "Minuto 70-79 (tempo moderado)"),
        m if m >= 60 => (80.0, "Minuto 60-69 (tempo bom)"),
        _ => (100.0, "Minuto < 60 (tempo suficiente)"),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LiveRadarInputs {
    pub home:       RadarStats,
    pub away:       RadarStats,
    pub rds_home:   f64,
    pub rds_away:   f64,
    pub goals_home: u32,
    pub goals_away: u32,
    pub minute:     u32,
    pub weight:     f64,
    pub odds:       Option<MatchOdds>,
}

pub fn radar_score(i: &LiveRadarInputs) -> RadarScore {
    let mut criteria = Vec::new();

    let balance = (share(i.away.total_shots, i.home.total_shots)
        + share(i.away.shots_on_target, i.home.shots_on_target))
        / 2.0
        * 100.0;
    if balance >= 40.0 {
        criteria.push(format!("Equilíbrio Ofensivo: {balance:.0}%"));
    }

    let rds_factor = (50.0 + i.rds_away - i.rds_home).clamp(0.0, 100.0);
    if rds_factor >= 45.0 {
        criteria.push(format!("RDS Factor: {rds_factor:.0}"));
    }

    let (context, context_label) = score_factor(i.goals_home as i32 - i.goals_away as i32);
    criteria.push(context_label.to_string());
    let (timing, timing_label) = minute_factor(i.minute);
    criteria.push(timing_label.to_string());

    let base = balance * 0.35 + rds_factor * 0.35 + context * 0.20 + timing * 0.10;
    let score = (base * i.weight).round().max(0.0) as u32;

    let away_alive = i.rds_away >= i.rds_home * 0.75 && i.away.shots_on_target >= 2;
    let odds_ok = i.odds.map_or(true, |o| (1.8..=3.5).contains(&o.away));
    let gold = away_alive && i.weight >= 0.80 && odds_ok;
    if gold {
        criteria.push("🏆 GOLD SIGNAL".to_string());
    }

    RadarScore { score, gold, criteria }
}

/// Pre-live score from the 1X2 odds profile only. The favourite is whichever
/// side has the shorter odd.
pub fn pre_live_score(odds: &MatchOdds, weight: f64) -> RadarScore {
    let mut criteria = Vec::new();
    let (favourite, underdog) = if odds.home < odds.away {
        (odds.home, odds.away)
    } else {
        (odds.away, odds.home)
    };

    let odds_score = if (1.8..=3.5).contains(&underdog) {
        criteria.push(format!("Odd ideal: {underdog:.2}"));
        80.0
    } else if (1.4..=4.0).contains(&underdog) {
        criteria.push(format!("Odd aceitável: {underdog:.2}"));
        65.0
    } else {
        criteria.push(format!("Odd fora do ideal: {underdog:.2}"));
        50.0
    };

    let ratio = if underdog > 0.0 { favourite / underdog } else { 0.0 };
    let strength = if (0.4..=0.7).contains(&ratio) {
        criteria.push("Diferença de força equilibrada".to_string());
        80.0
    } else if (0.3..=0.8).contains(&ratio) {
        criteria.push("Diferença de força moderada".to_string());
        65.0
    } else {
        criteria.push("Diferença de força desequilibrada".to_string());
        50.0
    };

    let inflated = if favourite < 1.5 && underdog > 2.5 {
        criteria.push("Favorito possivelmente inflado".to_string());
        85.0
    } else {
        70.0
    };

    let profile = if (2.0..=3.0).contains(&underdog) {
        criteria.push("Perfil ideal para HA+".to_string());
        85.0
    } else {
        70.0
    };

    let base = odds_score * 0.35 + strength * 0.30 + inflated * 0.20 + profile * 0.15;
    let score = (base * weight).round().max(0.0) as u32;

    let gold = (1.8..=3.5).contains(&underdog) && weight >= 0.80 && ratio >= 0.4;
    if gold {
        criteria.push("🏆 GOLD SIGNAL PRÉ-LIVE".to_string());
    }

    RadarScore { score, gold, criteria }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceLevel {
    Elite,
    Alto,
    Bom,
    Acompanhar,
    #[serde(rename = "Sem Interesse")]
    SemInteresse,
}

impl ConfidenceLevel {
    pub fn of(score: u32) -> Self {
        match score {
            s if s >= 90 => ConfidenceLevel::Elite,
            s if s >= 80 => ConfidenceLevel::Alto,
            s if s >= 70 => ConfidenceLevel::Bom,
            s if s >= 60 => ConfidenceLevel::Acompanhar,
            _ => ConfidenceLevel::SemInteresse,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::Elite        => "Elite",
            ConfidenceLevel::Alto         => "Alto",
            ConfidenceLevel::Bom          => "Bom",
            ConfidenceLevel::Acompanhar   => "Acompanhar",
            ConfidenceLevel::SemInteresse => "Sem Interesse",
        }
    }
}
