//! Live decision composer.
//!
//! One call runs the whole pipeline over the latest snapshot:
//! `NormalizedStats → Classification → GateDecision → AnalysisResult`.
//! Every confidence adjustment is a named ledger entry, so the transcript
//! shows exactly which rules fired and by how much.

use crate::adjustments::{Adjustment, Ledger};
use crate::aggro::{determine_aggro_level, triple_confirmation, AggroInputs, AggroLevel, TripleInputs};
use crate::classifiers::{
    classify_risk_map, compare_half_to_full_time, detect_dead_game, detect_pattern_break,
    detect_time_bomb, Coherence, PatternBreak, RiskInputs, RiskMap,
};
use crate::gates::{evaluate_gates, CooldownTracker, GateDecision, GateInputs};
use crate::mirror::{check_mirror_pattern, MirrorCheck, MirrorInputs};
use crate::normalizers::{
    erp, fragility, game_tempo, ha_friendly, minute_phase, momentum,
    odd_line_coherence, pressure_index, score_context, shadow_xg, shot_quality_index, tda,
    Erp, Level, MinutePhase, Momentum, Pressure, Tda, Tempo, Trend,
};
use crate::opc::{analyze_opc, OpcInputs, OpcVerdict};
use crate::shield::{
    apply_shield, regime_approval, score_shield, timing_score, HandicapLine, RegimeInputs,
    RegimeVerdict,
};
use crate::snapshot::{HalfTimeSnapshot, MatchStatSnapshot, SnapshotRepository};
use crate::thresholds::{
    EngineConfig, GREEN_LIGHT_CONFIDENCE, GREEN_LIGHT_MAX_SHADOW_XG, LEVEL3_DISCLAIMER,
    PRIMARY_EDGE_CONFIDENCE, PRIMARY_EDGE_EV, PRIMARY_EDGE_PROBABILITY,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const NO_BET: &str = "SEM RECOMENDAÇÃO – NÃO APOSTAR";
pub const NO_BET_HANDICAP: &str = "NÃO APOSTAR";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    #[default]
    Lab,
    Real,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    UltraConservative,
    #[default]
    Balanced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveAnalysisInput {
    pub snapshot:  MatchStatSnapshot,
    /// Side being backed; the away team when empty.
    #[serde(default)]
    pub team_name: String,
    pub line:      HandicapLine,
    pub odd:       f64,
    #[serde(default)]
    pub mode:      Mode,
    #[serde(default)]
    pub profile:   Profile,
}

impl LiveAnalysisInput {
    fn team(&self) -> &str {
        if self.team_name.trim().is_empty() {
            &self.snapshot.away_team
        } else {
            &self.team_name
        }
    }
}

/// Core of any verdict, shared by live and pre-game analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub recommendation:    String,
    /// `None` means no bet.
    pub handicap:          Option<HandicapLine>,
    pub odd:               f64,
    pub ev:                f64,
    pub confidence:        f64,
    pub real_probability:  f64,
    pub tactical_score:    f64,
    pub statistical_score: f64,
    pub justification:     Vec<String>,
}

impl Decision {
    pub fn recommends(&self) -> bool {
        self.handicap.is_some()
    }

    pub fn handicap_label(&self) -> String {
        self.handicap.map_or_else(|| NO_BET_HANDICAP.to_string(), |l| l.to_string())
    }
}

/// Implied probability of a decimal odd, in percent.
pub fn implied_probability(odd: f64) -> f64 {
    if odd > 0.0 {
        100.0 / odd
    } else {
        100.0
    }
}

pub fn tactical_score(real_probability: f64) -> f64 {
    (real_probability * 0.85 + 15.0).round()
}

pub fn statistical_score(real_probability: f64) -> f64 {
    (real_probability * 0.9 + 10.0).round()
}

fn ratio(away: f64, home: f64) -> f64 {
    away / (home + away + 0.01)
}

/// Estimated probability that the HA+ side covers, in [0, 100].
pub fn live_real_probability(s: &MatchStatSnapshot, rds_away: f64) -> f64 {
    let shots = ratio(s.away.shots_total as f64, s.home.shots_total as f64);
    let sot = ratio(s.away.shots_on_target as f64, s.home.shots_on_target as f64);

    let mut real = 50.0 + (shots - 0.5) * 30.0 + (sot - 0.5) * 25.0 + (rds_away - 50.0) * 0.4;
    real += match s.score_diff() {
        0 => 5.0,
        1 => -5.0,
        d if d >= 2 => -15.0,
        _ => 0.0,
    };
    real.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStats {
    pub rds_home:             f64,
    pub rds_away:             f64,
    pub momentum:             Momentum,
    /// Favourite (home) pressure on the HA+ side.
    pub pressure:             Pressure,
    pub shadow_xg:            f64,
    pub phase:                MinutePhase,
    pub shot_quality:         f64,
    pub tempo:                Tempo,
    pub real_probability:     f64,
    pub implied_probability:  f64,
    pub shielded_probability: f64,
    pub ev:                   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub risk_map:           RiskMap,
    pub dead_game:          bool,
    pub time_bomb:          bool,
    pub pattern_break:      PatternBreak,
    pub coherence:          Coherence,
    pub mirror:             MirrorCheck,
    pub ha_friendly:        bool,
    pub odd_line_coherence: f64,
    pub score_context:      f64,
    pub fragility:          f64,
    pub tda:                Tda,
    pub erp:                Erp,
    pub aggro_level:        AggroLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveDerivedMetrics {
    pub normalized:     NormalizedStats,
    pub classification: Classification,
    pub gates:          GateDecision,
    pub green_light:    bool,
    pub regime:         RegimeVerdict,
    pub score_shield:   bool,
    pub timing_score:   f64,
    pub opc:            OpcVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub fixture_id:    u64,
    pub team_name:     String,
    pub minute:        u32,
    pub score:         String,
    #[serde(flatten)]
    pub decision:      Decision,
    pub aggro_level:   AggroLevel,
    pub aggro_name:    String,
    pub adjustments:   Vec<Adjustment>,
    pub disclaimer:    Option<String>,
    pub next_step:     String,
    pub true_value:    bool,
    pub turning_point: bool,
    pub metrics:       LiveDerivedMetrics,
    pub created_at:    DateTime<Utc>,
}

/// EV gate of the primary market: the level's floor, plus a hard 0% floor in
/// the balanced profile. A green light bypasses both.
pub fn ev_gate(ev: f64, level: AggroLevel, profile: Profile, green_light: bool) -> bool {
    if green_light {
        return true;
    }
    ev >= level.ev_floor() && (profile != Profile::Balanced || ev >= 0.0)
}

#[derive(Debug, Clone, Copy)]
pub struct GreenLightInputs {
    pub blocked:         bool,
    pub coherence:       Coherence,
    pub trend:           Trend,
    pub hot_moment:      bool,
    pub shadow_xg:       f64,
    pub risk_map:        RiskMap,
    pub ha_friendly:     bool,
    pub confidence:      f64,
    pub regime_approved: bool,
}

/// Every favourable condition at once.
pub fn green_light(i: &GreenLightInputs) -> bool {
    !i.blocked
        && i.coherence != Coherence::ScriptBroken
        && i.trend != Trend::Falling
        && !i.hot_moment
        && i.shadow_xg <= GREEN_LIGHT_MAX_SHADOW_XG
        && matches!(i.risk_map, RiskMap::Controlled | RiskMap::Locked)
        && i.ha_friendly
        && i.confidence >= GREEN_LIGHT_CONFIDENCE
        && i.regime_approved
}

fn next_step(trend: Trend, time_bomb: bool, dead_game: bool, risk_map: RiskMap) -> &'static str {
    if trend == Trend::Rising && time_bomb {
        "🚀 Expectativa: Gol iminente nos próximos 5-10 minutos"
    } else if dead_game {
        "⏸️ Expectativa: Jogo travado - poucos eventos esperados"
    } else if risk_map == RiskMap::Chaotic {
        "⚡ Expectativa: Jogo volátil - múltiplos eventos possíveis"
    } else if risk_map == RiskMap::Controlled {
        "🎯 Expectativa: Favorito mantém controle até o final"
    } else {
        "📊 Expectativa: Cenário equilibrado - monitorar próximos 10 minutos"
    }
}

fn normalize(input: &LiveAnalysisInput) -> NormalizedStats {
    let s = &input.snapshot;
    let rds_home = s.home.dominance();
    let rds_away = s.away.dominance();

    let momentum = momentum(
        s.away.dangerous_attacks as f64,
        s.away.shots_on_target as f64,
        s.away.possession,
    );

    let real_probability = live_real_probability(s, rds_away);
    let implied = implied_probability(input.odd);

    NormalizedStats {
        rds_home,
        rds_away,
        momentum,
        pressure: pressure_index(s.home.shots_on_target as f64, s.home.dangerous_attacks as f64, s.home.xg),
        shadow_xg: shadow_xg(
            s.away.dangerous_attacks as f64,
            s.away.corners as f64,
            s.away.shots_on_target as f64,
            s.away.xg,
        ),
        phase: minute_phase(s.minute),
        shot_quality: shot_quality_index(s.home.shots_total as f64, s.home.xg),
        tempo: game_tempo(
            s.total_shots() as f64,
            s.total_dangerous_attacks() as f64,
            (s.home.fouls + s.away.fouls) as f64,
        ),
        real_probability,
        implied_probability: implied,
        shielded_probability: apply_shield(real_probability / 100.0, input.line) * 100.0,
        ev: real_probability - implied,
    }
}

fn classify(
    input:     &LiveAnalysisInput,
    n:         &NormalizedStats,
    half_time: Option<&HalfTimeSnapshot>,
) -> Classification {
    let s = &input.snapshot;
    let score_diff = s.score_diff();

    let risk_map = classify_risk_map(&RiskInputs {
        total_shots:       s.total_shots() as f64,
        dangerous_attacks: s.total_dangerous_attacks() as f64,
        total_xg:          s.total_xg(),
        rds_home:          n.rds_home,
        rds_away:          n.rds_away,
        score_diff,
    });
    let dead_game = detect_dead_game(
        s.home.xg_or_zero(),
        s.away.xg_or_zero(),
        s.total_shots() as f64,
        s.home.possession,
        s.minute,
    );
    let time_bomb = detect_time_bomb(s.away.xg_or_zero(), n.shadow_xg, n.pressure.index, s.away.corners as f64);
    let pattern_break = detect_pattern_break(
        half_time,
        n.rds_away,
        s.away.shots_total as f64,
        s.away.possession,
    );
    let coherence = compare_half_to_full_time(half_time, n.rds_home, n.rds_away, s);

    let mirror = check_mirror_pattern(&MirrorInputs {
        current: s,
        half_time,
        rds_home: n.rds_home,
        rds_away: n.rds_away,
        trend: n.momentum.trend,
        risk_map,
        pattern_break,
    });

    let underdog_sot_ratio = s.away.shots_on_target as f64 / (s.home.shots_on_target as f64 + 0.01);
    let fragility = fragility(score_diff > 0, s.minute);

    let (underdog_trend, favourite_trend, previous) = match half_time {
        Some(ht) => (vec![ht.rds_away, n.rds_away], vec![ht.rds_home, n.rds_home], ht.rds_away),
        None => (vec![n.rds_away], vec![n.rds_home], n.rds_away),
    };

    let aggro_level = determine_aggro_level(&AggroInputs {
        momentum: n.momentum,
        shadow_xg: n.shadow_xg,
        time_bomb,
        pattern_break,
        dead_game,
        risk_map,
        pressure_index: n.pressure.index,
    });

    Classification {
        risk_map,
        dead_game,
        time_bomb,
        pattern_break,
        coherence,
        mirror,
        ha_friendly: ha_friendly(s.total_goals(), n.rds_away, underdog_sot_ratio),
        odd_line_coherence: odd_line_coherence(input.line.goals(), input.odd, s.minute, score_diff),
        score_context: score_context(score_diff, s.minute, n.rds_away),
        fragility,
        tda: tda(n.rds_away, previous, &underdog_trend),
        erp: erp(n.rds_home, n.rds_away, s.minute, &favourite_trend, fragility),
        aggro_level,
    }
}

/// The ordered adjustment table.
fn adjust(
    s:      &MatchStatSnapshot,
    n:      &NormalizedStats,
    c:      &Classification,
    timing: f64,
    gates:  &GateDecision,
) -> Ledger {
    let mut ledger = Ledger::new();

    match c.coherence {
        Coherence::ScriptConfirmed => ledger.push("HT→FT: roteiro confirmado", 5.0),
        Coherence::ScriptBroken => ledger.push("HT→FT: roteiro rompido", -10.0),
        Coherence::Neutral => {}
    }
    match n.momentum.trend {
        Trend::Rising => ledger.push("Momentum crescendo", 3.0),
        Trend::Falling => ledger.push("Momentum caindo", -5.0),
        Trend::Neutral => {}
    }
    ledger.push_if(n.pressure.hot_moment, "Pressão do favorito em momento quente", -8.0);
    match n.phase {
        MinutePhase::Late => ledger.push("Fase 76+", -10.0),
        MinutePhase::Middle => ledger.push("Fase 61-75", -3.0),
        _ => {}
    }
    ledger.push_if(!c.ha_friendly, "Contexto não HA Friendly", -7.0);
    ledger.push_if(c.odd_line_coherence < 60.0, "Odd incoerente com a linha", -8.0);

    let favourite_shots = s.home.shots_total as f64;
    let favourite_xg = s.home.xg_or_zero();
    if n.shot_quality < 0.1 && favourite_shots > 10.0 {
        ledger.push("Falsa pressão do favorito (baixa qualidade de chute)", 5.0);
    } else if n.shot_quality > 0.15 && favourite_xg > 2.0 {
        ledger.push("Pressão real do favorito", -10.0);
    }

    ledger.push("Contexto do placar", (c.score_context - 50.0) * 0.15);
    ledger.push_if(c.time_bomb, "Time Bomb ativa", 8.0);
    ledger.push_if(c.dead_game, "Dead Game detectado", -15.0);
    match c.risk_map {
        RiskMap::Explosive | RiskMap::Chaotic => ledger.push(format!("Risk Map {}", c.risk_map.label()), -5.0),
        RiskMap::Controlled => ledger.push("Risk Map CONTROLLED", 5.0),
        RiskMap::Dead => ledger.push("Risk Map DEAD", -20.0),
        RiskMap::Locked => {}
    }
    match c.pattern_break {
        PatternBreak::Strong => ledger.push("Quebra de padrão forte", -15.0),
        PatternBreak::Mild => ledger.push("Quebra de padrão leve", -5.0),
        PatternBreak::None => {}
    }
    ledger.push_if(c.fragility > 60.0 && s.score_diff() == 1, "Favorito frágil com um gol de vantagem", 5.0);
    match c.tda.trend {
        crate::normalizers::Stability::Consistent => ledger.push("TDA consistente", 4.0),
        crate::normalizers::Stability::Volatile => ledger.push("TDA volátil", -6.0),
    }
    match n.tempo.speed {
        Level::High => ledger.push("Ritmo alto", -5.0),
        Level::Low => ledger.push("Ritmo baixo", 3.0),
        Level::Medium => {}
    }
    match c.erp.impact {
        Level::High => ledger.push("ERP alto", 8.0),
        Level::Medium => ledger.push("ERP médio", 3.0),
        Level::Low => {}
    }
    ledger.push("Timing score", (timing - 50.0) * 0.10);
    if let Some(label) = &c.mirror.archetype_label {
        ledger.push(format!("Mirror check: {label}"), c.mirror.bonus());
    }
    for flag in &gates.yellow_flags {
        ledger.push(flag.label(), flag.penalty());
    }

    ledger
}

/// New favourite shots on target since a half-time read that favoured the
/// home side.
fn chances_against(s: &MatchStatSnapshot, half_time: Option<&HalfTimeSnapshot>) -> u32 {
    half_time
        .filter(|ht| ht.rds_home > ht.rds_away)
        .map(|ht| s.home.shots_on_target.saturating_sub(ht.stats.home.shots_on_target))
        .unwrap_or(0)
}

struct Approval {
    approved:   bool,
    disclaimer: Option<String>,
    lines:      Vec<String>,
}

fn approve(
    input:      &LiveAnalysisInput,
    n:          &NormalizedStats,
    c:          &Classification,
    confidence: f64,
    green:      bool,
    config:     &EngineConfig,
) -> Approval {
    let level = c.aggro_level;
    let ev = n.ev;
    let mut lines = Vec::new();

    if !ev_gate(ev, level, input.profile, green) {
        let floor = if input.profile == Profile::Balanced { level.ev_floor().max(0.0) } else { level.ev_floor() };
        lines.push(format!(
            "⚠️ EV ({ev:.2}%) abaixo do threshold do Nível {} ({floor:.2}%)",
            level.number()
        ));
        return Approval { approved: false, disclaimer: None, lines };
    }
    if green && ev < level.ev_floor() {
        lines.push("🟢 Green Light: piso de EV dispensado".to_string());
    }

    if level == AggroLevel::SmartAggressive {
        let failed = triple_confirmation(&TripleInputs {
            momentum_last5: n.momentum.last5,
            pressure_index: n.pressure.index,
            pattern_break:  c.pattern_break,
            time_bomb:      c.time_bomb,
            shadow_xg:      n.shadow_xg,
            coherence:      c.coherence,
            tempo:          n.tempo.speed,
            odd:            input.odd,
            min_odd:        config.min_odd,
            risk_map:       c.risk_map,
        });
        if failed.is_empty() && confidence >= PRIMARY_EDGE_CONFIDENCE {
            lines.push(format!("✅ Modo Agressivo Inteligente (Nível {})", level.number()));
            return Approval { approved: true, disclaimer: Some(LEVEL3_DISCLAIMER.to_string()), lines };
        }
        lines.push(format!("⚠️ Nível 3 não atende Confirmação Tripla completa: {}", failed.join(", ")));
        return Approval { approved: false, disclaimer: None, lines };
    }

    let approved = match (input.profile, input.mode) {
        (Profile::UltraConservative, Mode::Real) if input.snapshot.minute >= 75 => {
            let ok = confidence >= 70.0 && ev > 4.0;
            if ok {
                lines.push(format!("✅ Passou no Modo Ultra Conservador (Minuto ≥ 75) - Nível {}", level.number()));
            } else {
                lines.push(format!("🛡️ MODO ULTRA CONSERVADOR ATIVO (Minuto ≥ 75) - Nível {}", level.number()));
                lines.push(format!("   Confiança: {confidence:.1}% (mínimo: 70%)"));
                lines.push(format!("   EV: {ev:.2}% (mínimo: 4%)"));
            }
            ok
        }
        (Profile::UltraConservative, Mode::Real) => {
            let ok = confidence >= 65.0 && ev > 3.0;
            lines.push(if ok {
                format!("✅ Confiança e EV adequados para o 2º tempo - Nível {}", level.number())
            } else {
                format!("⚠️ Confiança/EV insuficientes para HA+ seguro no 2º tempo - Nível {}", level.number())
            });
            ok
        }
        _ => {
            let edge = n.real_probability >= PRIMARY_EDGE_PROBABILITY && (ev > PRIMARY_EDGE_EV || green);
            let ok = edge && confidence >= PRIMARY_EDGE_CONFIDENCE;
            if ok && ev <= PRIMARY_EDGE_EV && ev >= level.ev_floor() {
                lines.push("🟢 Green Light: piso de EV dispensado".to_string());
            }
            lines.push(if ok {
                format!("✅ Boa probabilidade e EV positivo - Nível {}", level.number())
            } else if !edge {
                format!(
                    "⚠️ Sem edge matemático suficiente (Prob. Real {:.1}%, EV {ev:.2}%) - Nível {}",
                    n.real_probability,
                    level.number()
                )
            } else {
                format!("⚠️ Confiança {confidence:.1}% abaixo de 60% - Nível {}", level.number())
            });
            ok
        }
    };

    let disclaimer = (approved && ev < 0.0).then(|| format!("⚠️ EV negativo ({ev:.2}%) - {}", level.name()));
    Approval { approved, disclaimer, lines }
}

fn metrics_lines(n: &NormalizedStats, c: &Classification, m: &LiveDerivedMetrics) -> Vec<String> {
    let mut lines = vec![
        "📊 Métricas Principais:".to_string(),
        format!("   Probabilidade Real: {:.1}%", n.real_probability),
        format!("   Probabilidade Implícita: {:.1}%", n.implied_probability),
        format!("   Probabilidade com escudo: {:.1}%", n.shielded_probability),
        format!("   EV: {:.2}%", n.ev),
        format!("   RDS Casa: {:.1} | RDS Fora: {:.1}", n.rds_home, n.rds_away),
        format!("   AggroLevel: {} ({})", c.aggro_level.number(), c.aggro_level.name()),
    ];
    if c.coherence != Coherence::Neutral {
        lines.push(format!("🔄 Comparação HT→FT: {}", c.coherence.label()));
    }
    lines.extend([
        "⚡ Módulos Ativos:".to_string(),
        format!("   Momentum: {} ({:.0}/100)", n.momentum.trend.label().to_uppercase(), n.momentum.last5),
        format!(
            "   Pressure Index: {:.0}/100{}",
            n.pressure.index,
            if n.pressure.hot_moment { " 🔥" } else { "" }
        ),
        format!("   HA Friendly: {}", if c.ha_friendly { "SIM ✅" } else { "NÃO ❌" }),
        format!("   Pattern Break: {}", c.pattern_break.label().to_uppercase()),
        format!("   TDA: {} ({:.0}/100)", c.tda.trend.label().to_uppercase(), c.tda.score),
        format!("   Game Tempo: {} (Risco: {:.0}%)", n.tempo.speed.label().to_uppercase(), n.tempo.volatility_risk),
        format!("   ERP: {} ({:.0}%)", c.erp.impact.label().to_uppercase(), c.erp.probability),
        format!("   Shadow xG: {:.2}", n.shadow_xg),
        format!("   Time Bomb: {}", if c.time_bomb { "ATIVADA 💣" } else { "Inativa" }),
        format!("   Dead Game: {}", if c.dead_game { "DETECTADO ⚠️" } else { "Não" }),
        format!("   Risk Map: {}", c.risk_map.label()),
        format!("   Timing Score: {:.0}/100", m.timing_score),
        format!("   Score Shield: {}", if m.score_shield { "ATIVO 🛡️" } else { "Inativo" }),
        format!("   {}: {}", m.regime.regime.name(), m.regime.reason),
        format!("   Green Light: {}", if m.green_light { "SIM 🟢" } else { "NÃO" }),
    ]);
    if let Some(label) = &c.mirror.archetype_label {
        lines.push(format!("   Mirror Check: {label} ({:.0}%)", c.mirror.match_score * 100.0));
    }
    lines.push("🎯 OPC (Oportunidade Secundária):".to_string());
    lines.push(format!("   {}", m.opc.rationale));
    lines
}

/// Runs one live analysis. Any absolute red flag, the dead zone or an
/// active lock window forces confidence 0 and a no-bet verdict.
pub fn analyze_live(
    input:     &LiveAnalysisInput,
    snapshots: &dyn SnapshotRepository,
    cooldowns: &mut CooldownTracker,
    config:    &EngineConfig,
    now:       DateTime<Utc>,
) -> AnalysisResult {
    let s = &input.snapshot;
    let half_time = snapshots.get(s.fixture_id);

    let n = normalize(input);
    let c = classify(input, &n, half_time);

    let gates = evaluate_gates(
        &GateInputs {
            fixture_id:         s.fixture_id,
            minute:             s.minute,
            odd:                input.odd,
            away_xg:            s.away.xg_or_zero(),
            away_shots:         s.away.shots_total,
            total_red_cards:    s.total_red_cards(),
            away_red_cards:     s.away.red_cards,
            erp:                c.erp.probability,
            risk_map:           c.risk_map,
            shadow_xg:          n.shadow_xg,
            favourite_pressure: n.pressure.index,
            favourite_xg:       s.home.xg_or_zero(),
            chances_against:    chances_against(s, half_time),
            momentum_last5:     n.momentum.last5,
            tempo:              n.tempo.speed,
        },
        cooldowns,
        now,
        config,
    );

    let locked_game = c.risk_map == RiskMap::Locked || c.dead_game;
    let timing = timing_score(n.phase, input.line, locked_game, n.pressure.index < 40.0);
    let regime = regime_approval(input.line, &RegimeInputs {
        ev:          n.ev,
        ha_friendly: c.ha_friendly,
        risk_map:    c.risk_map,
        shadow_xg:   n.shadow_xg,
        locked_game,
    });
    let shield = score_shield(
        input.line,
        n.shadow_xg,
        matches!(c.risk_map, RiskMap::Controlled | RiskMap::Locked) && !n.pressure.hot_moment,
        s.score_diff() <= 0,
    );

    let tactical = tactical_score(n.real_probability);
    let statistical = statistical_score(n.real_probability);
    let start = (tactical + statistical) / 2.0;
    let ledger = adjust(s, &n, &c, timing, &gates);
    let blocked = gates.blocked();
    let confidence = if blocked { 0.0 } else { ledger.fold(start) };

    let green = green_light(&GreenLightInputs {
        blocked,
        coherence:       c.coherence,
        trend:           n.momentum.trend,
        hot_moment:      n.pressure.hot_moment,
        shadow_xg:       n.shadow_xg,
        risk_map:        c.risk_map,
        ha_friendly:     c.ha_friendly,
        confidence,
        regime_approved: regime.approved,
    });

    let mut justification = Vec::new();
    let approval = if blocked {
        justification.push("🚫 BLOQUEIO ATIVADO POR RED FLAGS CRÍTICAS:".to_string());
        justification.extend(gates.red_flags.iter().map(|f| format!("   {}", f.message())));
        Approval { approved: false, disclaimer: None, lines: Vec::new() }
    } else {
        approve(input, &n, &c, confidence, green, config)
    };
    justification.extend(approval.lines.iter().cloned());

    justification.push(format!("🧮 Confiança inicial: {start:.1}%"));
    justification.extend(ledger.lines().into_iter().map(|l| format!("   {l}")));
    justification.push(format!("🧮 Confiança final: {confidence:.1}%"));

    let opc = analyze_opc(&OpcInputs {
        ev:             n.ev,
        confidence,
        coherence:      c.coherence,
        trend:          n.momentum.trend,
        momentum_last5: n.momentum.last5,
        pressure_index: n.pressure.index,
        shadow_xg:      n.shadow_xg,
        time_bomb:      c.time_bomb,
        dominance:      (n.rds_home - n.rds_away).abs(),
        tempo:          n.tempo.speed,
        yellow_cards:   s.home.yellow_cards + s.away.yellow_cards,
        red_cards:      s.total_red_cards(),
        total_xg:       s.total_xg(),
        minute:         s.minute,
    });

    let metrics = LiveDerivedMetrics {
        normalized: n.clone(),
        classification: c.clone(),
        gates,
        green_light: green,
        regime,
        score_shield: shield,
        timing_score: timing,
        opc,
    };
    justification.extend(metrics_lines(&n, &c, &metrics));

    let team = input.team().to_string();
    let (recommendation, handicap) = if approval.approved {
        (format!("✅ APOSTAR: {team} {}", input.line), Some(input.line))
    } else {
        (NO_BET.to_string(), None)
    };

    debug!(
        fixture_id = s.fixture_id,
        minute = s.minute,
        confidence,
        ev = n.ev,
        blocked,
        approved = approval.approved,
        "live analysis composed"
    );

    AnalysisResult {
        fixture_id: s.fixture_id,
        team_name: team,
        minute: s.minute,
        score: s.score_line(),
        decision: Decision {
            recommendation,
            handicap,
            odd: input.odd,
            ev: n.ev,
            confidence,
            real_probability: n.real_probability,
            tactical_score: tactical,
            statistical_score: statistical,
            justification,
        },
        aggro_level: c.aggro_level,
        aggro_name: c.aggro_level.name().to_string(),
        adjustments: ledger.entries().to_vec(),
        disclaimer: approval.disclaimer,
        next_step: next_step(n.momentum.trend, c.time_bomb, c.dead_game, c.risk_map).to_string(),
        true_value: n.ev.abs() > 8.0,
        turning_point: c.pattern_break == PatternBreak::Strong,
        metrics,
        created_at: now,
    }
}
