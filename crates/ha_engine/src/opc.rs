//! Secondary opportunity (OPC) analyzer, consulted when the primary HA+
//! entry has no edge.

use crate::classifiers::Coherence;
use crate::normalizers::{Level, Trend};
use crate::thresholds::{
    OPC_EV_FLOOR, OPC_MIN_POSITIVITY, OPC_MIN_SIGNALS, PRIMARY_EDGE_CONFIDENCE, PRIMARY_EDGE_EV,
};
use serde::{Deserialize, Serialize};

pub const OPC_NOT_NEEDED: &str = "primary has EV+, OPC not needed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpcStatus {
    Active,
    Conditional,
    Off,
}

impl OpcStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OpcStatus::Active      => "ATIVO ✓",
            OpcStatus::Conditional => "CONDICIONAL ⚠",
            OpcStatus::Off         => "OFF ✗",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpcVerdict {
    pub status:    OpcStatus,
    pub signals:   Vec<String>,
    pub rationale: String,
}

impl OpcVerdict {
    fn off(rationale: impl Into<String>) -> Self {
        Self { status: OpcStatus::Off, signals: Vec::new(), rationale: rationale.into() }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OpcInputs {
    pub ev:              f64,
    pub confidence:      f64,
    pub coherence:       Coherence,
    pub trend:           Trend,
    pub momentum_last5:  f64,
    pub pressure_index:  f64,
    pub shadow_xg:       f64,
    pub time_bomb:       bool,
    /// |home RDS − away RDS|.
    pub dominance:       f64,
    pub tempo:           Level,
    pub yellow_cards:    u32,
    pub red_cards:       u32,
    pub total_xg:        f64,
    pub minute:          u32,
}

fn positivity(i: &OpcInputs) -> usize {
    [
        i.coherence == Coherence::ScriptConfirmed,
        i.trend != Trend::Falling,
        i.shadow_xg <= 0.15,
        i.dominance >= 10.0,
        i.tempo != Level::High,
    ]
    .iter()
    .filter(|ok| **ok)
    .count()
}

fn market_signals(i: &OpcInputs) -> Vec<String> {
    let card_weight = i.yellow_cards + i.red_cards * 2;
    let rules: [(bool, &str); 5] = [
        (i.momentum_last5 >= 75.0 && i.pressure_index >= 65.0, "Momentum e pressão altos favorecem Over"),
        (i.time_bomb, "Time Bomb ativa - gol iminente"),
        (i.shadow_xg >= 0.6, "Shadow xG alto indica chances não convertidas"),
        (card_weight >= 4 && i.minute >= 60, "Jogo agressivo favorece mais cartões"),
        (i.total_xg < 0.8 && i.minute >= 70, "xG baixo favorece Under"),
    ];
    rules.iter().filter(|(hit, _)| *hit).map(|(_, s)| s.to_string()).collect()
}

pub fn analyze_opc(i: &OpcInputs) -> OpcVerdict {
    if i.ev > PRIMARY_EDGE_EV && i.confidence >= PRIMARY_EDGE_CONFIDENCE {
        return OpcVerdict::off(OPC_NOT_NEEDED);
    }

    let positives = positivity(i);
    if i.ev < OPC_EV_FLOOR && positives < OPC_MIN_POSITIVITY {
        return OpcVerdict::off(format!(
            "OPC bloqueada: EV {:.1}% abaixo de {OPC_EV_FLOOR}% e apenas {positives}/5 sinais positivos",
            i.ev
        ));
    }

    let signals = market_signals(i);
    let (status, rationale) = match signals.len() {
        n if n >= OPC_MIN_SIGNALS => (
            OpcStatus::Active,
            format!("OPC {} (EV: {:.2}%): {}", OpcStatus::Active.label(), i.ev, signals.join(" • ")),
        ),
        2 => (
            OpcStatus::Conditional,
            format!(
                "OPC {}: {} - aguardar terceiro sinal",
                OpcStatus::Conditional.label(),
                signals.join(" • ")
            ),
        ),
        n => (OpcStatus::Off, format!("Nenhuma OPC válida ({n} de 5 sinais)")),
    };

    OpcVerdict { status, signals, rationale }
}
