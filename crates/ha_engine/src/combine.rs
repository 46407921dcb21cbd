//! Combination of a pre-game verdict with the live (second-half) verdict.

use crate::composer::Decision;
use crate::shield::HandicapLine;
use serde::{Deserialize, Serialize};

const PREGAME_WEIGHT: f64 = 0.4;
const LIVE_WEIGHT: f64 = 0.6;
/// Live-only entries lose this share for lacking convergence.
const DIVERGENCE_DISCOUNT: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalCoherence {
    Alta,
    #[serde(rename = "MÉDIA")]
    Media,
    Baixa,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSignals {
    pub recommendation: String,
    pub handicap:       Option<HandicapLine>,
    pub confidence:     f64,
    pub ev:             f64,
    pub coherence:      SignalCoherence,
    pub should_bet:     bool,
    pub notes:          Vec<String>,
}

fn summary(notes: &mut Vec<String>, title: &str, d: &Decision) {
    notes.push(format!("=== {title} ==="));
    notes.push(format!("Recomendação: {}", d.recommendation));
    notes.push(format!("Confiança: {:.1}%", d.confidence));
    notes.push(format!("EV: {:.2}%", d.ev));
}

pub fn combine_signals(pregame: &Decision, live: &Decision) -> CombinedSignals {
    let mut notes = Vec::new();
    summary(&mut notes, "ANÁLISE PRÉ-JOGO", pregame);
    summary(&mut notes, "ANÁLISE HT → FT", live);
    notes.push("=== COERÊNCIA DOS SINAIS ===".to_string());

    match (pregame.handicap, live.handicap) {
        (Some(pre_line), Some(live_line)) => {
            notes.push("✅ ALTA COERÊNCIA: Pré-jogo e HT convergem para APOSTAR".to_string());
            if (pre_line.goals() - live_line.goals()).abs() <= 0.5 {
                notes.push("✅ Handicaps compatíveis - sinais alinhados".to_string());
            } else {
                notes.push("⚠️ Handicaps diferentes - ajustar para o mais conservador".to_string());
            }
            let confidence = pregame.confidence * PREGAME_WEIGHT + live.confidence * LIVE_WEIGHT;
            let ev = pregame.ev * PREGAME_WEIGHT + live.ev * LIVE_WEIGHT;
            notes.push(format!("Confiança combinada: {confidence:.1}%"));
            notes.push(format!("EV combinado: {ev:.2}%"));

            CombinedSignals {
                recommendation: format!("APOSTAR: {live_line} (Sinais convergentes)"),
                handicap: Some(live_line),
                confidence,
                ev,
                coherence: SignalCoherence::Alta,
                should_bet: true,
                notes,
            }
        }
        (Some(_), None) => {
            notes.push("⚠️ BAIXA COERÊNCIA: Pré-jogo recomendava, mas HT vetou".to_string());
            notes.push("🛡️ DECISÃO: NÃO APOSTAR (veto do HT prevalece)".to_string());
            CombinedSignals {
                recommendation: "NÃO APOSTAR - HT vetou aposta do pré-jogo".to_string(),
                handicap: None,
                confidence: live.confidence,
                ev: live.ev,
                coherence: SignalCoherence::Baixa,
                should_bet: false,
                notes,
            }
        }
        (None, Some(live_line)) => {
            notes.push(
                "⚠️ MÉDIA COERÊNCIA: Pré-jogo não recomendava, mas HT identificou oportunidade".to_string(),
            );
            if live.confidence >= 70.0 && live.ev > 3.0 {
                notes.push("🎯 DECISÃO: APOSTAR com cautela (baseado no HT)".to_string());
                CombinedSignals {
                    recommendation: format!("APOSTAR: {live_line} (Oportunidade no HT)"),
                    handicap: Some(live_line),
                    confidence: live.confidence * DIVERGENCE_DISCOUNT,
                    ev: live.ev * DIVERGENCE_DISCOUNT,
                    coherence: SignalCoherence::Media,
                    should_bet: true,
                    notes,
                }
            } else {
                notes.push("🛡️ DECISÃO: NÃO APOSTAR (cautela)".to_string());
                CombinedSignals {
                    recommendation: "NÃO APOSTAR - Sinais divergentes sem confiança suficiente".to_string(),
                    handicap: None,
                    confidence: live.confidence,
                    ev: live.ev,
                    coherence: SignalCoherence::Media,
                    should_bet: false,
                    notes,
                }
            }
        }
        (None, None) => {
            notes.push("✅ ALTA COERÊNCIA: Pré-jogo e HT convergem para NÃO APOSTAR".to_string());
            CombinedSignals {
                recommendation: "NÃO APOSTAR - Sinais convergentes (sem edge)".to_string(),
                handicap: None,
                confidence: pregame.confidence.min(live.confidence),
                ev: pregame.ev.min(live.ev),
                coherence: SignalCoherence::Alta,
                should_bet: false,
                notes,
            }
        }
    }
}
