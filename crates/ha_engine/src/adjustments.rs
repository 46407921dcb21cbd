//! Confidence adjustments as named records folded into one clamped score.

use crate::normalizers::clamp100;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub label: String,
    pub delta: f64,
}

impl Adjustment {
    pub fn new(label: impl Into<String>, delta: f64) -> Self {
        Self { label: label.into(), delta }
    }

    /// Transcript line, e.g. `⬆️ Time Bomb ativa (+8.0)`.
    pub fn line(&self) -> String {
        let arrow = if self.delta > 0.0 {
            "⬆️"
        } else if self.delta < 0.0 {
            "⬇️"
        } else {
            "➖"
        };
        format!("{arrow} {} ({:+.1})", self.label, self.delta)
    }
}

/// Ordered list of adjustments; zero deltas are dropped on push.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    entries: Vec<Adjustment>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, delta: f64) {
        if delta != 0.0 && delta.is_finite() {
            self.entries.push(Adjustment::new(label, delta));
        }
    }

    /// Pushes `delta` only when `condition` holds.
    pub fn push_if(&mut self, condition: bool, label: impl Into<String>, delta: f64) {
        if condition {
            self.push(label, delta);
        }
    }

    pub fn entries(&self) -> &[Adjustment] {
        &self.entries
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|a| a.delta).sum()
    }

    pub fn fold(&self, start: f64) -> f64 {
        fold_confidence(start, &self.entries)
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(Adjustment::line).collect()
    }
}

/// Left fold of every delta onto `start`, clamped once at the end.
pub fn fold_confidence(start: f64, adjustments: &[Adjustment]) -> f64 {
    clamp100(adjustments.iter().fold(start, |acc, a| acc + a.delta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_only_at_the_end() {
        let mut ledger = Ledger::new();
        ledger.push("a", 40.0);
        ledger.push("b", -30.0);
        // an intermediate 110 is allowed, the final value is 80
        assert_eq!(ledger.fold(70.0), 80.0);
        assert_eq!(fold_confidence(10.0, &[Adjustment::new("x", -50.0)]), 0.0);
    }

    #[test]
    fn zero_deltas_leave_no_trace() {
        let mut ledger = Ledger::new();
        ledger.push("neutral", 0.0);
        ledger.push_if(false, "skipped", 5.0);
        ledger.push_if(true, "Time Bomb ativa", 8.0);
        assert_eq!(ledger.lines(), vec!["⬆️ Time Bomb ativa (+8.0)".to_string()]);
        assert_eq!(ledger.total(), 8.0);
    }
}
