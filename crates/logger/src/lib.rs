//! Filtro Live — Logger
//! JSONL event stream, Telegram alerts

use anyhow::{bail, Result};
use chrono::Utc;
use serde::Serialize;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }

    /// Like [`log`](Self::log) but a failed write only warns.
    pub fn record<T: Serialize>(&self, event: &T) {
        if let Err(e) = self.log(event) {
            warn!("event log write failed ({}): {}", self.log_dir.display(), e);
        }
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event types ───────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct LiveAnalysisEvent {
    pub ts:             String,
    pub event:          &'static str,   // "LIVE_ANALYSIS"
    pub fixture_id:     u64,
    pub team:           String,
    pub minute:         u32,
    pub score:          String,
    pub handicap:       String,         // "+0.5" | "NÃO APOSTAR"
    pub odd:            f64,
    pub ev:             f64,
    pub confidence:     f64,
    pub aggro_level:    u8,
    pub red_flags:      usize,
    pub recommendation: String,
}

#[derive(Serialize, Debug)]
pub struct HalfTimeSnapshotEvent {
    pub ts:         String,
    pub event:      &'static str,       // "HALFTIME_SNAPSHOT"
    pub fixture_id: u64,
    pub home:       String,
    pub away:       String,
    pub rds_home:   f64,
    pub rds_away:   f64,
    pub profile:    String,
}

#[derive(Serialize, Debug)]
pub struct PregameAnalysisEvent {
    pub ts:             String,
    pub event:          &'static str,   // "PREGAME_ANALYSIS"
    pub home:           String,
    pub away:           String,
    pub league:         String,
    pub ha_line:        String,
    pub ha_odd:         f64,
    pub ev:             f64,
    pub confidence:     f64,
    pub recommendation: String,
}

#[derive(Serialize, Debug)]
pub struct RadarSignalEvent {
    pub ts:         String,
    pub event:      &'static str,       // "RADAR_SIGNAL"
    pub fixture_id: u64,
    pub league_id:  u32,
    pub home:       String,
    pub away:       String,
    pub minute:     u32,
    pub score:      f64,
    pub level:      String,
    pub gold:       bool,
}

#[derive(Serialize, Debug)]
pub struct RadarAlertEvent {
    pub ts:         String,
    pub event:      &'static str,       // "RADAR_ALERT"
    pub fixture_id: u64,
    pub kind:       String,             // "GAME_STARTED" | "SIGNAL_CANCELLED" | "ANALYSIS_60" | "CONSOLIDATED"
    pub message:    String,
}

/// Fire-and-forget chat alerts. Disabled unless both `TELEGRAM_BOT_TOKEN`
/// and `TELEGRAM_CHAT_ID` are set.
#[derive(Clone)]
pub struct TelegramNotifier {
    client:  reqwest::Client,
    token:   String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), token: token.into(), chat_id: chat_id.into() }
    }

    pub fn from_env() -> Option<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN").ok().filter(|v| !v.trim().is_empty())?;
        let chat_id = env::var("TELEGRAM_CHAT_ID").ok().filter(|v| !v.trim().is_empty())?;
        Some(Self::new(token, chat_id))
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });
        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Telegram sendMessage failed: {} — {}", status, body);
        }
        Ok(())
    }

    /// Errors are logged, never returned.
    pub async fn send(&self, text: &str) {
        match self.send_message(text).await {
            Ok(())  => info!("Telegram alert sent ({} chars)", text.chars().count()),
            Err(e) => warn!("Telegram alert failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_event() {
        let dir = env::temp_dir().join(format!("filtro-logger-{}", std::process::id()));
        let logger = EventLogger::new(&dir);
        for minute in [45, 60] {
            logger.record(&RadarAlertEvent {
                ts:         now_iso(),
                event:      "RADAR_ALERT",
                fixture_id: 42,
                kind:       "ANALYSIS_60".into(),
                message:    format!("minuto {minute}"),
            });
        }

        let path = dir.join(format!("{}.jsonl", Utc::now().format("%Y-%m-%d")));
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "RADAR_ALERT");
        assert_eq!(first["fixture_id"], 42);
        fs::remove_dir_all(&dir).ok();
    }
}
