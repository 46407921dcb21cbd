/// Filtro Live — Radar
///
/// Manual scan of the radar leagues for HA+ candidates:
///   - live: live fixtures per league, mini filter, radar score
///   - pre_live: today's fixtures scored by their odds profile only
///
/// Leagues are scanned one after another. A failing league is logged and
/// skipped. Alerts go out through the Telegram notifier when configured.

pub mod scoring;

pub use scoring::{
    mini_filter, pre_live_score, radar_rds, radar_score, select_leagues, ConfidenceLevel, FilterResult,
    LiveRadarInputs, RadarLeague, RadarScore, RadarStats, RADAR_LEAGUES,
};

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use football_api::model::{count_cards, team_stats};
use football_api::{ApiFixture, FootballClient, MatchOdds};
use logger::{now_iso, EventLogger, RadarAlertEvent, RadarSignalEvent, TelegramNotifier};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

pub const PERFORMANCE_LOG_CAP: usize = 1000;
/// Score at which a live signal is worth an alert on its own.
pub const ALERT_SCORE: u32 = 75;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    #[default]
    Live,
    #[serde(alias = "preLive")]
    PreLive,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanRequest {
    pub mode:      ScanMode,
    pub leagues:   Vec<u32>,
    pub min_score: u32,
    pub max_games: usize,
}

impl Default for ScanRequest {
    fn default() -> Self {
        Self { mode: ScanMode::Live, leagues: Vec::new(), min_score: 70, max_games: 20 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RadarGame {
    pub fixture_id:       u64,
    pub league_id:        u32,
    pub league_name:      String,
    pub weight:           f64,
    pub home_team:        String,
    pub away_team:        String,
    pub goals_home:       u32,
    pub goals_away:       u32,
    pub minute:           u32,
    pub score:            u32,
    pub confidence_level: ConfidenceLevel,
    pub gold:             bool,
    pub criteria:         Vec<String>,
    pub home:             RadarStats,
    pub away:             RadarStats,
    pub rds_home:         f64,
    pub rds_away:         f64,
    pub odds:             Option<MatchOdds>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub mode:        ScanMode,
    pub total_games: usize,
    pub games:       Vec<RadarGame>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceEntry {
    pub timestamp:        DateTime<Utc>,
    pub mode:             ScanMode,
    pub league_id:        u32,
    pub league_name:      String,
    pub fixture_id:       u64,
    pub minute:           u32,
    pub score:            u32,
    pub confidence_level: ConfidenceLevel,
    pub gold:             bool,
}

/// Per-fixture alert bookkeeping across scans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameState {
    pub league_id:         u32,
    pub minute:            u32,
    pub last_alert_minute: u32,
    pub had_good_profile:  bool,
    pub notified_start:    bool,
}

impl GameState {
    /// True once, for the first scan that sees the fixture in minutes 1–5.
    pub fn take_start_alert(&mut self, minute: u32) -> bool {
        self.minute = minute;
        if (1..=5).contains(&minute) && !self.notified_start {
            self.notified_start = true;
            return true;
        }
        false
    }

    /// True when a fixture that used to pass the filter no longer does.
    pub fn take_cancel_alert(&mut self, passed: bool) -> bool {
        if self.had_good_profile && !passed {
            self.had_good_profile = false;
            return true;
        }
        false
    }

    /// True once, inside the 60–62 minute window.
    pub fn take_sixty_alert(&mut self, minute: u32) -> bool {
        if (60..=62).contains(&minute) && self.last_alert_minute < 60 {
            self.last_alert_minute = minute;
            return true;
        }
        false
    }
}

fn scoreline(f: &ApiFixture) -> String {
    format!("{} x {}", f.goals.home.unwrap_or(0), f.goals.away.unwrap_or(0))
}

pub struct RadarScanner {
    api:         FootballClient,
    logger:      EventLogger,
    notifier:    Option<TelegramNotifier>,
    states:      HashMap<u64, GameState>,
    performance: VecDeque<PerformanceEntry>,
}

impl RadarScanner {
    pub fn new(api: FootballClient, log_dir: impl Into<std::path::PathBuf>, notifier: Option<TelegramNotifier>) -> Self {
        Self {
            api,
            logger: EventLogger::new(log_dir),
            notifier,
            states: HashMap::new(),
            performance: VecDeque::new(),
        }
    }

    /// Most recent performance rows, oldest first.
    pub fn performance(&self, limit: usize) -> Vec<PerformanceEntry> {
        let skip = self.performance.len().saturating_sub(limit);
        self.performance.iter().skip(skip).cloned().collect()
    }

    pub fn performance_len(&self) -> usize {
        self.performance.len()
    }

    fn state(&mut self, league_id: u32, fixture_id: u64) -> &mut GameState {
        self.states.entry(fixture_id).or_insert_with(|| GameState { league_id, ..GameState::default() })
    }

    /// Forgets the league's fixtures that left its live list.
    fn prune_states(&mut self, league_id: u32, live: &HashSet<u64>) {
        let before = self.states.len();
        self.states.retain(|id, s| s.league_id != league_id || live.contains(id));
        let dropped = before - self.states.len();
        if dropped > 0 {
            debug!("radar league {league_id}: {dropped} finished fixture(s) forgotten");
        }
    }

    fn record_performance(&mut self, entry: PerformanceEntry) {
        self.performance.push_back(entry);
        while self.performance.len() > PERFORMANCE_LOG_CAP {
            self.performance.pop_front();
        }
    }

    async fn alert(&self, fixture_id: u64, kind: &str, message: String) {
        self.logger.record(&RadarAlertEvent {
            ts: now_iso(),
            event: "RADAR_ALERT",
            fixture_id,
            kind: kind.to_string(),
            message: message.clone(),
        });
        match &self.notifier {
            Some(n) => n.send(&message).await,
            None => debug!("Telegram disabled, {kind} alert for {fixture_id} only logged"),
        }
    }

    pub async fn scan(&mut self, req: &ScanRequest, now: DateTime<Utc>) -> Result<ScanReport> {
        let leagues = select_leagues(&req.leagues);
        if leagues.is_empty() {
            bail!("Nenhuma liga válida selecionada");
        }

        let mut games = Vec::new();
        for league in &leagues {
            let found = match req.mode {
                ScanMode::Live => self.scan_live_league(league, req.min_score, now).await,
                ScanMode::PreLive => self.scan_pre_live_league(league, req.min_score, now).await,
            };
            match found {
                Ok(mut list) => games.append(&mut list),
                Err(e) => warn!("radar league {} ({}) failed: {e:#}", league.id, league.name),
            }
        }

        games.sort_by(|a, b| b.score.cmp(&a.score));
        games.truncate(req.max_games);

        if req.mode == ScanMode::Live {
            self.consolidated_alert(&games, now).await;
        }

        info!(mode = ?req.mode, leagues = leagues.len(), games = games.len(), "radar scan finished");
        Ok(ScanReport { mode: req.mode, total_games: games.len(), games })
    }

    async fn scan_live_league(&mut self, league: &RadarLeague, min_score: u32, now: DateTime<Utc>) -> Result<Vec<RadarGame>> {
        let fixtures = self.api.live_fixtures(Some(league.id)).await?;
        let live: HashSet<u64> = fixtures.iter().map(|f| f.id()).collect();
        self.prune_states(league.id, &live);
        let mut games = Vec::new();

        for fixture in &fixtures {
            let id = fixture.id();
            let minute = fixture.elapsed();
            let header = format!(
                "⚽ {} vs {}\n🏆 Liga: {}\n⏱️ Minuto: {minute}'\n📊 Placar: {}",
                fixture.teams.home.name,
                fixture.teams.away.name,
                league.name,
                scoreline(fixture)
            );

            let start = self.state(league.id, id).take_start_alert(minute);
            if start {
                let msg = format!(
                    "🟢 *JOGO INICIADO – MONITORANDO PARA HA+*\n\n{header}\n\n🔍 Sistema monitorando estatísticas para detectar oportunidades de HA+"
                );
                self.alert(id, "GAME_STARTED", msg).await;
            }

            let stats = self.api.statistics(id).await;
            if stats.len() < 2 {
                debug!("fixture {id}: statistics incomplete, skipped");
                continue;
            }
            let events = self.api.events(id).await;

            let home = RadarStats::from(&team_stats(&stats[0].statistics));
            let away = RadarStats::from(&team_stats(&stats[1].statistics));
            let red_away = count_cards(&events, fixture.teams.away.id, "Red Card");
            let rds_home = radar_rds(&home);
            let rds_away = radar_rds(&away);

            let filter = mini_filter(&home, &away, rds_home, rds_away, red_away);
            let cancelled = self.state(league.id, id).take_cancel_alert(filter.passed);
            if cancelled {
                let msg = format!(
                    "❌ *SINAL CANCELADO – JOGO PERDEU PERFIL DE HA+*\n\n{header}\n\n⚠️ Motivo: {}",
                    filter.reasons.join(", ")
                );
                self.alert(id, "SIGNAL_CANCELLED", msg).await;
            }
            if !filter.passed {
                continue;
            }

            let odds = fixture.match_odds();
            let result = radar_score(&LiveRadarInputs {
                home,
                away,
                rds_home,
                rds_away,
                goals_home: fixture.goals.home.unwrap_or(0),
                goals_away: fixture.goals.away.unwrap_or(0),
                minute,
                weight: league.weight,
                odds,
            });
            let level = ConfidenceLevel::of(result.score);

            let sixty = self.state(league.id, id).take_sixty_alert(minute);
            if sixty {
                let enter = result.score >= ALERT_SCORE || result.gold;
                let body = if enter {
                    format!(
                        "Score Radar: {} ({})\nRDS: {rds_home:.0} x {rds_away:.0} (diferença: {:.0})\nFinalizações no alvo: {} x {}\n{}Critérios: {}",
                        result.score,
                        level.label(),
                        rds_away - rds_home,
                        home.shots_on_target,
                        away.shots_on_target,
                        if result.gold { "🏆 GOLD SIGNAL ATIVO\n" } else { "" },
                        result.criteria.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
                    )
                } else {
                    format!(
                        "Score Radar abaixo do mínimo: {}\nEstatísticas não atingiram critérios suficientes para entrada segura.",
                        result.score
                    )
                };
                let msg = format!(
                    "⏱️ *60' – ANÁLISE FILTRO CAMPEÃO*\n\n{header}\n\n❓ *Recomenda entrar?* {}\n\n📊 *Justificativa:*\n{body}",
                    if enter { "✅ SIM" } else { "⚠️ NÃO" }
                );
                self.alert(id, "ANALYSIS_60", msg).await;
            }

            if result.score < min_score && !result.gold {
                continue;
            }
            if let Some(state) = self.states.get_mut(&id) {
                state.had_good_profile = true;
            }

            let mut criteria = filter.reasons;
            criteria.extend(result.criteria);
            let game = RadarGame {
                fixture_id:       id,
                league_id:        league.id,
                league_name:      league.name.to_string(),
                weight:           league.weight,
                home_team:        fixture.teams.home.name.clone(),
                away_team:        fixture.teams.away.name.clone(),
                goals_home:       fixture.goals.home.unwrap_or(0),
                goals_away:       fixture.goals.away.unwrap_or(0),
                minute,
                score:            result.score,
                confidence_level: level,
                gold:             result.gold,
                criteria,
                home,
                away,
                rds_home,
                rds_away,
                odds,
            };
            self.accept(&game, ScanMode::Live, now);
            games.push(game);
        }

        Ok(games)
    }

    async fn scan_pre_live_league(&mut self, league: &RadarLeague, min_score: u32, now: DateTime<Utc>) -> Result<Vec<RadarGame>> {
        let fixtures = self.api.fixtures_by_date(now.date_naive(), league.id).await?;
        let mut games = Vec::new();

        for fixture in &fixtures {
            let Some(odds) = fixture.match_odds() else { continue };
            let result = pre_live_score(&odds, league.weight);
            if result.score < min_score && !result.gold {
                continue;
            }
            let game = RadarGame {
                fixture_id:       fixture.id(),
                league_id:        league.id,
                league_name:      league.name.to_string(),
                weight:           league.weight,
                home_team:        fixture.teams.home.name.clone(),
                away_team:        fixture.teams.away.name.clone(),
                goals_home:       0,
                goals_away:       0,
                minute:           0,
                score:            result.score,
                confidence_level: ConfidenceLevel::of(result.score),
                gold:             result.gold,
                criteria:         result.criteria,
                home:             RadarStats::default(),
                away:             RadarStats::default(),
                rds_home:         0.0,
                rds_away:         0.0,
                odds:             Some(odds),
            };
            self.accept(&game, ScanMode::PreLive, now);
            games.push(game);
        }

        Ok(games)
    }

    fn accept(&mut self, game: &RadarGame, mode: ScanMode, now: DateTime<Utc>) {
        self.logger.record(&RadarSignalEvent {
            ts:         now_iso(),
            event:      "RADAR_SIGNAL",
            fixture_id: game.fixture_id,
            league_id:  game.league_id,
            home:       game.home_team.clone(),
            away:       game.away_team.clone(),
            minute:     game.minute,
            score:      game.score as f64,
            level:      game.confidence_level.label().to_string(),
            gold:       game.gold,
        });
        self.record_performance(PerformanceEntry {
            timestamp:        now,
            mode,
            league_id:        game.league_id,
            league_name:      game.league_name.clone(),
            fixture_id:       game.fixture_id,
            minute:           game.minute,
            score:            game.score,
            confidence_level: game.confidence_level,
            gold:             game.gold,
        });
    }

    async fn consolidated_alert(&self, games: &[RadarGame], now: DateTime<Utc>) {
        let Some(message) = consolidated_message(games, now) else { return };
        let first = games.iter().find(|g| g.gold || g.score >= ALERT_SCORE).map_or(0, |g| g.fixture_id);
        self.alert(first, "CONSOLIDATED", message).await;
    }
}

/// One message for every gold signal or score at or above [`ALERT_SCORE`];
/// `None` when nothing qualifies.
pub fn consolidated_message(games: &[RadarGame], now: DateTime<Utc>) -> Option<String> {
    let hot: Vec<&RadarGame> = games.iter().filter(|g| g.gold || g.score >= ALERT_SCORE).collect();
    if hot.is_empty() {
        return None;
    }

    let mut msg = String::from("🚨 *RADAR FILTRO CAMPEÃO – ALERTA AO VIVO* 🚨\n\n");
    for (i, g) in hot.iter().enumerate() {
        msg.push_str(&format!("*{}. {}*\n", i + 1, g.league_name));
        msg.push_str(&format!("⚽ {} {} x {} {}\n", g.home_team, g.goals_home, g.goals_away, g.away_team));
        msg.push_str(&format!("⏱️ Minuto: {}'\n", g.minute));
        msg.push_str(&format!("📊 Score Radar: *{}* ({})\n", g.score, g.confidence_level.label()));
        if g.gold {
            msg.push_str("🏆 *GOLD SIGNAL ATIVO*\n");
        }
        let top: Vec<&str> = g.criteria.iter().take(3).map(String::as_str).collect();
        if !top.is_empty() {
            msg.push_str(&format!("✅ Critérios: {}\n", top.join(", ")));
        }
        msg.push('\n');
    }
    msg.push_str(&format!("📈 Total de alertas: {}\n", hot.len()));
    msg.push_str(&format!("🕐 {}", now.format("%d/%m/%Y %H:%M:%S UTC")));
    Some(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn game(fixture_id: u64, score: u32, gold: bool) -> RadarGame {
        RadarGame {
            fixture_id,
            league_id:        71,
            league_name:      "Brasileirão A".into(),
            weight:           1.0,
            home_team:        "Botafogo".into(),
            away_team:        "Santos".into(),
            goals_home:       1,
            goals_away:       1,
            minute:           64,
            score,
            confidence_level: ConfidenceLevel::of(score),
            gold,
            criteria:         vec!["✅ Posse ≥ 40%".into(), "Placar empatado (favorável)".into()],
            home:             RadarStats::default(),
            away:             RadarStats::default(),
            rds_home:         40.0,
            rds_away:         38.0,
            odds:             None,
        }
    }

    #[test]
    fn start_alert_fires_once_in_window() {
        let mut s = GameState::default();
        assert!(!s.take_start_alert(0));
        assert!(s.take_start_alert(3));
        assert!(!s.take_start_alert(4));
    }

    #[test]
    fn cancel_needs_a_previous_good_profile() {
        let mut s = GameState::default();
        assert!(!s.take_cancel_alert(false));
        s.had_good_profile = true;
        assert!(!s.take_cancel_alert(true));
        assert!(s.take_cancel_alert(false));
        assert!(!s.take_cancel_alert(false));
    }

    #[test]
    fn sixty_alert_window() {
        let mut s = GameState::default();
        assert!(!s.take_sixty_alert(59));
        assert!(s.take_sixty_alert(61));
        assert!(!s.take_sixty_alert(62));
        assert_eq!(s.last_alert_minute, 61);
    }

    #[test]
    fn consolidated_only_for_hot_games() {
        let now = Utc.with_ymd_and_hms(2026, 9, 6, 21, 30, 0).unwrap();
        assert!(consolidated_message(&[game(1, 70, false)], now).is_none());

        let msg = consolidated_message(&[game(1, 70, false), game(2, 60, true), game(3, 81, false)], now).unwrap();
        assert!(msg.contains("*1. Brasileirão A*"));
        assert!(msg.contains("📊 Score Radar: *81* (Alto)"));
        assert!(msg.contains("Total de alertas: 2"));
        assert_eq!(msg.matches("GOLD SIGNAL ATIVO").count(), 1);
    }

    #[test]
    fn finished_fixtures_are_forgotten_per_league() {
        let api = FootballClient::new("k", "http://127.0.0.1:9");
        let dir = std::env::temp_dir().join(format!("filtro-radar-prune-{}", std::process::id()));
        let mut scanner = RadarScanner::new(api, &dir, None);

        scanner.state(71, 1).take_start_alert(3);
        scanner.state(71, 2).had_good_profile = true;
        scanner.state(128, 3).take_sixty_alert(61);

        scanner.prune_states(71, &HashSet::from([2]));
        let mut left: Vec<u64> = scanner.states.keys().copied().collect();
        left.sort();
        assert_eq!(left, vec![2, 3]);
        assert!(scanner.states[&2].had_good_profile);

        // an empty live list for a league clears it
        scanner.prune_states(128, &HashSet::new());
        assert_eq!(scanner.states.keys().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(scanner.state(71, 2).league_id, 71);
    }

    #[test]
    fn performance_log_is_capped() {
        let api = FootballClient::new("k", "http://127.0.0.1:9");
        let dir = std::env::temp_dir().join(format!("filtro-radar-{}", std::process::id()));
        let mut scanner = RadarScanner::new(api, &dir, None);
        let now = Utc::now();
        for id in 0..(PERFORMANCE_LOG_CAP as u64 + 25) {
            scanner.accept(&game(id, 72, false), ScanMode::Live, now);
        }
        assert_eq!(scanner.performance_len(), PERFORMANCE_LOG_CAP);
        let recent = scanner.performance(100);
        assert_eq!(recent.len(), 100);
        assert_eq!(recent.last().map(|p| p.fixture_id), Some(PERFORMANCE_LOG_CAP as u64 + 24));
        std::fs::remove_dir_all(&dir).ok();
    }
}
