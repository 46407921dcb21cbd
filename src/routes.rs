//! JSON endpoints of `filtro-server`.

use crate::http::{Request, Response};
use chrono::{DateTime, Duration, Utc};
use football_api::FootballClient;
use ha_engine::thresholds::{HISTORY_LEN, SESSION_TTL_HOURS};
use ha_engine::validation::validate_live_input;
use ha_engine::{
    analyze_pregame, combine_signals, evaluate_direction, AnalysisResult, Decision, FullTimeData, HaEngine,
    HandicapLine, LiveAnalysisInput, MatchStatSnapshot, Mode, PregameInput, Profile,
};
use logger::{
    now_iso, EventLogger, HalfTimeSnapshotEvent, LiveAnalysisEvent, PregameAnalysisEvent, TelegramNotifier,
};
use radar::{select_leagues, RadarScanner, ScanRequest};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::VecDeque;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Radar performance rows returned by `/api/radar/performance`.
const PERFORMANCE_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Upstream(String),
    #[error("API_FOOTBALL_KEY not configured")]
    NotConfigured,
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Upstream(_) | ApiError::NotConfigured => 500,
        }
    }

    fn upstream(e: anyhow::Error) -> Self {
        ApiError::Upstream(format!("{e:#}"))
    }
}

impl From<ApiError> for Response {
    fn from(e: ApiError) -> Self {
        Response::json(e.status(), &json!({ "error": e.to_string() }))
    }
}

pub struct AppState {
    pub engine:   Mutex<HaEngine>,
    pub history:  Mutex<VecDeque<AnalysisResult>>,
    pub api:      Option<FootballClient>,
    pub radar:    Option<Mutex<RadarScanner>>,
    pub logger:   EventLogger,
    pub notifier: Option<TelegramNotifier>,
}

impl AppState {
    pub fn new(
        engine: HaEngine,
        api: Option<FootballClient>,
        radar: Option<RadarScanner>,
        logger: EventLogger,
        notifier: Option<TelegramNotifier>,
    ) -> Self {
        Self {
            engine: Mutex::new(engine),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_LEN)),
            api,
            radar: radar.map(Mutex::new),
            logger,
            notifier,
        }
    }

    fn api(&self) -> Result<&FootballClient, ApiError> {
        self.api.as_ref().ok_or(ApiError::NotConfigured)
    }

    async fn remember(&self, result: &AnalysisResult) {
        let mut history = self.history.lock().await;
        history.push_back(result.clone());
        while history.len() > HISTORY_LEN {
            history.pop_front();
        }
    }

    /// Newest result, if it is younger than the session TTL.
    pub async fn latest_session(&self, now: DateTime<Utc>) -> Option<AnalysisResult> {
        let history = self.history.lock().await;
        history
            .back()
            .filter(|r| now - r.created_at < Duration::hours(SESSION_TTL_HOURS))
            .cloned()
    }
}

fn parse_body<T: DeserializeOwned>(req: &Request) -> Result<T, ApiError> {
    let body: &[u8] = if req.body.iter().all(u8::is_ascii_whitespace) { b"{}" } else { &req.body };
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("JSON inválido: {e}")))
}

#[derive(Debug, Deserialize)]
struct SnapshotSource {
    #[serde(default)]
    snapshot:   Option<MatchStatSnapshot>,
    #[serde(default)]
    fixture_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct LiveAnalysisRequest {
    #[serde(flatten)]
    source:    SnapshotSource,
    #[serde(default)]
    team_name: String,
    #[serde(default)]
    line:      String,
    #[serde(default)]
    odd:       f64,
    #[serde(default)]
    mode:      Mode,
    #[serde(default)]
    profile:   Profile,
}

#[derive(Debug, Deserialize)]
struct CombineRequest {
    pregame: Decision,
    live:    Decision,
}

#[derive(Debug, Deserialize)]
struct DirectionRequest {
    line:           String,
    #[serde(default)]
    recommendation: String,
    full_time:      FullTimeData,
}

/// Inline snapshot wins; otherwise the fixture is fetched upstream.
async fn resolve_snapshot(state: &AppState, source: SnapshotSource) -> Result<MatchStatSnapshot, ApiError> {
    if let Some(snapshot) = source.snapshot {
        return Ok(snapshot);
    }
    let Some(fixture_id) = source.fixture_id else {
        return Err(ApiError::BadRequest("Informe snapshot ou fixture_id".to_string()));
    };
    state
        .api()?
        .snapshot(fixture_id)
        .await
        .map_err(ApiError::upstream)?
        .ok_or_else(|| ApiError::NotFound(format!("Jogo {fixture_id} não encontrado")))
}

pub async fn route(state: &AppState, req: &Request) -> Response {
    match dispatch(state, req).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!("{} {} -> {}: {}", req.method, req.path, e.status(), e);
            e.into()
        }
    }
}

async fn dispatch(state: &AppState, req: &Request) -> Result<Response, ApiError> {
    let segments: Vec<&str> = req.path.split('/').filter(|s| !s.is_empty()).collect();

    match (req.method.as_str(), segments.as_slice()) {
        ("GET", ["health"]) => Ok(Response::text(200, "ok")),
        ("GET", ["api", "live-fixture"]) => live_fixture(state, req).await,
        ("GET", ["api", "fixture", id, "snapshot"]) => fixture_snapshot(state, id).await,
        ("POST", ["api", "halftime"]) => half_time(state, req).await,
        ("POST", ["api", "analyze", "live"]) => analyze_live(state, req).await,
        ("POST", ["api", "analyze", "pregame"]) => pregame(state, req),
        ("POST", ["api", "combine"]) => {
            let body: CombineRequest = parse_body(req)?;
            Ok(Response::json(200, &combine_signals(&body.pregame, &body.live)))
        }
        ("POST", ["api", "evaluate-direction"]) => direction(req),
        ("GET", ["api", "history"]) => {
            let history = state.history.lock().await;
            let newest_first: Vec<&AnalysisResult> = history.iter().rev().collect();
            Ok(Response::json(200, &newest_first))
        }
        ("GET", ["api", "session", "latest"]) => match state.latest_session(Utc::now()).await {
            Some(result) => Ok(Response::json(200, &result)),
            None => Err(ApiError::NotFound("Nenhuma sessão ativa nas últimas 4 horas".to_string())),
        },
        ("POST", ["api", "radar", "scan"]) => radar_scan(state, req).await,
        ("GET", ["api", "radar", "performance"]) => {
            let radar = state.radar.as_ref().ok_or(ApiError::NotConfigured)?;
            let rows = radar.lock().await.performance(PERFORMANCE_PAGE);
            Ok(Response::json(200, &rows))
        }
        _ => Err(ApiError::NotFound(format!("{} {} não existe", req.method, req.path))),
    }
}

async fn live_fixture(state: &AppState, req: &Request) -> Result<Response, ApiError> {
    let team = req.query.get("team").map(|t| t.trim()).unwrap_or_default();
    if team.is_empty() {
        return Err(ApiError::BadRequest("Parâmetro team obrigatório".to_string()));
    }
    let found = state.api()?.find_live_fixture(team).await.map_err(ApiError::upstream)?;
    match found {
        Some(fixture) => Ok(Response::json(200, &fixture.summary())),
        None => Err(ApiError::NotFound(format!("Nenhum jogo ao vivo encontrado para {team}"))),
    }
}

async fn fixture_snapshot(state: &AppState, id: &str) -> Result<Response, ApiError> {
    let fixture_id: u64 = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("fixture id inválido: {id}")))?;
    let snapshot = resolve_snapshot(state, SnapshotSource { snapshot: None, fixture_id: Some(fixture_id) }).await?;
    Ok(Response::json(200, &snapshot))
}

async fn half_time(state: &AppState, req: &Request) -> Result<Response, ApiError> {
    let source: SnapshotSource = parse_body(req)?;
    let stats = resolve_snapshot(state, source).await?;
    let snapshot = state.engine.lock().await.read_half_time(stats, Utc::now());

    state.logger.record(&HalfTimeSnapshotEvent {
        ts:         now_iso(),
        event:      "HALFTIME_SNAPSHOT",
        fixture_id: snapshot.fixture_id(),
        home:       snapshot.stats.home_team.clone(),
        away:       snapshot.stats.away_team.clone(),
        rds_home:   snapshot.rds_home,
        rds_away:   snapshot.rds_away,
        profile:    snapshot.profile.clone(),
    });
    Ok(Response::json(200, &snapshot))
}

async fn analyze_live(state: &AppState, req: &Request) -> Result<Response, ApiError> {
    let body: LiveAnalysisRequest = parse_body(req)?;
    let snapshot = resolve_snapshot(state, body.source).await?;

    let team = if body.team_name.trim().is_empty() { snapshot.away_team.clone() } else { body.team_name };
    validate_live_input(&team, &body.line, body.odd, snapshot.minute as i64)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let line: HandicapLine = body
        .line
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Linha HA+ inválida: {}", body.line)))?;

    let input = LiveAnalysisInput {
        snapshot,
        team_name: team,
        line,
        odd: body.odd,
        mode: body.mode,
        profile: body.profile,
    };
    let result = state.engine.lock().await.analyze_live(&input, Utc::now());

    state.logger.record(&LiveAnalysisEvent {
        ts:             now_iso(),
        event:          "LIVE_ANALYSIS",
        fixture_id:     result.fixture_id,
        team:           result.team_name.clone(),
        minute:         result.minute,
        score:          result.score.clone(),
        handicap:       result.decision.handicap_label(),
        odd:            result.decision.odd,
        ev:             result.decision.ev,
        confidence:     result.decision.confidence,
        aggro_level:    result.aggro_level.number(),
        red_flags:      result.metrics.gates.red_flags.len(),
        recommendation: result.decision.recommendation.clone(),
    });
    state.remember(&result).await;

    if result.decision.recommends() {
        info!(fixture_id = result.fixture_id, ev = result.decision.ev, "{}", result.decision.recommendation);
        if let Some(notifier) = state.notifier.clone() {
            let text = format!(
                "🎯 *{}*\n⏱️ {}' | {}\n📈 EV {:+.1}% | Confiança {:.0}%",
                result.decision.recommendation,
                result.minute,
                result.score,
                result.decision.ev,
                result.decision.confidence
            );
            tokio::spawn(async move { notifier.send(&text).await });
        }
    }

    Ok(Response::json(200, &result))
}

fn pregame(state: &AppState, req: &Request) -> Result<Response, ApiError> {
    let input: PregameInput = parse_body(req)?;
    let result = analyze_pregame(&input, Utc::now()).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state.logger.record(&PregameAnalysisEvent {
        ts:             now_iso(),
        event:          "PREGAME_ANALYSIS",
        home:           result.home_team.clone(),
        away:           result.away_team.clone(),
        league:         result.league.clone(),
        ha_line:        input.ha_line.clone(),
        ha_odd:         input.ha_odd,
        ev:             result.decision.ev,
        confidence:     result.decision.confidence,
        recommendation: result.decision.recommendation.clone(),
    });
    Ok(Response::json(200, &result))
}

fn direction(req: &Request) -> Result<Response, ApiError> {
    let body: DirectionRequest = parse_body(req)?;
    let line: HandicapLine = body
        .line
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Linha HA+ inválida: {}", body.line)))?;
    match evaluate_direction(line, &body.recommendation, &body.full_time) {
        Some(report) => Ok(Response::json(200, &report)),
        None => Err(ApiError::BadRequest(format!("Placar final inválido: {}", body.full_time.final_score))),
    }
}

async fn radar_scan(state: &AppState, req: &Request) -> Result<Response, ApiError> {
    let scan: ScanRequest = parse_body(req)?;
    let radar = state.radar.as_ref().ok_or(ApiError::NotConfigured)?;
    if select_leagues(&scan.leagues).is_empty() {
        return Err(ApiError::BadRequest("Nenhuma liga válida selecionada".to_string()));
    }
    let report = radar.lock().await.scan(&scan, Utc::now()).await.map_err(ApiError::upstream)?;
    Ok(Response::json(200, &report))
}
