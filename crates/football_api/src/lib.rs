/// Filtro Live — API-Football client
///
/// Thin adapter over v3.football.api-sports.io:
///   - fixed retry policy on every request (3 attempts, 3 s apart by default)
///   - mandatory fixture lookup, best-effort statistics and events
///   - mapping of box scores into `ha_engine::MatchStatSnapshot`

pub mod model;

pub use model::{
    build_snapshot, find_team_fixture, fold_name, ApiEvent, ApiFixture, LiveFixtureSummary, MatchOdds,
    TeamStatistics,
};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use ha_engine::MatchStatSnapshot;
use model::Envelope;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://v3.football.api-sports.io";
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

pub struct FootballClient {
    client:      reqwest::Client,
    base_url:    String,
    api_key:     String,
    retries:     u32,
    retry_delay: Duration,
}

impl FootballClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client:      reqwest::Client::new(),
            base_url:    base_url.into().trim_end_matches('/').to_string(),
            api_key:     api_key.into(),
            retries:     DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry(mut self, retries: u32, retry_delay: Duration) -> Self {
        self.retries = retries.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// GET `{base}/{path}` with the API key. Non-2xx and network failures are
    /// retried after a fixed delay; the last error is returned.
    pub async fn fetch_with_retry(&self, path: &str) -> Result<serde_json::Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut last_err = anyhow!("no attempt made");

        for attempt in 1..=self.retries {
            let sent = self
                .client
                .get(&url)
                .header("x-apisports-key", &self.api_key)
                .header("Accept", "application/json")
                .send()
                .await;

            match sent {
                Ok(resp) if resp.status().is_success() => {
                    return resp.json().await.with_context(|| format!("API-Football JSON parse failed: {path}"));
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    let head: String = body.chars().take(200).collect();
                    last_err = anyhow!("HTTP {status}: {head}");
                }
                Err(e) => last_err = anyhow!(e),
            }

            warn!("API-Football {path} attempt {attempt}/{} failed: {last_err}", self.retries);
            if attempt < self.retries {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(last_err.context(format!("API-Football {path} failed after {} attempts", self.retries)))
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let raw = self.fetch_with_retry(path).await?;
        let envelope: Envelope<T> =
            serde_json::from_value(raw).with_context(|| format!("API-Football {path} shape mismatch"))?;
        debug!("API-Football {path}: {} entries", envelope.response.len());
        Ok(envelope.response)
    }

    /// Live fixtures, optionally for one league.
    pub async fn live_fixtures(&self, league: Option<u32>) -> Result<Vec<ApiFixture>> {
        let path = match league {
            Some(id) => format!("fixtures?live=all&league={id}"),
            None => "fixtures?live=all".to_string(),
        };
        self.get_list(&path).await
    }

    pub async fn fixtures_by_date(&self, date: NaiveDate, league: u32) -> Result<Vec<ApiFixture>> {
        self.get_list(&format!("fixtures?date={}&league={league}", date.format("%Y-%m-%d"))).await
    }

    /// First live fixture where either team name contains `team`, ignoring
    /// case and accents.
    pub async fn find_live_fixture(&self, team: &str) -> Result<Option<ApiFixture>> {
        let fixtures = self.live_fixtures(None).await?;
        Ok(find_team_fixture(&fixtures, team).cloned())
    }

    /// Mandatory lookup: `Ok(None)` when the provider does not know the id.
    pub async fn fixture(&self, fixture_id: u64) -> Result<Option<ApiFixture>> {
        let mut found: Vec<ApiFixture> = self.get_list(&format!("fixtures?id={fixture_id}")).await?;
        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }

    /// Best effort: a failure is logged and yields no sections.
    pub async fn statistics(&self, fixture_id: u64) -> Vec<TeamStatistics> {
        match self.get_list(&format!("fixtures/statistics?fixture={fixture_id}")).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("statistics for fixture {fixture_id} unavailable: {e:#}");
                Vec::new()
            }
        }
    }

    /// Best effort, like [`statistics`](Self::statistics).
    pub async fn events(&self, fixture_id: u64) -> Vec<ApiEvent> {
        match self.get_list(&format!("fixtures/events?fixture={fixture_id}")).await {
            Ok(events) => events,
            Err(e) => {
                warn!("events for fixture {fixture_id} unavailable: {e:#}");
                Vec::new()
            }
        }
    }

    /// Current snapshot of a fixture; `Ok(None)` when the fixture is unknown.
    pub async fn snapshot(&self, fixture_id: u64) -> Result<Option<MatchStatSnapshot>> {
        let Some(fixture) = self.fixture(fixture_id).await? else {
            return Ok(None);
        };
        let stats = self.statistics(fixture_id).await;
        let events = self.events(fixture_id).await;
        let snapshot = build_snapshot(&fixture, &stats, &events);
        info!(
            fixture_id,
            minute = snapshot.minute,
            sections = stats.len(),
            events = events.len(),
            "{} vs {} snapshot built",
            snapshot.home_team, snapshot.away_team
        );
        Ok(Some(snapshot))
    }
}
