//! API-Football response shapes and their mapping onto engine snapshots.
//!
//! Upstream payloads are partial more often than not: every field a fixture
//! can live without defaults to zero or empty.

use ha_engine::{MatchStatSnapshot, TeamStats};
use serde::{Deserialize, Deserializer, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    #[serde(default = "Vec::new")]
    pub response: Vec<T>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct TeamRef {
    pub id:   u64,
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct FixtureStatus {
    pub short:   String,
    pub elapsed: Option<u32>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct FixtureInfo {
    pub id:     u64,
    pub date:   Option<String>,
    pub status: FixtureStatus,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LeagueInfo {
    pub id:     u32,
    pub name:   String,
    pub season: Option<u32>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Teams {
    pub home: TeamRef,
    pub away: TeamRef,
}

#[derive(Deserialize, Debug, Clone, Copy, Default)]
#[serde(default)]
pub struct Goals {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

/// Decimal odds arrive as either strings or numbers.
fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(value_as_f64(&value))
}

fn value_as_f64(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct OddValue {
    pub value: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub odd:   f64,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct FixtureOdds {
    pub values: Vec<OddValue>,
}

/// One entry of `fixtures?...`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ApiFixture {
    pub fixture: FixtureInfo,
    pub league:  LeagueInfo,
    pub teams:   Teams,
    pub goals:   Goals,
    pub odds:    Option<FixtureOdds>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct MatchOdds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl ApiFixture {
    pub fn id(&self) -> u64 {
        self.fixture.id
    }

    pub fn elapsed(&self) -> u32 {
        self.fixture.status.elapsed.unwrap_or(0)
    }

    /// 1X2 odds embedded in the fixture, when the provider sends them.
    pub fn match_odds(&self) -> Option<MatchOdds> {
        let values = &self.odds.as_ref()?.values;
        let home = values.first()?.odd;
        Some(MatchOdds {
            home,
            draw: values.get(1).map_or(0.0, |v| v.odd),
            away: values.get(2).map_or(0.0, |v| v.odd),
        })
    }

    pub fn summary(&self) -> LiveFixtureSummary {
        LiveFixtureSummary {
            fixture_id: self.fixture.id,
            home_team:  self.teams.home.name.clone(),
            away_team:  self.teams.away.name.clone(),
            status:     self.fixture.status.short.clone(),
            elapsed:    self.elapsed(),
            league:     self.league.name.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LiveFixtureSummary {
    pub fixture_id: u64,
    pub home_team:  String,
    pub away_team:  String,
    pub status:     String,
    pub elapsed:    u32,
    pub league:     String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct StatEntry {
    #[serde(rename = "type")]
    pub kind:  String,
    pub value: serde_json::Value,
}

/// One side of `fixtures/statistics`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct TeamStatistics {
    pub team:       TeamRef,
    pub statistics: Vec<StatEntry>,
}

/// One entry of `fixtures/events`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ApiEvent {
    #[serde(rename = "type")]
    pub kind:   String,
    pub detail: String,
    pub team:   TeamRef,
}

/// Named statistic as a number; absent, null and unparsable values are 0.
/// Percent strings (`"54%"`) are read without the `%`.
pub fn stat_value(entries: &[StatEntry], name: &str) -> f64 {
    entries
        .iter()
        .find(|e| e.kind == name)
        .map_or(0.0, |e| value_as_f64(&e.value))
}

fn stat_count(entries: &[StatEntry], name: &str) -> u32 {
    stat_value(entries, name).max(0.0).round() as u32
}

pub fn team_stats(entries: &[StatEntry]) -> TeamStats {
    let xg = entries
        .iter()
        .find(|e| e.kind == "expected_goals")
        .filter(|e| !e.value.is_null())
        .map(|e| value_as_f64(&e.value));

    TeamStats {
        goals:             0,
        shots_total:       stat_count(entries, "Total Shots"),
        shots_on_target:   stat_count(entries, "Shots on Goal"),
        possession:        stat_value(entries, "Ball Possession"),
        dangerous_attacks: stat_count(entries, "Dangerous Attacks"),
        corners:           stat_count(entries, "Corner Kicks"),
        fouls:             stat_count(entries, "Fouls"),
        yellow_cards:      stat_count(entries, "Yellow Cards"),
        red_cards:         stat_count(entries, "Red Cards"),
        xg,
    }
}

pub fn count_cards(events: &[ApiEvent], team_id: u64, detail: &str) -> u32 {
    events
        .iter()
        .filter(|e| e.kind == "Card" && e.detail == detail && e.team.id == team_id)
        .count() as u32
}

fn side_entries<'a>(stats: &'a [TeamStatistics], team_id: u64, fallback: usize) -> &'a [StatEntry] {
    stats
        .iter()
        .find(|s| s.team.id != 0 && s.team.id == team_id)
        .or_else(|| stats.get(fallback))
        .map(|s| s.statistics.as_slice())
        .unwrap_or(&[])
}

/// Builds the engine snapshot. Cards come from the event feed when it has
/// any events, otherwise from the statistics block.
pub fn build_snapshot(fixture: &ApiFixture, stats: &[TeamStatistics], events: &[ApiEvent]) -> MatchStatSnapshot {
    let (home_id, away_id) = (fixture.teams.home.id, fixture.teams.away.id);
    let mut home = team_stats(side_entries(stats, home_id, 0));
    let mut away = team_stats(side_entries(stats, away_id, 1));

    home.goals = fixture.goals.home.unwrap_or(0);
    away.goals = fixture.goals.away.unwrap_or(0);

    if !events.is_empty() {
        home.yellow_cards = count_cards(events, home_id, "Yellow Card");
        away.yellow_cards = count_cards(events, away_id, "Yellow Card");
        home.red_cards = count_cards(events, home_id, "Red Card");
        away.red_cards = count_cards(events, away_id, "Red Card");
    }

    MatchStatSnapshot {
        fixture_id: fixture.fixture.id,
        home_team:  fixture.teams.home.name.clone(),
        away_team:  fixture.teams.away.name.clone(),
        minute:     fixture.elapsed(),
        home,
        away,
    }
}

/// Lowercase with diacritics stripped, so "Grêmio" matches "gremio".
pub fn fold_name(name: &str) -> String {
    name.nfd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase()
}

/// First fixture where either side's name contains `team`.
pub fn find_team_fixture<'a>(fixtures: &'a [ApiFixture], team: &str) -> Option<&'a ApiFixture> {
    let needle = fold_name(team.trim());
    if needle.is_empty() {
        return None;
    }
    fixtures.iter().find(|f| {
        fold_name(&f.teams.home.name).contains(&needle) || fold_name(&f.teams.away.name).contains(&needle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_and_case() {
        assert_eq!(fold_name("Grêmio"), "gremio");
        assert_eq!(fold_name("SÃO PAULO"), "sao paulo");
        assert_eq!(fold_name("Atlético-MG"), "atletico-mg");
    }

    #[test]
    fn lenient_numbers() {
        let entries: Vec<StatEntry> = serde_json::from_str(
            r#"[{"type":"Ball Possession","value":"61%"},
                {"type":"Total Shots","value":12},
                {"type":"Fouls","value":null},
                {"type":"expected_goals","value":"1.37"}]"#,
        )
        .unwrap();
        assert_eq!(stat_value(&entries, "Ball Possession"), 61.0);
        assert_eq!(stat_value(&entries, "Total Shots"), 12.0);
        assert_eq!(stat_value(&entries, "Fouls"), 0.0);
        assert_eq!(stat_value(&entries, "Corner Kicks"), 0.0);
        assert_eq!(team_stats(&entries).xg, Some(1.37));
    }
}
