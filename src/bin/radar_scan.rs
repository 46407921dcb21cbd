/// Filtro Live — one-shot radar scan
///
/// Scans the radar leagues once and prints the report as JSON.
///
/// Run:
///   cargo run --bin radar-scan -- [live|pre_live] [min_score] [league,league,...]

use anyhow::{bail, Context, Result};
use chrono::Utc;
use dotenv::dotenv;
use football_api::{FootballClient, DEFAULT_BASE_URL};
use logger::TelegramNotifier;
use radar::{RadarScanner, ScanMode, ScanRequest};
use std::env;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn parse_args(args: &[String]) -> Result<ScanRequest> {
    let mut req = ScanRequest::default();
    if let Some(mode) = args.first() {
        req.mode = match mode.as_str() {
            "live" => ScanMode::Live,
            "pre_live" | "preLive" => ScanMode::PreLive,
            other => bail!("unknown mode {other:?} (live | pre_live)"),
        };
    }
    if let Some(min) = args.get(1) {
        req.min_score = min.parse().with_context(|| format!("bad min_score {min:?}"))?;
    }
    if let Some(list) = args.get(2) {
        req.leagues = list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().parse::<u32>().with_context(|| format!("bad league id {s:?}")))
            .collect::<Result<_>>()?;
    }
    Ok(req)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let req = parse_args(&args)?;

    let key = env::var("API_FOOTBALL_KEY").context("API_FOOTBALL_KEY not configured")?;
    let base = env::var("API_FOOTBALL_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let retries = env::var("FETCH_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(3);
    let delay_ms = env::var("FETCH_RETRY_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(3000);
    let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

    let api = FootballClient::new(key, base).with_retry(retries, Duration::from_millis(delay_ms));
    let mut scanner = RadarScanner::new(api, log_dir, TelegramNotifier::from_env());

    info!(mode = ?req.mode, min_score = req.min_score, "radar scan starting");
    let report = scanner.scan(&req, Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_and_overrides() {
        let req = parse_args(&[]).unwrap();
        assert_eq!((req.mode, req.min_score, req.max_games), (ScanMode::Live, 70, 20));

        let req = parse_args(&args(&["pre_live", "60", "71, 128"])).unwrap();
        assert_eq!(req.mode, ScanMode::PreLive);
        assert_eq!(req.min_score, 60);
        assert_eq!(req.leagues, vec![71, 128]);

        assert!(parse_args(&args(&["later"])).is_err());
        assert!(parse_args(&args(&["live", "70", "71,x"])).is_err());
    }
}
