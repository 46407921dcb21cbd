/// Filtro Live — HA+ decision server
///
/// What it does:
///   1. Serves the HA+ engine as JSON endpoints (live, half-time, pre-game,
///      combination, settlement, history)
///   2. Pulls live box scores from API-Football when a fixture id is given
///   3. Runs the league radar on demand, alerting over Telegram
///
/// What it does NOT do: place bets. Every verdict is advisory.
///
/// Run:
///   cargo run --bin filtro-server

mod config;
mod http;
mod routes;

use anyhow::{Context, Result};
use config::ServerConfig;
use dotenv::dotenv;
use football_api::FootballClient;
use ha_engine::{EngineConfig, HaEngine};
use logger::{EventLogger, TelegramNotifier};
use radar::RadarScanner;
use routes::AppState;
use std::env;
use std::fs::File;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

async fn handle_connection(mut stream: TcpStream, state: Arc<AppState>) -> Result<()> {
    let Some(req) = http::read_request(&mut stream).await? else {
        return Ok(());
    };
    let resp = routes::route(&state, &req).await;
    debug!("{} {} -> {}", req.method, req.path, resp.status);
    resp.write_to(&mut stream).await
}

async fn serve(state: Arc<AppState>, bind: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind).await.context("http bind")?;
    info!("filtro-server listening on http://{}", bind);

    loop {
        let (stream, peer) = listener.accept().await.context("http accept")?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                debug!("http handler err {}: {}", peer, e);
            }
        });
    }
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

    let cfg = ServerConfig::from_env();

    info!("=== Filtro Live — HA+ decision server ===");
    info!("Mode: ADVISORY ONLY (no bets placed)");
    info!("Logs: {}", cfg.log_dir.display());

    // Single instance lock
    let lock_file_path = env::temp_dir().join("filtro_live_server.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another instance of filtro-server is already running! Exiting.");
            return Ok(());
        }
    };

    let notifier = TelegramNotifier::from_env();
    if notifier.is_none() {
        info!("Telegram disabled (TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set)");
    }

    let client = || {
        cfg.api_key.as_ref().map(|key| {
            FootballClient::new(key.clone(), cfg.api_base_url.clone())
                .with_retry(cfg.fetch_retries, cfg.fetch_retry_delay)
        })
    };
    let api = client();
    let radar = client().map(|api| RadarScanner::new(api, cfg.log_dir.clone(), notifier.clone()));
    match &api {
        Some(_) => info!(
            "API-Football: {} ({} attempts, {:?} apart)",
            cfg.api_base_url, cfg.fetch_retries, cfg.fetch_retry_delay
        ),
        None => warn!("API_FOOTBALL_KEY not set: fixture lookups and radar disabled"),
    }

    let engine = HaEngine::new(EngineConfig { lock_window_secs: cfg.lock_window_secs, ..EngineConfig::default() });
    info!("Lock window: {}s", cfg.lock_window_secs);

    let state = Arc::new(AppState::new(engine, api, radar, EventLogger::new(cfg.log_dir.clone()), notifier));
    serve(state, cfg.bind).await
}
