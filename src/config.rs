use football_api::{DEFAULT_BASE_URL, DEFAULT_RETRIES};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment-driven settings of `filtro-server`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind:              SocketAddr,
    pub api_key:           Option<String>,
    pub api_base_url:      String,
    pub fetch_retries:     u32,
    pub fetch_retry_delay: Duration,
    pub lock_window_secs:  i64,
    pub log_dir:           PathBuf,
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind:              env_parse("FILTRO_BIND", SocketAddr::from(([127, 0, 0, 1], 8090))),
            api_key:           env_nonempty("API_FOOTBALL_KEY"),
            api_base_url:      env_nonempty("API_FOOTBALL_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            fetch_retries:     env_parse("FETCH_RETRIES", DEFAULT_RETRIES),
            fetch_retry_delay: Duration::from_millis(env_parse("FETCH_RETRY_DELAY_MS", 3000)),
            lock_window_secs:  env_parse("LOCK_WINDOW_SECS", 180),
            log_dir:           PathBuf::from(env_nonempty("LOG_DIR").unwrap_or_else(|| "logs".to_string())),
        }
    }
}
