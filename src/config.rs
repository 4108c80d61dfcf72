use std::time::Duration;

use crate::error::{AppError, Result};

/// League overview pages walked by discovery when no `--league` is given.
pub const DEFAULT_LEAGUE_URLS: &[&str] = &[
    "https://www.fotmob.com/leagues/53/overview/ligue-1",
    "https://www.fotmob.com/leagues/47/overview/premier-league",
    "https://www.fotmob.com/leagues/87/overview/laliga",
    "https://www.fotmob.com/leagues/54/overview/bundesliga",
    "https://www.fotmob.com/leagues/55/overview/serie-a",
];

/// Worker count when `--max-workers` is not given.
pub const DEFAULT_MAX_WORKERS: usize = 3;

/// Per-request timeout (seconds). The only guard against a hung worker.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// How long a connection waits on a locked database before giving up.
pub const DB_BUSY_TIMEOUT_SECS: u64 = 30;

/// How often the coordinator logs a progress line while a run is in flight.
pub const PROGRESS_LOG_INTERVAL_SECS: u64 = 30;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Per-request timeout in seconds (REQUEST_TIMEOUT_SECS)
    pub request_timeout_secs: u64,
    /// User-Agent header sent with every page request (USER_AGENT)
    pub user_agent: String,
    /// League overview URLs for discovery. Overridden by `--league`.
    pub league_urls: Vec<String>,
    pub max_workers: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "footgraph.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .map_err(|_| {
                    AppError::Config("REQUEST_TIMEOUT_SECS must be a whole number of seconds".to_string())
                })?,
            user_agent: std::env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            league_urls: DEFAULT_LEAGUE_URLS.iter().map(|s| s.to_string()).collect(),
            max_workers: DEFAULT_MAX_WORKERS,
        })
    }

    /// Apply `--max-workers`. Zero workers could never drain the queue.
    pub fn with_max_workers(mut self, max_workers: usize) -> Result<Self> {
        if max_workers == 0 {
            return Err(AppError::Config("--max-workers must be at least 1".to_string()));
        }
        self.max_workers = max_workers;
        Ok(self)
    }

    /// Apply `--league`. An empty list keeps the defaults.
    pub fn with_leagues(mut self, leagues: Vec<String>) -> Result<Self> {
        if leagues.is_empty() {
            return Ok(self);
        }
        if let Some(bad) = leagues.iter().find(|u| !u.starts_with("http://") && !u.starts_with("https://")) {
            return Err(AppError::Config(format!("--league must be an http(s) URL, got {bad:?}")));
        }
        self.league_urls = leagues;
        Ok(self)
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(p) = port {
            self.api_port = p;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.db_path)
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            log_level: "debug".to_string(),
            db_path: ":memory:".to_string(),
            api_port: 0,
            request_timeout_secs: 2,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            league_urls: Vec::new(),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_workers_is_a_configuration_error() {
        let err = Config::for_tests().with_max_workers(0).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn league_override_replaces_defaults_and_rejects_non_urls() {
        let cfg = Config::for_tests()
            .with_leagues(vec!["https://example.com/leagues/1/overview/x".to_string()])
            .unwrap();
        assert_eq!(cfg.league_urls.len(), 1);

        let err = Config::for_tests().with_leagues(vec!["premier-league".to_string()]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
