pub mod pages;
pub mod values;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::types::{PlayerRecord, ScrapeTarget, TeamLink};

/// One network fetch plus parse for one target.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, target: &ScrapeTarget) -> std::result::Result<PlayerRecord, FetchError>;
}

/// Page fetcher over a shared `reqwest::Client`. The client carries the
/// per-request timeout, so a hung server surfaces as a `Network` error.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .user_agent(cfg.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` and return the body. Non-2xx is a failure.
    pub async fn get_page(&self, url: &str) -> std::result::Result<String, FetchError> {
        let network = |source: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let resp = self.client.get(url).send().await.map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        let body = resp.text().await.map_err(network)?;
        debug!(url, bytes = body.len(), "fetched page");
        Ok(body)
    }

    /// League overview page → teams in its standings table.
    pub async fn fetch_league(&self, url: &str) -> std::result::Result<Vec<TeamLink>, FetchError> {
        let body = self.get_page(url).await?;
        pages::parse_league_page(&body, url)
    }

    /// Squad page → player page URLs.
    pub async fn fetch_squad(&self, team: &TeamLink) -> std::result::Result<Vec<String>, FetchError> {
        let body = self.get_page(&team.squad_url).await?;
        pages::parse_squad_page(&body, &team.squad_url)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &ScrapeTarget) -> std::result::Result<PlayerRecord, FetchError> {
        let body = self.get_page(&target.url).await?;
        pages::parse_player_page(&body, target)
    }
}
