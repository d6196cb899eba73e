//! HTTP client for the chess.com published-data API

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Local};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::types::{GameArchive, RawGame};

use super::{FetchOutcome, GameSource};

/// Monthly archive URL for a player
///
/// `{base}/pub/player/{username}/games/{year}/{month:02}`
pub fn archive_url(base_url: &str, username: &str, year: i32, month: u32) -> String {
    format!(
        "{}/pub/player/{}/games/{}/{:02}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(username),
        year,
        month
    )
}

/// HTTP client for monthly game archives
pub struct ChessComClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ChessComClient {
    /// Create a new client from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("source.base_url is required".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| Error::Config(format!("invalid user_agent: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one month of games, swallowing failures
    pub async fn fetch_month(&self, username: &str, year: i32, month: u32) -> FetchOutcome {
        match self.request_month(username, year, month).await {
            Ok(games) => {
                tracing::debug!(
                    username = %username,
                    year,
                    month,
                    games = games.len(),
                    "Fetched game archive"
                );
                FetchOutcome::Games(games)
            }
            Err(e) => {
                tracing::warn!(
                    username = %username,
                    year,
                    month,
                    error = %e,
                    "Failed to fetch game archive"
                );
                FetchOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn request_month(&self, username: &str, year: i32, month: u32) -> Result<Vec<RawGame>> {
        let url = archive_url(&self.base_url, username, year, month);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Source(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| Error::Source(format!("failed to read response: {}", e)))?;
            let archive: GameArchive = serde_json::from_str(&body)?;
            Ok(archive.games)
        } else {
            Err(Error::Source(format!("API error ({})", status)))
        }
    }
}

#[async_trait]
impl GameSource for ChessComClient {
    /// Games for the current local calendar month
    async fn fetch_games(&self, username: &str) -> FetchOutcome {
        let now = Local::now();
        self.fetch_month(username, now.year(), now.month()).await
    }
}
