//! Game source adapter
//!
//! Fetches a player's games for the current calendar month.
//!
//! ## Fail-soft contract
//!
//! A source never returns an error. Transport failures, non-success statuses
//! and malformed payloads are logged and reported as [`FetchOutcome::Failed`],
//! which the polling loop treats as "nothing new this cycle". Callers that do
//! not care about the difference use [`FetchOutcome::into_games`].

mod client;

pub use client::{archive_url, ChessComClient};

use async_trait::async_trait;

use crate::types::RawGame;

/// Result of one fetch from a game source
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The source answered; may be empty when the player has no games
    Games(Vec<RawGame>),
    /// The fetch failed and was swallowed
    Failed { reason: String },
}

impl FetchOutcome {
    /// Games fetched, or an empty list when the fetch failed
    pub fn into_games(self) -> Vec<RawGame> {
        match self {
            FetchOutcome::Games(games) => games,
            FetchOutcome::Failed { .. } => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }
}

/// Anything that can supply a player's games for the current month
#[async_trait]
pub trait GameSource: Send + Sync {
    async fn fetch_games(&self, username: &str) -> FetchOutcome;
}
