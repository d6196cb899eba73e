//! # scorecast-core
//!
//! Core library for scorecast - a live session score overlay for chess.com players.
//!
//! This library provides:
//! - Domain types for raw games, rounds and sessions
//! - A fail-soft game source for the chess.com published-data API
//! - The session classifier (filter, perspective, result mapping)
//! - The polling controller and its change detection
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows one way:
//! - **Source:** monthly game archive for the tracked player
//! - **Classifier:** session games as numbered rounds with win/loss/draw outcomes
//! - **Controller:** replaces the displayed snapshot only when rounds were added
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scorecast_core::{ChessComClient, Config, PollController, SessionDefinition};
//!
//! # async fn run() -> scorecast_core::Result<()> {
//! let config = Config::load()?;
//! let source = Arc::new(ChessComClient::new(&config.source)?);
//!
//! let mut controller = PollController::new(source, config.polling.interval());
//! let snapshot = controller.load("magnuscarlsen", SessionDefinition::RecurringEvent).await;
//! println!("{}", snapshot.summary().score_line());
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use classify::{classify, classify_at};
pub use config::Config;
pub use error::{Error, Result};
pub use poller::{ControllerState, PollController, SessionSnapshot};
pub use source::{ChessComClient, FetchOutcome, GameSource};
pub use summary::{round_slots, SessionSummary};
pub use types::*;

// Public modules
pub mod classify;
pub mod config;
pub mod error;
pub mod logging;
pub mod poller;
pub mod source;
pub mod summary;
pub mod types;
