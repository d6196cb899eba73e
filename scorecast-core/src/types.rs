//! Core domain types for scorecast
//!
//! Raw types mirror the chess.com published-data API payload. Normalized types
//! are what the classifier produces and the overlay consumes.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Tracked player** | The player whose score the overlay shows |
//! | **Session** | The window of games that count toward the score |
//! | **Round** | One classified session game, seen from the tracked player's side |
//! | **Snapshot** | The rounds currently on display |

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================
// Raw game records
// ============================================

/// Monthly archive response body (`GET /pub/player/{user}/games/{yyyy}/{mm}`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameArchive {
    /// A missing `games` field is treated as zero games
    #[serde(default)]
    pub games: Vec<RawGame>,
}

/// One finished game as published by the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGame {
    #[serde(default)]
    pub url: String,
    /// Full move record, passed through untouched
    #[serde(default)]
    pub pgn: String,
    #[serde(default)]
    pub time_control: String,
    /// Seconds since epoch
    pub end_time: i64,
    #[serde(default)]
    pub rated: bool,
    #[serde(default)]
    pub accuracies: Option<Accuracies>,
    pub white: RawSide,
    pub black: RawSide,
    /// Tournament URL or name, absent for casual games
    #[serde(default)]
    pub tournament: Option<String>,
}

impl RawGame {
    pub fn side(&self, color: Color) -> &RawSide {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// Accuracy for one side, when the source computed it
    pub fn accuracy(&self, color: Color) -> Option<f64> {
        let accuracies = self.accuracies.as_ref()?;
        match color {
            Color::White => accuracies.white,
            Color::Black => accuracies.black,
        }
    }
}

/// One side of a raw game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSide {
    #[serde(default)]
    pub rating: u32,
    /// Raw result code (`win`, `timeout`, `agreed`, ...)
    pub result: String,
    pub username: String,
}

/// Per-side accuracy scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracies {
    #[serde(default)]
    pub white: Option<f64>,
    #[serde(default)]
    pub black: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

// ============================================
// Normalized rounds
// ============================================

/// Three-way game outcome from the tracked player's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Points this outcome contributes to the session score
    pub fn points(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Loss => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
            Outcome::Draw => "draw",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified session game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// 1-based, in source order
    pub round: usize,
    pub outcome: Outcome,
    pub opponent: String,
    /// Tracked player's rating in this game
    pub rating: u32,
    pub accuracy: Option<f64>,
    pub pgn: String,
}

// ============================================
// Sessions
// ============================================

/// Session mode as written in config files and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    #[default]
    TitledTuesday,
    Custom,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::TitledTuesday => "titled-tuesday",
            SessionMode::Custom => "custom",
        }
    }
}

impl std::str::FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "titled-tuesday" => Ok(SessionMode::TitledTuesday),
            "custom" => Ok(SessionMode::Custom),
            _ => Err(format!("unknown session mode: {}", s)),
        }
    }
}

/// Which games count toward the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum SessionDefinition {
    /// Titled Tuesday games that ended yesterday or today (local calendar)
    #[default]
    #[serde(rename = "titled-tuesday")]
    RecurringEvent,
    /// Every game ending at or after `start`; no start matches nothing
    Custom { start: Option<i64> },
}

impl SessionDefinition {
    /// Build a definition from a mode and optional start.
    ///
    /// The start is ignored for recurring-event sessions.
    pub fn from_mode(mode: SessionMode, start: Option<i64>) -> Self {
        match mode {
            SessionMode::TitledTuesday => SessionDefinition::RecurringEvent,
            SessionMode::Custom => SessionDefinition::Custom { start },
        }
    }

    pub fn mode(&self) -> SessionMode {
        match self {
            SessionDefinition::RecurringEvent => SessionMode::TitledTuesday,
            SessionDefinition::Custom { .. } => SessionMode::Custom,
        }
    }

    /// Caption shown under the score
    pub fn label(&self) -> &'static str {
        match self {
            SessionDefinition::RecurringEvent => "Titled Tuesday Score",
            SessionDefinition::Custom { .. } => "Session Score",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_points() {
        assert_eq!(Outcome::Win.points(), 1.0);
        assert_eq!(Outcome::Draw.points(), 0.5);
        assert_eq!(Outcome::Loss.points(), 0.0);
    }

    #[test]
    fn test_session_mode_round_trip_str() {
        for mode in [SessionMode::TitledTuesday, SessionMode::Custom] {
            assert_eq!(mode.as_str().parse::<SessionMode>(), Ok(mode));
        }
        assert!("weekly".parse::<SessionMode>().is_err());
    }

    #[test]
    fn test_session_definition_from_mode() {
        assert_eq!(
            SessionDefinition::from_mode(SessionMode::TitledTuesday, Some(10)),
            SessionDefinition::RecurringEvent
        );
        let custom = SessionDefinition::from_mode(SessionMode::Custom, None);
        assert_eq!(custom, SessionDefinition::Custom { start: None });
        assert_eq!(custom.mode(), SessionMode::Custom);
        assert_eq!(custom.label(), "Session Score");
    }

    #[test]
    fn test_raw_game_deserializes_minimal_record() {
        let json = r#"{
            "end_time": 1700000000,
            "white": {"rating": 3100, "result": "win", "username": "Magnus"},
            "black": {"rating": 2900, "result": "resigned", "username": "hikaru"}
        }"#;
        let game: RawGame = serde_json::from_str(json).unwrap();
        assert_eq!(game.side(Color::White).username, "Magnus");
        assert!(game.tournament.is_none());
        assert_eq!(game.accuracy(Color::Black), None);
        assert_eq!(game.pgn, "");
    }

    #[test]
    fn test_archive_without_games_field() {
        let archive: GameArchive = serde_json::from_str("{}").unwrap();
        assert!(archive.games.is_empty());
    }
}
