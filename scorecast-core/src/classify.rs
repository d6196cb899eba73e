//! Session game classifier
//!
//! Turns a month of raw game records into the ordered rounds of one session:
//!
//! 1. **Filter** games by the session window (and tournament name for
//!    Titled Tuesday sessions)
//! 2. **Orient** each game to the tracked player's side
//! 3. **Map** the raw result code to a [`Outcome`]
//! 4. **Number** rounds 1..N in source order (no re-sorting)

use chrono::{DateTime, Local, NaiveTime, TimeZone};

use crate::types::{Color, Outcome, RawGame, Round, SessionDefinition};

/// Tournament markers for the recurring event, as published by the source
pub const EVENT_MARKERS: [&str; 2] = ["titled-tuesday", "titled tuesday"];

/// Map a raw result code to an outcome.
///
/// Returns `None` for codes this table does not know.
pub fn outcome_for_code(code: &str) -> Option<Outcome> {
    match code.to_ascii_lowercase().as_str() {
        "win" => Some(Outcome::Win),
        "checkmated" | "timeout" | "resigned" | "abandoned" | "lose" | "bughousepartnerlose" => {
            Some(Outcome::Loss)
        }
        "agreed" | "repetition" | "stalemate" | "insufficient" | "50move"
        | "timevsinsufficient" => Some(Outcome::Draw),
        // Variant terminations: the side reporting them lost
        "kingofthehill" | "threecheck" => Some(Outcome::Loss),
        _ => None,
    }
}

/// Map a raw result code, counting unknown codes as draws.
pub fn resolve_outcome(code: &str) -> Outcome {
    outcome_for_code(code).unwrap_or_else(|| {
        tracing::warn!(result_code = %code, "Unknown result code, counting as draw");
        Outcome::Draw
    })
}

/// Which side of a game belongs to the tracked player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Perspective {
    pub mine: Color,
    /// False when the player matched neither side and black was assumed
    pub matched: bool,
}

/// Case-insensitive username comparison, Unicode-aware
fn same_player(username: &str, player: &str) -> bool {
    username.to_lowercase() == player.to_lowercase()
}

impl Perspective {
    pub fn resolve(game: &RawGame, player: &str) -> Self {
        if same_player(&game.white.username, player) {
            return Self {
                mine: Color::White,
                matched: true,
            };
        }

        let matched = same_player(&game.black.username, player);
        if !matched {
            tracing::warn!(
                player = %player,
                white = %game.white.username,
                black = %game.black.username,
                game = %game.url,
                "Tracked player is on neither side, assuming black"
            );
        }
        Self {
            mine: Color::Black,
            matched,
        }
    }

    pub fn theirs(&self) -> Color {
        self.mine.opposite()
    }
}

/// The set of games one session accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    /// Earliest accepted `end_time`; `None` accepts nothing
    pub start: Option<i64>,
    /// Only accept games from the recurring event
    pub event_only: bool,
}

impl SessionWindow {
    pub fn new<Tz: TimeZone>(session: &SessionDefinition, now: &DateTime<Tz>) -> Self {
        match session {
            SessionDefinition::RecurringEvent => Self {
                start: Some(start_of_yesterday(now)),
                event_only: true,
            },
            SessionDefinition::Custom { start } => Self {
                start: *start,
                event_only: false,
            },
        }
    }

    pub fn contains(&self, game: &RawGame) -> bool {
        let Some(start) = self.start else {
            return false;
        };
        if self.event_only && !is_event_game(game) {
            return false;
        }
        game.end_time >= start
    }
}

/// True when the game's tournament names the recurring event
pub fn is_event_game(game: &RawGame) -> bool {
    match game.tournament.as_deref() {
        Some(tournament) if !tournament.is_empty() => {
            let tournament = tournament.to_lowercase();
            EVENT_MARKERS
                .iter()
                .any(|marker| tournament.contains(marker))
        }
        _ => false,
    }
}

/// Epoch seconds of local midnight at the start of the day before `now`.
pub fn start_of_yesterday<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let tz = now.timezone();
    let today = now.date_naive();
    let yesterday = today.pred_opt().unwrap_or(today);
    let midnight = yesterday.and_time(NaiveTime::MIN);

    // Midnight can be skipped by a DST jump; fall back to the first valid hour
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + chrono::Duration::hours(1)))
                .earliest()
        })
        .map(|start| start.timestamp())
        .unwrap_or_else(|| midnight.and_utc().timestamp())
}

/// Classify games against the local clock.
pub fn classify(games: &[RawGame], player: &str, session: &SessionDefinition) -> Vec<Round> {
    classify_at(games, player, session, &Local::now())
}

/// Classify games as of `now`.
pub fn classify_at<Tz: TimeZone>(
    games: &[RawGame],
    player: &str,
    session: &SessionDefinition,
    now: &DateTime<Tz>,
) -> Vec<Round> {
    let window = SessionWindow::new(session, now);

    let rounds: Vec<Round> = games
        .iter()
        .filter(|game| window.contains(game))
        .enumerate()
        .map(|(index, game)| to_round(index + 1, game, player))
        .collect();

    tracing::debug!(
        player = %player,
        mode = session.mode().as_str(),
        fetched = games.len(),
        rounds = rounds.len(),
        "Classified session games"
    );

    rounds
}

fn to_round(round: usize, game: &RawGame, player: &str) -> Round {
    let perspective = Perspective::resolve(game, player);
    let mine = game.side(perspective.mine);

    Round {
        round,
        outcome: resolve_outcome(&mine.result),
        opponent: game.side(perspective.theirs()).username.clone(),
        rating: mine.rating,
        accuracy: game.accuracy(perspective.mine),
        pgn: game.pgn.clone(),
    }
}
