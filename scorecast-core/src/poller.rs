//! Polling controller
//!
//! Drives the game source and classifier on a fixed interval and publishes
//! the displayed [`SessionSnapshot`] through a `tokio::sync::watch` channel.
//!
//! ## States
//!
//! ```text
//!  Idle ──load──▶ Active ──stop──▶ Stopped
//!                  │  ▲               │
//!                  └──┘ tick          └──load──▶ Active
//! ```
//!
//! `load` runs one fetch-and-classify cycle to completion before the ticker
//! is scheduled. Every tick spawns its own fetch task; slow fetches may overlap.
//!
//! ## Change detection
//!
//! A new result replaces the snapshot only when it has strictly more rounds
//! than the one on display (see [`evaluate`]). Rounds are never retracted by
//! the source, so equal or shorter results are re-fetches and are dropped.
//! Each fetch carries a sequence number taken when the request starts; a
//! result older than the one that produced the displayed snapshot is dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::classify::classify;
use crate::source::GameSource;
use crate::summary::SessionSummary;
use crate::types::{Round, SessionDefinition};

/// Default time between poll ticks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Rounds currently on display
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Bumped every time a new session is loaded
    pub generation: u64,
    /// Sequence number of the fetch that produced these rounds
    pub sequence: u64,
    pub rounds: Vec<Round>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_rounds(&self.rounds)
    }
}

/// Decide whether `candidate` replaces the displayed snapshot.
///
/// Returns the replacement, or `None` when the candidate is stale or does not
/// add rounds.
pub fn evaluate(
    previous: &SessionSnapshot,
    candidate: Vec<Round>,
    sequence: u64,
) -> Option<SessionSnapshot> {
    if sequence < previous.sequence {
        tracing::debug!(
            sequence,
            displayed = previous.sequence,
            "Dropping stale poll result"
        );
        return None;
    }

    if candidate.len() <= previous.len() {
        return None;
    }

    Some(SessionSnapshot {
        generation: previous.generation,
        sequence,
        rounds: candidate,
        updated_at: Some(Utc::now()),
    })
}

/// Lifecycle of a [`PollController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No tracked player yet
    Idle,
    /// Tracked player set, ticker running
    Active,
    /// Ticker cancelled
    Stopped,
}

/// State shared between the controller and its tick tasks
struct Shared {
    source: Arc<dyn GameSource>,
    snapshot: watch::Sender<SessionSnapshot>,
    next_sequence: AtomicU64,
}

/// Everything a tick task needs to poll one session
#[derive(Clone)]
struct SessionHandle {
    shared: Arc<Shared>,
    player: Arc<str>,
    session: SessionDefinition,
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl SessionHandle {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// One fetch-classify-compare cycle. Returns true when the snapshot changed.
    async fn poll(&self) -> bool {
        let sequence = self.shared.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;

        let outcome = self.shared.source.fetch_games(&self.player).await;
        if outcome.is_failed() {
            tracing::debug!(player = %self.player, sequence, "Poll fetch failed, nothing new");
        }
        let rounds = classify(&outcome.into_games(), &self.player, &self.session);

        self.apply(sequence, rounds)
    }

    fn apply(&self, sequence: u64, rounds: Vec<Round>) -> bool {
        let candidate_len = rounds.len();

        let updated = self.shared.snapshot.send_if_modified(|current| {
            // Results from a stopped or replaced session are discarded
            if self.is_cancelled() || current.generation != self.generation {
                return false;
            }
            match evaluate(current, rounds, sequence) {
                Some(next) => {
                    *current = next;
                    true
                }
                None => false,
            }
        });

        if updated {
            tracing::info!(
                player = %self.player,
                rounds = candidate_len,
                sequence,
                "New session games detected"
            );
        }
        updated
    }
}

async fn run_ticker(handle: SessionHandle, period: Duration) {
    let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;
        if handle.is_cancelled() {
            break;
        }

        let tick = handle.clone();
        tokio::spawn(async move {
            tick.poll().await;
        });
    }
}

struct ActiveSession {
    handle: SessionHandle,
    ticker: JoinHandle<()>,
}

/// Polls a game source for one tracked player and session at a time
pub struct PollController {
    shared: Arc<Shared>,
    interval: Duration,
    state: ControllerState,
    active: Option<ActiveSession>,
    generation: u64,
}

impl PollController {
    /// Create an idle controller. A zero interval falls back to the default.
    pub fn new(source: Arc<dyn GameSource>, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        let (snapshot, _) = watch::channel(SessionSnapshot::default());

        Self {
            shared: Arc::new(Shared {
                source,
                snapshot,
                next_sequence: AtomicU64::new(0),
            }),
            interval,
            state: ControllerState::Idle,
            active: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Tracked player of the running session
    pub fn player(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.handle.player.as_ref())
    }

    pub fn session(&self) -> Option<SessionDefinition> {
        self.active.as_ref().map(|a| a.handle.session)
    }

    /// Copy of the snapshot on display
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Receiver that wakes whenever the snapshot is replaced
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshot.subscribe()
    }

    /// Start tracking `player` in `session`.
    ///
    /// Any running session is stopped and the snapshot reset to empty. One
    /// cycle completes before the ticker starts.
    pub async fn load(
        &mut self,
        player: impl Into<String>,
        session: SessionDefinition,
    ) -> SessionSnapshot {
        self.cancel_active();
        self.generation += 1;

        let player: String = player.into();
        let handle = SessionHandle {
            shared: Arc::clone(&self.shared),
            player: Arc::from(player.as_str()),
            session,
            generation: self.generation,
            cancelled: Arc::new(AtomicBool::new(false)),
        };

        self.shared.snapshot.send_replace(SessionSnapshot {
            generation: self.generation,
            ..Default::default()
        });

        tracing::info!(
            player = %player,
            mode = session.mode().as_str(),
            generation = self.generation,
            "Loading session"
        );

        handle.poll().await;

        let ticker = tokio::spawn(run_ticker(handle.clone(), self.interval));
        self.active = Some(ActiveSession { handle, ticker });
        self.state = ControllerState::Active;

        self.snapshot()
    }

    /// Run one cycle immediately. Returns true when the snapshot changed.
    pub async fn poll_now(&self) -> bool {
        match &self.active {
            Some(active) => active.handle.poll().await,
            None => false,
        }
    }

    /// Cancel the ticker. Results still in flight are discarded.
    pub fn stop(&mut self) {
        if self.cancel_active() {
            self.state = ControllerState::Stopped;
        }
    }

    fn cancel_active(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };

        active.handle.cancelled.store(true, Ordering::SeqCst);
        active.ticker.abort();
        tracing::info!(
            player = %active.handle.player,
            generation = active.handle.generation,
            "Stopped polling"
        );
        true
    }
}

impl Drop for PollController {
    fn drop(&mut self) {
        self.cancel_active();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FetchOutcome;
    use crate::types::{Outcome, RawGame, RawSide};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    fn game(opponent: &str, result: &str) -> RawGame {
        RawGame {
            url: String::new(),
            pgn: String::new(),
            time_control: "180".to_string(),
            end_time: 1_000,
            rated: true,
            accuracies: None,
            white: RawSide {
                rating: 2700,
                result: result.to_string(),
                username: "magnus".to_string(),
            },
            black: RawSide {
                rating: 2600,
                result: "agreed".to_string(),
                username: opponent.to_string(),
            },
            tournament: None,
        }
    }

    fn games(opponents: &[&str]) -> FetchOutcome {
        FetchOutcome::Games(opponents.iter().map(|o| game(o, "win")).collect())
    }

    fn session() -> SessionDefinition {
        SessionDefinition::Custom { start: Some(0) }
    }

    fn rounds(n: usize) -> Vec<Round> {
        (1..=n)
            .map(|i| Round {
                round: i,
                outcome: Outcome::Win,
                opponent: format!("o{i}"),
                rating: 2700,
                accuracy: None,
                pgn: String::new(),
            })
            .collect()
    }

    /// Replays scripted responses, repeating the last one
    struct ScriptedSource {
        responses: Vec<FetchOutcome>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(responses: Vec<FetchOutcome>) -> Arc<Self> {
            Arc::new(Self {
                responses,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GameSource for ScriptedSource {
        async fn fetch_games(&self, _username: &str) -> FetchOutcome {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let index = call.min(self.responses.len() - 1);
            self.responses[index].clone()
        }
    }

    /// First call answers at once; later calls wait for `release`
    struct GatedSource {
        first: FetchOutcome,
        later: Mutex<Option<FetchOutcome>>,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GameSource for GatedSource {
        async fn fetch_games(&self, _username: &str) -> FetchOutcome {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return self.first.clone();
            }
            self.release.notified().await;
            self.later
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(FetchOutcome::Games(Vec::new()))
        }
    }

    #[test]
    fn test_evaluate_requires_strictly_more_rounds() {
        let previous = SessionSnapshot {
            generation: 1,
            sequence: 4,
            rounds: rounds(3),
            updated_at: None,
        };

        assert!(evaluate(&previous, rounds(3), 5).is_none());
        assert!(evaluate(&previous, rounds(2), 5).is_none());

        let next = evaluate(&previous, rounds(4), 5).unwrap();
        assert_eq!(next.len(), 4);
        assert_eq!(next.sequence, 5);
        assert_eq!(next.generation, 1);
        assert!(next.updated_at.is_some());
    }

    #[test]
    fn test_evaluate_drops_stale_sequence() {
        let previous = SessionSnapshot {
            generation: 1,
            sequence: 6,
            rounds: rounds(4),
            updated_at: None,
        };

        // An older request finishing late cannot replace a newer result
        assert!(evaluate(&previous, rounds(5), 5).is_none());
        assert!(evaluate(&previous, rounds(5), 7).is_some());
    }

    #[tokio::test]
    async fn test_load_runs_one_cycle_before_ticking() {
        let source = ScriptedSource::new(vec![games(&["a", "b"])]);
        let mut controller = PollController::new(source.clone(), DEFAULT_POLL_INTERVAL);
        assert_eq!(controller.state(), ControllerState::Idle);
        assert!(controller.player().is_none());

        let snapshot = controller.load("magnus", session()).await;

        assert_eq!(controller.state(), ControllerState::Active);
        assert_eq!(controller.player(), Some("magnus"));
        assert_eq!(controller.session(), Some(session()));
        assert_eq!(source.calls(), 1);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.summary().score, 2.0);
        assert_eq!(controller.snapshot(), snapshot);
    }

    #[tokio::test]
    async fn test_same_count_does_not_signal_update() {
        let source = ScriptedSource::new(vec![games(&["a", "b", "c"]), games(&["x", "y", "z"])]);
        let mut controller = PollController::new(source.clone(), DEFAULT_POLL_INTERVAL);
        controller.load("magnus", session()).await;

        let mut updates = controller.subscribe();
        updates.borrow_and_update();

        assert!(!controller.poll_now().await);
        assert!(!updates.has_changed().unwrap());

        let opponents: Vec<_> = controller
            .snapshot()
            .rounds
            .iter()
            .map(|r| r.opponent.clone())
            .collect();
        assert_eq!(opponents, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_more_rounds_replace_snapshot() {
        let source = ScriptedSource::new(vec![games(&["a"]), games(&["a", "b"])]);
        let mut controller = PollController::new(source.clone(), DEFAULT_POLL_INTERVAL);
        controller.load("magnus", session()).await;

        let mut updates = controller.subscribe();
        updates.borrow_and_update();

        assert!(controller.poll_now().await);
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().len(), 2);
    }

    #[tokio::test]
    async fn test_fewer_rounds_or_failure_keep_snapshot() {
        let source = ScriptedSource::new(vec![
            games(&["a", "b"]),
            games(&["a"]),
            FetchOutcome::Failed {
                reason: "HTTP request failed".to_string(),
            },
        ]);
        let mut controller = PollController::new(source.clone(), DEFAULT_POLL_INTERVAL);
        controller.load("magnus", session()).await;

        assert!(!controller.poll_now().await);
        assert!(!controller.poll_now().await);
        assert_eq!(controller.snapshot().len(), 2);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_poll_now_when_idle_is_noop() {
        let source = ScriptedSource::new(vec![games(&["a"])]);
        let controller = PollController::new(source.clone(), DEFAULT_POLL_INTERVAL);

        assert!(!controller.poll_now().await);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_polls_every_interval() {
        let source = ScriptedSource::new(vec![
            games(&["a"]),
            games(&["a", "b"]),
            games(&["a", "b", "c"]),
        ]);
        let mut controller = PollController::new(source.clone(), DEFAULT_POLL_INTERVAL);
        controller.load("magnus", session()).await;
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(controller.snapshot().len(), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(controller.snapshot().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_ticker() {
        let source = ScriptedSource::new(vec![games(&["a"]), games(&["a", "b"])]);
        let mut controller = PollController::new(source.clone(), DEFAULT_POLL_INTERVAL);
        controller.load("magnus", session()).await;

        controller.stop();
        assert_eq!(controller.state(), ControllerState::Stopped);
        assert!(controller.player().is_none());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(controller.snapshot().len(), 1);
        assert!(!controller.poll_now().await);
    }

    #[tokio::test]
    async fn test_new_session_resets_snapshot() {
        let source = ScriptedSource::new(vec![games(&["a", "b", "c"]), games(&["d"])]);
        let mut controller = PollController::new(source.clone(), DEFAULT_POLL_INTERVAL);

        let first = controller.load("magnus", session()).await;
        assert_eq!(first.len(), 3);

        let second = controller.load("magnus", SessionDefinition::Custom { start: Some(500) }).await;
        assert_eq!(second.len(), 1);
        assert!(second.generation > first.generation);
        assert_eq!(controller.state(), ControllerState::Active);
    }

    #[tokio::test]
    async fn test_custom_session_without_start_shows_nothing() {
        let source = ScriptedSource::new(vec![games(&["a", "b"])]);
        let mut controller = PollController::new(source.clone(), DEFAULT_POLL_INTERVAL);

        let snapshot = controller
            .load("magnus", SessionDefinition::Custom { start: None })
            .await;

        assert!(snapshot.is_empty());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_after_stop_is_discarded() {
        let source = Arc::new(GatedSource {
            first: games(&["a"]),
            later: Mutex::new(Some(games(&["a", "b", "c"]))),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let mut controller = PollController::new(source.clone(), DEFAULT_POLL_INTERVAL);
        controller.load("magnus", session()).await;

        // First tick starts a fetch that blocks on the gate
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        controller.stop();
        source.release.notify_one();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(controller.snapshot().len(), 1);
    }
}
