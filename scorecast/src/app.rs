//! Application state for the overlay.

use crossterm::event::{KeyCode, KeyEvent};
use scorecast_core::{PollController, SessionDefinition, SessionSnapshot, SessionSummary};
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Overlay state: the controller plus the snapshot currently drawn
pub struct App {
    controller: PollController,
    runtime: Handle,
    updates: watch::Receiver<SessionSnapshot>,
    /// Snapshot being rendered
    pub snapshot: SessionSnapshot,
    /// Width of the round strip
    pub max_rounds: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: PollController, runtime: Handle, max_rounds: usize) -> Self {
        let mut updates = controller.subscribe();
        let snapshot = updates.borrow_and_update().clone();

        Self {
            controller,
            runtime,
            updates,
            snapshot,
            max_rounds,
            should_quit: false,
        }
    }

    pub fn player(&self) -> &str {
        self.controller.player().unwrap_or("")
    }

    pub fn session(&self) -> SessionDefinition {
        self.controller.session().unwrap_or_default()
    }

    pub fn summary(&self) -> SessionSummary {
        self.snapshot.summary()
    }

    pub fn poll_interval_secs(&self) -> u64 {
        self.controller.interval().as_secs()
    }

    /// Copy the latest published snapshot, if the poller replaced it.
    ///
    /// Returns true when the view needs redrawing.
    pub fn refresh(&mut self) -> bool {
        if !self.updates.has_changed().unwrap_or(false) {
            return false;
        }
        self.snapshot = self.updates.borrow_and_update().clone();
        true
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('n') => {
                self.start_session_now();
            }
            KeyCode::Char('r') => {
                self.runtime.block_on(self.controller.poll_now());
            }
            _ => {}
        }
        self.refresh();
    }

    /// Restart as a custom session beginning at the current time.
    fn start_session_now(&mut self) {
        let player = self.player().to_string();
        if player.is_empty() {
            return;
        }
        let session = SessionDefinition::Custom {
            start: Some(chrono::Utc::now().timestamp()),
        };
        self.runtime.block_on(self.controller.load(player, session));
    }

    /// Stop polling before the runtime goes away.
    pub fn shutdown(&mut self) {
        self.controller.stop();
    }
}
