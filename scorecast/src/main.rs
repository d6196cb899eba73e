//! scorecast - live chess.com session score overlay
//!
//! Tracks one player's games for the current session and shows the running
//! score in a small terminal overlay, refreshing as new games finish.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/scorecast/config.toml (~/.config/scorecast/config.toml)
//! - Logs: $XDG_STATE_HOME/scorecast/scorecast.YYYY-MM-DD.log (~/.local/state/scorecast/)

mod app;
mod ui;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use scorecast_core::{
    classify, round_slots, ChessComClient, Config, GameSource, PollController, SessionDefinition,
    SessionMode, SessionSummary,
};

use crate::app::App;

#[derive(Parser)]
#[command(name = "scorecast")]
#[command(about = "Live chess.com session score overlay")]
#[command(version)]
struct Args {
    /// chess.com username to track
    username: Option<String>,

    /// Session mode: titled-tuesday or custom (default: from config)
    #[arg(short, long)]
    mode: Option<SessionMode>,

    /// Custom session start, seconds since epoch (implies --mode custom)
    #[arg(long, conflicts_with = "start_now")]
    start: Option<i64>,

    /// Start a custom session at the current time
    #[arg(long)]
    start_now: bool,

    /// Poll interval in seconds (default: from config)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Override the chess.com API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Number of round slots in the round strip
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Fetch once, print the score and exit
    #[arg(long)]
    once: bool,
}

impl Args {
    /// Fold command-line overrides into the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(base_url) = &self.base_url {
            config.source.base_url = base_url.clone();
        }
        if let Some(interval) = self.interval {
            config.polling.interval_secs = interval;
        }
        if let Some(max_rounds) = self.max_rounds {
            config.display.max_rounds = max_rounds;
        }
    }

    fn session(&self, config: &Config) -> SessionDefinition {
        let start = if self.start_now {
            Some(chrono::Utc::now().timestamp())
        } else {
            self.start.or(config.session.start)
        };

        let mode = match self.mode {
            Some(mode) => mode,
            None if self.start.is_some() || self.start_now => SessionMode::Custom,
            None => config.session.mode,
        };

        SessionDefinition::from_mode(mode, start)
    }

    fn username(&self) -> Option<String> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration and apply command-line overrides
    let mut config = Config::load().context("failed to load configuration")?;
    args.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard =
        scorecast_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let username = args
        .username()
        .context("a chess.com username is required")?;
    let session = args.session(&config);
    let max_rounds = config.display.max_rounds;

    tracing::info!(
        username = %username,
        mode = session.mode().as_str(),
        base_url = %config.source.base_url,
        "scorecast starting up"
    );

    let source: Arc<dyn GameSource> =
        Arc::new(ChessComClient::new(&config.source).context("failed to create API client")?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    if args.once {
        return runtime.block_on(run_once(source.as_ref(), &username, session, max_rounds));
    }

    // Initial load completes before the overlay appears
    let mut controller = PollController::new(source, config.polling.interval());
    runtime.block_on(controller.load(username.as_str(), session));

    let mut app = App::new(controller, runtime.handle().clone(), max_rounds);

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    app.shutdown();
    tracing::info!("scorecast shutting down");

    result
}

/// Fetch and classify once, then print the overlay contents as text.
async fn run_once(
    source: &dyn GameSource,
    username: &str,
    session: SessionDefinition,
    max_rounds: usize,
) -> Result<()> {
    let outcome = source.fetch_games(username).await;
    if let scorecast_core::FetchOutcome::Failed { reason } = &outcome {
        eprintln!("warning: could not fetch games: {}", reason);
    }

    let rounds = classify(&outcome.into_games(), username, &session);
    let summary = SessionSummary::from_rounds(&rounds);

    println!("{}", summary.score_line());
    println!("{}", session.label());
    println!("{}", ui::format_round_strip(&round_slots(&rounds, max_rounds)));
    if let Some(accuracy) = summary.average_accuracy {
        println!("Average accuracy: {:.1}%", accuracy);
    }

    Ok(())
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Pick up snapshots published by the poller
        app.refresh();

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
