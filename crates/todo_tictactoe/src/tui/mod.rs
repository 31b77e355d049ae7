//! Terminal UI for Todo Tic-Tac-Toe

mod app;
mod input;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use todo_tictactoe::{Board, GameSettings, MoveOracle, OracleEvent, TaskOracle};
use tokio::sync::mpsc;
use tracing::{error, info, instrument};

use app::App;

/// Everything the TUI needs to run a game.
pub struct TuiOptions {
    /// Settings preselected on the menu.
    pub settings: GameSettings,
    /// Optional starting position.
    pub start_board: Option<Board>,
    /// Task generator.
    pub task_oracle: Arc<dyn TaskOracle>,
    /// Opponent.
    pub move_oracle: Arc<dyn MoveOracle>,
    /// Delay between reasoning and mark.
    pub pacing: Duration,
}

/// Runs the TUI until the user quits. Logging must already go to a file.
pub async fn run_tui(options: TuiOptions) -> Result<()> {
    info!("Starting Todo Tic-Tac-Toe TUI");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let app = App::new(
        options.settings,
        options.task_oracle,
        options.move_oracle,
        options.pacing,
        event_tx,
    )
    .with_start_board(options.start_board);

    let res = run_app(&mut terminal, app, &mut event_rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = ?err, "Game loop error");
    }
    res
}

/// Draw, apply oracle events, then poll the keyboard.
#[instrument(skip_all)]
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: App,
    event_rx: &mut mpsc::UnboundedReceiver<OracleEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        while let Ok(event) = event_rx.try_recv() {
            app.handle_event(event);
        }

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && key.kind != KeyEventKind::Release
        {
            app.handle_key(key.code);
        }

        if app.should_quit() {
            info!("TUI exiting");
            return Ok(());
        }

        // Yield so spawned oracle tasks make progress.
        tokio::task::yield_now().await;
    }
}
