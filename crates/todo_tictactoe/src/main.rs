//! Todo Tic-Tac-Toe - Unified CLI
//!
//! Play in the terminal, print a single task, or list the available themes.

#![warn(missing_docs)]

mod cli;
mod tui;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strum::IntoEnumIterator;
use todo_tictactoe::{
    Board, Difficulty, FirstPlayer, GameConfig, GameSettings, LlmClient, LlmOracle, MoveOracle,
    OfflineOracle, Position, TaskOracle, Theme,
};
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "info,todo_tictactoe=debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            offline,
            theme,
            difficulty,
            opponent_first,
            position,
        } => run_play(config, offline, theme, difficulty, opponent_first, position).await,
        Command::Task {
            theme,
            cell,
            difficulty,
            offline,
            config,
        } => run_task(config, theme, cell, difficulty, offline).await,
        Command::Themes => {
            list_themes();
            Ok(())
        }
    }
}

/// Run the TUI game.
#[instrument(skip_all, fields(config_path = %config_path.display(), offline = offline))]
async fn run_play(
    config_path: PathBuf,
    offline: bool,
    theme: Option<Theme>,
    difficulty: Option<Difficulty>,
    opponent_first: bool,
    position: Option<Board>,
) -> Result<()> {
    let config = GameConfig::load_or_default(&config_path)?;
    initialize_file_tracing(config.log_file())?;
    info!(?config, "Starting play");

    let settings = GameSettings {
        theme: theme.unwrap_or(*config.theme()),
        difficulty: difficulty.unwrap_or(*config.difficulty()),
        first_player: if opponent_first {
            FirstPlayer::Opponent
        } else {
            FirstPlayer::Human
        },
    };
    let (task_oracle, move_oracle) = build_oracles(&config, offline)?;

    tui::run_tui(tui::TuiOptions {
        settings,
        start_board: position,
        task_oracle,
        move_oracle,
        pacing: config.pacing(),
    })
    .await
}

/// Generate one task and print it.
#[instrument(skip_all, fields(%theme, cell = cell, %difficulty, offline = offline))]
async fn run_task(
    config_path: PathBuf,
    theme: Theme,
    cell: u8,
    difficulty: Difficulty,
    offline: bool,
) -> Result<()> {
    initialize_stderr_tracing();
    let config = GameConfig::load_or_default(&config_path)?;
    let (task_oracle, _) = build_oracles(&config, offline)?;

    let position = Position::from_index(usize::from(cell))
        .ok_or_else(|| anyhow::anyhow!("Cell {} is off the board", cell))?;
    let task = task_oracle.generate_task(theme, position, difficulty).await?;
    println!("{}", task);
    Ok(())
}

fn list_themes() {
    println!("Themes:");
    for theme in Theme::iter() {
        println!("  {}", theme);
    }
    println!();
    println!("Difficulties:");
    for difficulty in Difficulty::iter() {
        println!("  {:<7} {}", difficulty.label(), difficulty.descriptor());
    }
}

/// Builds the task and move oracles; one shared instance serves both.
fn build_oracles(
    config: &GameConfig,
    offline: bool,
) -> Result<(Arc<dyn TaskOracle>, Arc<dyn MoveOracle>)> {
    if offline {
        info!("Using offline oracle");
        let oracle = Arc::new(OfflineOracle::new());
        let task_oracle: Arc<dyn TaskOracle> = oracle.clone();
        let move_oracle: Arc<dyn MoveOracle> = oracle;
        return Ok((task_oracle, move_oracle));
    }

    let llm_config = config.create_llm_config()?;
    let oracle = Arc::new(LlmOracle::new(LlmClient::new(llm_config)));
    let task_oracle: Arc<dyn TaskOracle> = oracle.clone();
    let move_oracle: Arc<dyn MoveOracle> = oracle;
    Ok((task_oracle, move_oracle))
}

/// Logs to a file so the TUI keeps the terminal.
fn initialize_file_tracing(path: &Path) -> Result<()> {
    let log_file = std::fs::File::create(path)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
        .try_init()?;

    info!(log_file = %path.display(), "File tracing initialized");
    Ok(())
}

fn initialize_stderr_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
