//! Command-line interface for todo_tictactoe.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use todo_tictactoe::{Board, Difficulty, Theme, DEFAULT_CONFIG_FILE};

/// Todo Tic-Tac-Toe - claim squares by finishing real-world tasks
#[derive(Parser, Debug)]
#[command(name = "todo_tictactoe")]
#[command(about = "Tic-tac-toe where every square is a todo", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play in the terminal UI
    Play {
        /// Path to game config (TOML). Missing file means defaults.
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Use canned tasks and a built-in opponent instead of an LLM
        #[arg(long)]
        offline: bool,

        /// Theme preselected on the menu (overrides config)
        #[arg(long)]
        theme: Option<Theme>,

        /// Difficulty preselected on the menu (overrides config)
        #[arg(long)]
        difficulty: Option<Difficulty>,

        /// Let the opponent take the first move
        #[arg(long)]
        opponent_first: bool,

        /// Start from this position instead of an empty board (e.g. "XX_OO____")
        #[arg(long)]
        position: Option<Board>,
    },

    /// Generate a single task and print it
    Task {
        /// Task theme
        #[arg(long, default_value_t = Theme::default())]
        theme: Theme,

        /// Board cell the task is for (0-8)
        #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(0..=8))]
        cell: u8,

        /// Task difficulty
        #[arg(long, default_value_t = Difficulty::default())]
        difficulty: Difficulty,

        /// Use canned tasks instead of an LLM
        #[arg(long)]
        offline: bool,

        /// Path to game config (TOML)
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },

    /// List themes and difficulties
    Themes,
}
