//! Todo Tic-Tac-Toe - tic-tac-toe where every square costs a real-world task
//!
//! Before the human can mark a square, an oracle generates a small "todo"
//! task for it; the mark is placed only once the task is confirmed done. The
//! opponent's moves come from a second oracle that explains its reasoning.
//!
//! # Architecture
//!
//! - **Session**: explicit state machine owning board, tasks and the busy flag
//! - **Oracles**: async task and move generators (LLM-backed or offline)
//! - **Drivers**: run oracle calls for session tickets and report back as events
//! - **Controller**: sequential begin, call, apply loop for scripted play
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use todo_tictactoe::{GameController, OfflineOracle, Position, Session};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let oracle = Arc::new(OfflineOracle::new());
//! let mut game = GameController::new(Session::new(), oracle.clone(), oracle);
//! game.start().await?;
//! game.request_task(Position::Center).await?;
//! game.complete_task(Position::Center).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod controller;
pub mod llm_client;
pub mod oracle;
mod session;
mod settings;
mod task;

// Crate-level exports - Configuration
pub use config::{ConfigError, GameConfig, DEFAULT_CONFIG_FILE};

// Crate-level exports - Controller
pub use controller::{GameController, DEFAULT_PACING};

// Crate-level exports - LLM client
pub use llm_client::{LlmClient, LlmConfig, LlmError, LlmProvider};

// Crate-level exports - Oracles
pub use oracle::{
    LlmOracle, MoveChoice, MoveDecodeError, MoveOracle, OfflineOracle, OracleError, TaskOracle,
};

// Crate-level exports - Session state machine
pub use session::{
    Delivery, MoveTicket, OracleEvent, Phase, Session, TaskRequest, TaskTicket, TransitionError,
    HUMAN, OPPONENT,
};

// Crate-level exports - Settings and tasks
pub use settings::{Difficulty, FirstPlayer, GameSettings, Theme, UnknownSetting};
pub use task::{Task, TaskRegistry};

// Crate-level exports - Board types
pub use todo_board::{Board, Mark, Outcome, Position, Square};
