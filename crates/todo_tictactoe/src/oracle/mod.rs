//! External collaborators that generate tasks and choose opponent moves.
//!
//! Both oracles are asynchronous and fallible. The session state machine
//! never calls them directly: it issues a ticket, a driver performs the call,
//! and the result comes back as an [`OracleEvent`](crate::OracleEvent).

mod decode;
mod driver;
mod llm;
mod offline;

pub use decode::{decode_move, MoveChoice, MoveDecodeError, MoveReply, FALLBACK_REASONING};
pub use driver::{drive_opponent_turn, drive_task_request};
pub use llm::{LlmOracle, FALLBACK_TASK};
pub use offline::OfflineOracle;

use crate::llm_client::LlmError;
use crate::settings::{Difficulty, Theme};
use derive_more::{Display, Error, From};
use todo_board::{Board, Position};

/// Generates the task a player must complete to claim a square.
#[async_trait::async_trait]
pub trait TaskOracle: Send + Sync {
    /// Returns a short, human-readable instruction.
    ///
    /// `difficulty` is guidance for the generator, not something the caller
    /// enforces.
    async fn generate_task(
        &self,
        theme: Theme,
        position: Position,
        difficulty: Difficulty,
    ) -> Result<String, OracleError>;
}

/// Chooses the opponent's next square.
#[async_trait::async_trait]
pub trait MoveOracle: Send + Sync {
    /// Returns the raw reply, expected to hold a JSON object with `index`
    /// and `reasoning`. Decoding and the fallback for malformed replies are
    /// the caller's job (see [`MoveChoice::decode_or_fallback`]).
    ///
    /// The board always has at least one empty square.
    async fn select_move(&self, board: &Board, theme: Theme) -> Result<String, OracleError>;
}

/// Oracle call failed before producing a reply.
#[derive(Debug, Clone, Display, Error, From)]
pub enum OracleError {
    /// The LLM request failed.
    #[display("Oracle request failed: {}", _0)]
    Llm(LlmError),
    /// The oracle could not serve the request.
    #[display("Oracle unavailable: {}", _0)]
    Unavailable(#[error(not(source))] String),
}
