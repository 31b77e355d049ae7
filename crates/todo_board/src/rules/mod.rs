//! Game rules for tic-tac-toe.
//!
//! Pure functions for evaluating a board. Rules are separated from board
//! storage so the session state machine can call them after every placement.

pub mod win;

pub use win::check_winner;

use super::{Board, Outcome, Square};
use tracing::{instrument, trace};

/// Returns true once every square holds a mark.
#[instrument(skip(board))]
pub fn is_full(board: &Board) -> bool {
    board.squares().iter().all(|s| *s != Square::Empty)
}

/// Evaluates the board.
///
/// Returns `Some(Outcome::Winner(mark))` if any row, column, or diagonal holds
/// three equal marks, `Some(Outcome::Draw)` if every square is occupied without
/// such a line, and `None` while the game is still in progress.
#[instrument(skip(board))]
pub fn evaluate(board: &Board) -> Option<Outcome> {
    let outcome = if let Some(winner) = check_winner(board) {
        Some(Outcome::Winner(winner))
    } else if is_full(board) {
        Some(Outcome::Draw)
    } else {
        None
    };
    trace!(?outcome, "Board evaluated");
    outcome
}
