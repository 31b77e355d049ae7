//! Board types and win detection for todo tic-tac-toe.
//!
//! This crate holds everything about the 3x3 grid that does not depend on
//! how a square gets claimed: marks, squares, positions, the board itself,
//! and the pure rules that decide whether a game is over.
//!
//! # Example
//!
//! ```
//! use todo_board::{evaluate, Board, Mark, Outcome, Position, Square};
//!
//! let mut board = Board::new();
//! for pos in [Position::TopLeft, Position::Center, Position::BottomRight] {
//!     board.set(pos, Square::Occupied(Mark::X));
//! }
//! assert_eq!(evaluate(&board), Some(Outcome::Winner(Mark::X)));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod outcome;
mod position;
pub mod rules;
mod types;

pub use outcome::Outcome;
pub use position::Position;
pub use rules::{check_winner, evaluate, is_full};
pub use types::{Board, BoardParseError, Mark, Square};
