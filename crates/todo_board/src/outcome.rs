//! Outcome of a finished game.

use super::Mark;
use serde::{Deserialize, Serialize};

/// Outcome of a finished game.
///
/// A game that is still in progress has no outcome, so callers hold an
/// `Option<Outcome>` rather than a third "in progress" variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The mark completed three in a row.
    Winner(Mark),
    /// Board is full and nobody completed a line.
    Draw,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Winner(mark) => write!(f, "{} wins", mark),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}
