//! Network-free oracle for playing without an API key.

use super::{MoveOracle, MoveReply, OracleError, TaskOracle};
use crate::settings::{Difficulty, Theme};
use std::sync::atomic::{AtomicUsize, Ordering};
use todo_board::rules::win::LINES;
use todo_board::{Board, Mark, Position, Square};
use tracing::{debug, instrument};

const EASY_TASKS: &[&str] = &[
    "Say \"{theme}\" out loud three times.",
    "Take three deep breaths while thinking about {theme}.",
    "Type one word that sums up {theme}.",
    "Stand up, stretch, and sit back down.",
];

const MEDIUM_TASKS: &[&str] = &[
    "Name five things related to {theme}.",
    "Write a one-sentence {theme} headline for today.",
    "Tidy one small area within reach for two minutes.",
    "Describe your favorite {theme} moment in three sentences.",
];

const HARD_TASKS: &[&str] = &[
    "Write a 4-line rhyming poem about {theme}.",
    "Do 20 squats, then name a {theme} fact per five squats.",
    "Sketch a {theme}-inspired doodle and give it a title.",
    "Explain a {theme} concept to an imaginary five-year-old, out loud.",
];

/// Deterministic oracle with canned tasks and a win/block heuristic.
#[derive(Debug, Default)]
pub struct OfflineOracle {
    calls: AtomicUsize,
}

impl OfflineOracle {
    /// Creates a new offline oracle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks a square: win, else block, else center, else first empty.
    #[instrument(skip(board))]
    pub fn choose(board: &Board) -> Option<(Position, &'static str)> {
        if let Some(pos) = completing_square(board, Mark::O) {
            return Some((pos, "Taking the square that completes three in a row."));
        }
        if let Some(pos) = completing_square(board, Mark::X) {
            return Some((pos, "Blocking X from completing a line."));
        }
        if board.is_empty(Position::Center) {
            return Some((Position::Center, "The center touches the most lines."));
        }
        board
            .first_empty()
            .map(|pos| (pos, "Taking the first open square."))
    }
}

/// Empty square that would give `mark` three in a row.
fn completing_square(board: &Board, mark: Mark) -> Option<Position> {
    LINES.iter().find_map(|line| {
        let owned = line
            .iter()
            .filter(|pos| board.get(**pos) == Square::Occupied(mark))
            .count();
        let empty: Vec<Position> = line.iter().copied().filter(|pos| board.is_empty(*pos)).collect();
        (owned == 2 && empty.len() == 1).then(|| empty[0])
    })
}

#[async_trait::async_trait]
impl TaskOracle for OfflineOracle {
    #[instrument(skip(self))]
    async fn generate_task(
        &self,
        theme: Theme,
        position: Position,
        difficulty: Difficulty,
    ) -> Result<String, OracleError> {
        let pool = match difficulty {
            Difficulty::Easy => EASY_TASKS,
            Difficulty::Medium => MEDIUM_TASKS,
            Difficulty::Hard => HARD_TASKS,
        };
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let template = pool[(position.to_index() + call) % pool.len()];
        let task = template.replace("{theme}", theme.label());
        debug!(task = %task, "Offline task generated");
        Ok(task)
    }
}

#[async_trait::async_trait]
impl MoveOracle for OfflineOracle {
    #[instrument(skip(self, board))]
    async fn select_move(&self, board: &Board, _theme: Theme) -> Result<String, OracleError> {
        let (position, reasoning) = Self::choose(board)
            .ok_or_else(|| OracleError::Unavailable("No empty square left".to_string()))?;
        let reply = MoveReply {
            index: position.to_index() as f64,
            reasoning: reasoning.to_string(),
        };
        serde_json::to_string(&reply).map_err(|e| OracleError::Unavailable(e.to_string()))
    }
}
