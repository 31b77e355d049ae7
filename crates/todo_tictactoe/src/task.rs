//! Tasks that must be completed to claim a square.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use todo_board::{Mark, Position};
use tracing::{debug, instrument};

/// A generated task attached to one board position.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Task {
    /// Creation timestamp in milliseconds, unique per generation.
    id: i64,
    /// Instruction text shown to the player.
    description: String,
    /// Whether the player confirmed completion.
    completed: bool,
    /// Mark the task was generated for.
    owner: Mark,
}

/// Sparse map from board position to its task.
///
/// Holds at most one task per position. A regenerated task replaces the
/// previous one; entries are only dropped when the whole registry is.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<Position, Task>,
    last_id: i64,
}

impl TaskRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Task recorded for a position, completed or not.
    pub fn get(&self, pos: Position) -> Option<&Task> {
        self.tasks.get(&pos)
    }

    /// Uncompleted task recorded for a position.
    pub fn pending(&self, pos: Position) -> Option<&Task> {
        self.tasks.get(&pos).filter(|task| !task.completed)
    }

    /// Records a fresh, uncompleted task for a position.
    #[instrument(skip(self, description))]
    pub(crate) fn record(&mut self, pos: Position, description: String, owner: Mark) -> &Task {
        let id = self.next_id();
        debug!(id, "Recording task");
        let task = Task {
            id,
            description,
            completed: false,
            owner,
        };
        self.tasks.insert(pos, task);
        &self.tasks[&pos]
    }

    /// Marks the task at a position completed. Returns false if none exists.
    #[instrument(skip(self))]
    pub(crate) fn complete(&mut self, pos: Position) -> bool {
        match self.tasks.get_mut(&pos) {
            Some(task) => {
                task.completed = true;
                true
            }
            None => false,
        }
    }

    /// Number of recorded tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when no task has been recorded.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterates tasks in position order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Task)> {
        self.tasks.iter().map(|(pos, task)| (*pos, task))
    }

    /// Wall-clock millis, bumped past the previous id when the clock has not moved.
    fn next_id(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let id = now.max(self.last_id + 1);
        self.last_id = id;
        id
    }
}
