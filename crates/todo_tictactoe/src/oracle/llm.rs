//! Oracles backed by an LLM chat completion.

use super::{MoveOracle, MoveReply, OracleError, TaskOracle};
use crate::llm_client::LlmClient;
use crate::settings::{Difficulty, Theme};
use todo_board::{Board, Position};
use tracing::{debug, info, instrument, warn};

/// Task text used when the model answers with nothing.
pub const FALLBACK_TASK: &str = "Complete a quick stretch.";

const TASK_SYSTEM_PROMPT: &str =
    "You write short, fun real-world challenges for a tic-tac-toe game where every square is a todo item.";

const MOVE_SYSTEM_PROMPT: &str =
    "You are a strategic tic-tac-toe player. You answer with a single JSON object and nothing else.";

/// Task and move oracle that prompts an LLM.
#[derive(Debug, Clone)]
pub struct LlmOracle {
    client: LlmClient,
}

impl LlmOracle {
    /// Creates an oracle on top of an LLM client.
    #[instrument(skip(client))]
    pub fn new(client: LlmClient) -> Self {
        info!(provider = ?client.config().provider(), "Creating LLM oracle");
        Self { client }
    }

    /// Builds the task-generation prompt.
    #[instrument]
    pub fn task_prompt(theme: Theme, position: Position, difficulty: Difficulty) -> String {
        format!(
            "Generate a single, short, and engaging \"todo\" task for a player to complete to claim a square in a Tic-Tac-Toe game.\n\
             Theme: {theme}.\n\
             Cell index: {index} (0-8).\n\
             Difficulty level: {difficulty}. This means the task should be {descriptor}\n\
             \n\
             Example for {difficulty}:\n\
             - Easy: \"{easy}\"\n\
             - Medium: \"{medium}\"\n\
             - Hard: \"{hard}\"\n\
             \n\
             Return ONLY the task text. No extra formatting.",
            index = position.to_index(),
            descriptor = difficulty.descriptor(),
            easy = Difficulty::Easy.example(),
            medium = Difficulty::Medium.example(),
            hard = Difficulty::Hard.example(),
        )
    }

    /// Builds the move-selection prompt, including the reply schema.
    #[instrument(skip(board))]
    pub fn move_prompt(board: &Board, theme: Theme) -> String {
        let schema = serde_json::to_string_pretty(&schemars::schema_for!(MoveReply))
            .unwrap_or_else(|_| r#"{"index": number, "reasoning": string}"#.to_string());
        format!(
            "You are a strategic Tic-Tac-Toe player playing as 'O'.\n\
             Current board state (index: value): {board}.\n\
             Theme: {theme}.\n\
             Analyze the board and choose the best index (0-8) to play next.\n\
             You must win if possible, or block the opponent 'X'.\n\
             Provide your choice and a brief reasoning as JSON matching this schema:\n\
             {schema}",
            board = board.describe(),
        )
    }
}

#[async_trait::async_trait]
impl TaskOracle for LlmOracle {
    #[instrument(skip(self))]
    async fn generate_task(
        &self,
        theme: Theme,
        position: Position,
        difficulty: Difficulty,
    ) -> Result<String, OracleError> {
        let prompt = Self::task_prompt(theme, position, difficulty);
        let reply = self.client.generate(TASK_SYSTEM_PROMPT, &prompt).await?;
        let task = task_text(&reply);
        debug!(task = %task, "Task generated");
        Ok(task)
    }
}

/// Trims a task reply, substituting [`FALLBACK_TASK`] when nothing is left.
fn task_text(reply: &str) -> String {
    let text = reply.trim();
    if text.is_empty() {
        warn!("Model returned an empty task, using fallback");
        return FALLBACK_TASK.to_string();
    }
    text.to_string()
}

#[async_trait::async_trait]
impl MoveOracle for LlmOracle {
    #[instrument(skip(self, board))]
    async fn select_move(&self, board: &Board, theme: Theme) -> Result<String, OracleError> {
        let prompt = Self::move_prompt(board, theme);
        let reply = self.client.generate_json(MOVE_SYSTEM_PROMPT, &prompt).await?;
        debug!(reply = %reply, "Move reply received");
        Ok(reply)
    }
}
