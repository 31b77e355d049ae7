//! Integration tests against live LLM providers.

use todo_tictactoe::llm_client::{LlmClient, LlmConfig, LlmProvider};
use todo_tictactoe::{Board, Difficulty, LlmOracle, MoveChoice, MoveOracle, Position, TaskOracle, Theme};
use tracing::instrument;

fn gemini_client() -> LlmClient {
    dotenvy::dotenv().ok();
    let api_key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY not set");
    LlmClient::new(LlmConfig::new(
        LlmProvider::Gemini,
        api_key,
        "gemini-2.0-flash".to_string(),
        256,
    ))
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
#[instrument]
async fn test_gemini_connectivity() {
    let response = gemini_client()
        .generate("You are a helpful assistant.", "Say 'Hello, world!' and nothing else.")
        .await
        .expect("Failed to generate");

    assert!(!response.is_empty(), "Response should not be empty");
    eprintln!("Response: {}", response);
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
#[instrument]
async fn test_anthropic_connectivity() {
    dotenvy::dotenv().ok();
    let api_key = std::env::var("ANTHROPIC_API_KEY").expect("ANTHROPIC_API_KEY not set");
    let client = LlmClient::new(LlmConfig::new(
        LlmProvider::Anthropic,
        api_key,
        "claude-3-5-haiku-20241022".to_string(),
        50,
    ));

    let response = client
        .generate("You are a helpful assistant.", "Say 'Hello, world!' and nothing else.")
        .await
        .expect("Failed to generate");

    assert!(!response.is_empty(), "Response should not be empty");
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
#[instrument]
async fn test_llm_oracle_generates_task() {
    let oracle = LlmOracle::new(gemini_client());
    let task = oracle
        .generate_task(Theme::FitnessHealth, Position::Center, Difficulty::Easy)
        .await
        .expect("Failed to generate task");

    assert!(!task.trim().is_empty());
    eprintln!("Task: {}", task);
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
#[instrument]
async fn test_llm_oracle_move_is_playable() {
    let oracle = LlmOracle::new(gemini_client());
    let board: Board = "XX_OO____".parse().unwrap();
    let raw = oracle
        .select_move(&board, Theme::GeneralFun)
        .await
        .expect("Failed to select move");

    let choice = MoveChoice::decode_or_fallback(&raw, &board);
    assert!(board.is_empty(choice.position));
    eprintln!("Move: {} ({})", choice.position, choice.reasoning);
}
