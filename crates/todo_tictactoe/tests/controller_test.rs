//! Tests for oracle drivers and the sequential controller.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use todo_tictactoe::oracle::{drive_opponent_turn, drive_task_request};
use todo_tictactoe::{
    Board, Delivery, Difficulty, FirstPlayer, GameController, Mark, MoveOracle, OfflineOracle,
    OracleError, OracleEvent, Outcome, Phase, Position, Session, Square, TaskOracle,
    TaskRequest, Theme,
};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Always returns the same task text and counts calls.
#[derive(Default)]
struct CountingTasks {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl TaskOracle for CountingTasks {
    async fn generate_task(
        &self,
        _theme: Theme,
        _position: Position,
        _difficulty: Difficulty,
    ) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Do 10 jumping jacks.".to_string())
    }
}

/// Replies with a fixed raw string and counts calls.
struct ScriptedMoves {
    reply: Result<String, OracleError>,
    calls: AtomicUsize,
}

impl ScriptedMoves {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            reply: Err(OracleError::Unavailable("network down".to_string())),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl MoveOracle for ScriptedMoves {
    async fn select_move(&self, board: &Board, _theme: Theme) -> Result<String, OracleError> {
        assert!(board.first_empty().is_some(), "asked to move on a full board");
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

fn controller(
    tasks: Arc<CountingTasks>,
    moves: Arc<ScriptedMoves>,
    first_player: FirstPlayer,
) -> GameController {
    let mut session = Session::new();
    session.select_first_player(first_player).unwrap();
    GameController::new(session, tasks, moves).with_pacing(Duration::ZERO)
}

#[tokio::test]
async fn test_completing_center_triggers_opponent_move() {
    let tasks = Arc::new(CountingTasks::default());
    let moves = Arc::new(ScriptedMoves::replying(
        r#"{"index": 0, "reasoning": "Corner."}"#,
    ));
    let mut game = controller(tasks.clone(), moves.clone(), FirstPlayer::Human);

    game.start().await.unwrap();
    game.request_task(Position::Center).await.unwrap();
    assert_eq!(tasks.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        game.session().phase(),
        Phase::HumanTaskPending(Position::Center)
    );
    assert_eq!(moves.calls.load(Ordering::SeqCst), 0);

    game.complete_task(Position::Center).await.unwrap();
    let board = game.session().board();
    assert_eq!(board.get(Position::Center), Square::Occupied(Mark::X));
    assert_eq!(moves.calls.load(Ordering::SeqCst), 1);
    assert_eq!(board.get(Position::TopLeft), Square::Occupied(Mark::O));
    assert_eq!(game.session().reasoning(), Some("Corner."));
    assert_eq!(game.session().phase(), Phase::HumanTurn);
}

#[tokio::test]
async fn test_opponent_wins_from_scripted_reply() {
    let tasks = Arc::new(CountingTasks::default());
    let moves = Arc::new(ScriptedMoves::replying(
        "```json\n{\"index\": 5, \"reasoning\": \"Completing the middle row.\"}\n```",
    ));
    let mut game = controller(tasks, moves, FirstPlayer::Opponent);

    game.start_from("XX_OO____".parse().unwrap()).await.unwrap();
    assert_eq!(game.session().outcome(), Some(Outcome::Winner(Mark::O)));
    assert_eq!(game.session().active_player(), None);
}

#[tokio::test]
async fn test_malformed_reply_falls_back_to_only_empty_square() {
    let tasks = Arc::new(CountingTasks::default());
    let moves = Arc::new(ScriptedMoves::replying("I'd rather not say."));
    let mut game = controller(tasks, moves, FirstPlayer::Opponent);

    game.start_from("XOXXOOO_X".parse().unwrap()).await.unwrap();
    assert_eq!(
        game.session().board().get(Position::BottomCenter),
        Square::Occupied(Mark::O)
    );
    assert_eq!(
        game.session().reasoning(),
        Some("Error in logic, picking first available.")
    );
}

#[tokio::test]
async fn test_occupied_reply_falls_back() {
    let tasks = Arc::new(CountingTasks::default());
    let moves = Arc::new(ScriptedMoves::replying(
        r#"{"index": 0, "reasoning": "Taken already."}"#,
    ));
    let mut game = controller(tasks, moves, FirstPlayer::Opponent);

    game.start_from("X________".parse().unwrap()).await.unwrap();
    assert_eq!(
        game.session().board().get(Position::TopCenter),
        Square::Occupied(Mark::O)
    );
}

#[tokio::test]
async fn test_move_oracle_failure_leaves_turn_open() {
    let tasks = Arc::new(CountingTasks::default());
    let moves = Arc::new(ScriptedMoves::failing());
    let mut game = controller(tasks, moves.clone(), FirstPlayer::Opponent);

    game.start().await.unwrap();
    assert_eq!(game.session().phase(), Phase::OpponentTurn);
    assert!(!game.session().is_busy());
    assert_eq!(game.session().board().occupied_count(), 0);

    game.run_opponent_turn().await.unwrap();
    assert_eq!(moves.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cancelled_task_is_not_regenerated() {
    let tasks = Arc::new(CountingTasks::default());
    let moves = Arc::new(ScriptedMoves::replying(r#"{"index": 8, "reasoning": "x"}"#));
    let mut game = controller(tasks.clone(), moves, FirstPlayer::Human);

    game.start().await.unwrap();
    game.request_task(Position::TopLeft).await.unwrap();
    game.session_mut().cancel_task(Position::TopLeft).unwrap();
    game.request_task(Position::TopLeft).await.unwrap();

    assert_eq!(tasks.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        game.session().phase(),
        Phase::HumanTaskPending(Position::TopLeft)
    );
}

#[tokio::test(start_paused = true)]
async fn test_reasoning_shown_before_mark_is_placed() {
    let pacing = Duration::from_millis(1500);
    let mut session = Session::new();
    session.select_first_player(FirstPlayer::Opponent).unwrap();
    session.start().unwrap();
    let ticket = session.begin_opponent_turn().unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let oracle: Arc<dyn MoveOracle> = Arc::new(OfflineOracle::new());
    let started = Instant::now();
    tokio::spawn(drive_opponent_turn(oracle, ticket, pacing, tx));

    let chosen = rx.recv().await.unwrap();
    assert!(matches!(chosen, OracleEvent::MoveChosen { .. }));
    assert_eq!(session.apply(chosen), Delivery::Applied);
    assert!(session.reasoning().is_some());
    assert_eq!(session.board().occupied_count(), 0);
    assert!(session.is_busy());
    assert!(started.elapsed() < pacing);

    let ready = rx.recv().await.unwrap();
    assert!(started.elapsed() >= pacing);
    assert_eq!(session.apply(ready), Delivery::Applied);
    assert_eq!(session.board().get(Position::Center), Square::Occupied(Mark::O));
    assert!(!session.is_busy());
    assert_eq!(session.phase(), Phase::HumanTurn);
}

#[tokio::test(start_paused = true)]
async fn test_controller_waits_for_pacing() {
    let tasks = Arc::new(CountingTasks::default());
    let moves = Arc::new(ScriptedMoves::replying(r#"{"index": 4, "reasoning": "x"}"#));
    let mut session = Session::new();
    session.select_first_player(FirstPlayer::Opponent).unwrap();
    let mut game = GameController::new(session, tasks, moves);

    let started = Instant::now();
    game.start().await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(1500));
    assert_eq!(
        game.session().board().get(Position::Center),
        Square::Occupied(Mark::O)
    );
}

#[tokio::test]
async fn test_task_result_after_reset_is_stale() {
    let tasks: Arc<dyn TaskOracle> = Arc::new(CountingTasks::default());
    let mut session = Session::new();
    session.start().unwrap();
    let ticket = match session.request_task(Position::Center).unwrap() {
        TaskRequest::Generate(ticket) => ticket,
        TaskRequest::Reused => panic!("expected a fresh ticket"),
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let driver = tokio::spawn(drive_task_request(tasks, ticket, tx));
    session.reset();
    session.start().unwrap();

    driver.await.unwrap();
    let event = rx.recv().await.unwrap();
    assert_eq!(session.apply(event), Delivery::Stale);
    assert!(session.tasks().is_empty());
    assert_eq!(session.phase(), Phase::HumanTurn);
}
