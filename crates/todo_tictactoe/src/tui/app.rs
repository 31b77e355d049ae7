//! Application state and key handling.

use super::input::move_cursor;
use crossterm::event::KeyCode;
use std::sync::Arc;
use std::time::Duration;
use todo_tictactoe::oracle::{drive_opponent_turn, drive_task_request};
use todo_tictactoe::{
    Board, Delivery, GameSettings, Mark, MoveOracle, OracleEvent, Outcome, Phase, Position,
    Session, TaskOracle, TaskRequest, TransitionError,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// Main application state.
///
/// Owns the session. Oracle calls run on spawned tasks and report back
/// through `tx`; the UI loop feeds those events to [`App::handle_event`].
pub struct App {
    session: Session,
    cursor: Position,
    status: String,
    preferred: GameSettings,
    start_board: Option<Board>,
    stalled: bool,
    should_quit: bool,
    task_oracle: Arc<dyn TaskOracle>,
    move_oracle: Arc<dyn MoveOracle>,
    pacing: Duration,
    tx: UnboundedSender<OracleEvent>,
}

impl App {
    /// Creates the app on the menu with the given preselected settings.
    pub fn new(
        preferred: GameSettings,
        task_oracle: Arc<dyn TaskOracle>,
        move_oracle: Arc<dyn MoveOracle>,
        pacing: Duration,
        tx: UnboundedSender<OracleEvent>,
    ) -> Self {
        Self {
            session: Session::with_settings(preferred),
            cursor: Position::Center,
            status: "Pick a theme and press Enter to start.".to_string(),
            preferred,
            start_board: None,
            stalled: false,
            should_quit: false,
            task_oracle,
            move_oracle,
            pacing,
            tx,
        }
    }

    /// Starts games from `board` instead of an empty board.
    pub fn with_start_board(mut self, board: Option<Board>) -> Self {
        self.start_board = board;
        self
    }

    /// The session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Board cursor.
    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Last status message.
    pub fn status_message(&self) -> &str {
        &self.status
    }

    /// True after a failed opponent call, until the retry key is pressed.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// True once the user asked to quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Headline for the status panel.
    pub fn turn_label(&self) -> &'static str {
        match self.session.phase() {
            Phase::NotStarted => "Choose your vibe",
            Phase::HumanTurn if self.session.is_busy() => "Generating task...",
            Phase::HumanTurn | Phase::HumanTaskPending(_) => "Your Turn",
            Phase::OpponentTurn if self.stalled => "Opponent unavailable",
            Phase::OpponentTurn => "Thinking...",
            Phase::Finished(outcome) => outcome_label(outcome),
        }
    }

    /// Handles one key press.
    #[instrument(skip(self), fields(phase = ?self.session.phase(), busy = self.session.is_busy()))]
    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                info!("User quit");
                self.should_quit = true;
                return;
            }
            KeyCode::Char('r') | KeyCode::Char('R') if self.session.is_started() => {
                self.reset();
                return;
            }
            _ => {}
        }

        let result = match self.session.phase() {
            Phase::NotStarted => self.handle_menu_key(key),
            Phase::Finished(_) => self.handle_finished_key(key),
            Phase::HumanTurn => self.handle_board_key(key),
            Phase::HumanTaskPending(pos) => self.handle_task_key(pos, key),
            Phase::OpponentTurn => self.handle_opponent_key(key),
        };
        if let Err(e) = result {
            debug!(error = %e, "Key ignored");
        }
        self.tick();
    }

    /// Applies an oracle event coming back from a spawned driver.
    #[instrument(skip(self, event), fields(event_epoch = event.epoch()))]
    pub fn handle_event(&mut self, event: OracleEvent) {
        let failure = match &event {
            OracleEvent::TaskGenerated { result: Err(e), .. } => {
                Some(format!("Task generation failed: {}", e))
            }
            OracleEvent::MoveFailed { error, .. } => {
                Some(format!("Opponent unavailable: {}. Press 'm' to retry.", error))
            }
            _ => None,
        };
        let move_failed = matches!(event, OracleEvent::MoveFailed { .. });

        if self.session.apply(event) == Delivery::Stale {
            return;
        }

        if let Some(message) = failure {
            warn!(message = %message, "Oracle failure");
            self.stalled = move_failed;
            self.status = message;
        } else {
            self.refresh_status();
        }
        self.tick();
    }

    /// Kicks off the opponent's turn when it is due.
    pub fn tick(&mut self) {
        if self.session.opponent_turn_due() && !self.stalled {
            self.spawn_opponent_turn();
        }
    }

    fn handle_menu_key(&mut self, key: KeyCode) -> Result<(), TransitionError> {
        let settings = *self.session.settings();
        match key {
            KeyCode::Up => self.session.select_theme(settings.theme.previous())?,
            KeyCode::Down => self.session.select_theme(settings.theme.next())?,
            KeyCode::Char('d') | KeyCode::Char('D') => {
                self.session.select_difficulty(settings.difficulty.next())?
            }
            KeyCode::Char('f') | KeyCode::Char('F') => self
                .session
                .select_first_player(settings.first_player.toggle())?,
            KeyCode::Enter => self.start()?,
            _ => {}
        }
        Ok(())
    }

    /// Only Enter does anything once a game is over; settings stay on the menu.
    fn handle_finished_key(&mut self, key: KeyCode) -> Result<(), TransitionError> {
        if key == KeyCode::Enter {
            self.start()?;
        }
        Ok(())
    }

    fn handle_board_key(&mut self, key: KeyCode) -> Result<(), TransitionError> {
        match key {
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                self.cursor = move_cursor(self.cursor, key);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.request_task(self.cursor)?,
            _ => {}
        }
        Ok(())
    }

    fn handle_task_key(&mut self, pos: Position, key: KeyCode) -> Result<(), TransitionError> {
        match key {
            KeyCode::Enter => {
                self.session.complete_task(pos)?;
                self.refresh_status();
            }
            KeyCode::Esc => {
                self.session.cancel_task(pos)?;
                self.status = "No rush. Pick any square when you're ready.".to_string();
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_opponent_key(&mut self, key: KeyCode) -> Result<(), TransitionError> {
        if matches!(key, KeyCode::Char('m') | KeyCode::Char('M')) && self.stalled {
            info!("Retrying opponent turn");
            self.stalled = false;
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), TransitionError> {
        match self.start_board.clone() {
            Some(board) => self.session.start_from(board)?,
            None => self.session.start()?,
        }
        self.cursor = Position::Center;
        self.stalled = false;
        self.refresh_status();
        Ok(())
    }

    fn request_task(&mut self, pos: Position) -> Result<(), TransitionError> {
        match self.session.request_task(pos)? {
            TaskRequest::Reused => {
                debug!(position = %pos, "Showing unclaimed task again");
            }
            TaskRequest::Generate(ticket) => {
                self.status = format!("Generating a task for square {}...", pos.to_index() + 1);
                tokio::spawn(drive_task_request(
                    Arc::clone(&self.task_oracle),
                    ticket,
                    self.tx.clone(),
                ));
            }
        }
        Ok(())
    }

    fn spawn_opponent_turn(&mut self) {
        match self.session.begin_opponent_turn() {
            Ok(ticket) => {
                self.status = "Opponent is thinking...".to_string();
                tokio::spawn(drive_opponent_turn(
                    Arc::clone(&self.move_oracle),
                    ticket,
                    self.pacing,
                    self.tx.clone(),
                ));
            }
            Err(e) => debug!(error = %e, "Opponent turn not started"),
        }
    }

    /// Forfeits and returns to the menu with the preferred settings.
    fn reset(&mut self) {
        info!("Forfeit and restart");
        self.session.reset();
        let restored = self
            .session
            .select_theme(self.preferred.theme)
            .and_then(|()| self.session.select_difficulty(self.preferred.difficulty))
            .and_then(|()| self.session.select_first_player(self.preferred.first_player));
        if let Err(e) = restored {
            warn!(error = %e, "Could not restore preferred settings");
        }
        self.stalled = false;
        self.cursor = Position::Center;
        self.status = "Game reset. Pick a theme and press Enter to start.".to_string();
    }

    fn refresh_status(&mut self) {
        self.status = match self.session.phase() {
            Phase::NotStarted => "Pick a theme and press Enter to start.".to_string(),
            Phase::HumanTurn => "Pick a square and press Enter to get its task.".to_string(),
            Phase::HumanTaskPending(pos) => {
                format!("Finish the quest for square {}.", pos.to_index() + 1)
            }
            Phase::OpponentTurn => "Opponent is thinking...".to_string(),
            Phase::Finished(outcome) => {
                format!("{} Press Enter to play again or 'q' to quit.", outcome_label(outcome))
            }
        };
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Winner(Mark::X) => "You Won!",
        Outcome::Winner(Mark::O) => "Opponent Won!",
        Outcome::Draw => "It's a Tie!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_tictactoe::{FirstPlayer, OfflineOracle, OracleError, Theme};
    use tokio::sync::mpsc;

    struct DownOracle;

    #[async_trait::async_trait]
    impl MoveOracle for DownOracle {
        async fn select_move(&self, _board: &Board, _theme: Theme) -> Result<String, OracleError> {
            Err(OracleError::Unavailable("offline".to_string()))
        }
    }

    fn app_with(
        move_oracle: Arc<dyn MoveOracle>,
    ) -> (App, mpsc::UnboundedReceiver<OracleEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(
            GameSettings::default(),
            Arc::new(OfflineOracle::new()),
            move_oracle,
            Duration::ZERO,
            tx,
        );
        (app, rx)
    }

    #[tokio::test]
    async fn test_claiming_a_square_through_keys() {
        let (mut app, mut rx) = app_with(Arc::new(OfflineOracle::new()));
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.session().phase(), Phase::HumanTurn);

        app.handle_key(KeyCode::Enter);
        assert!(app.session().is_busy());
        app.handle_event(rx.recv().await.unwrap());
        assert_eq!(
            app.session().phase(),
            Phase::HumanTaskPending(Position::Center)
        );

        app.handle_key(KeyCode::Enter);
        assert_eq!(app.session().board().get(Position::Center).mark(), Some(Mark::X));
        assert_eq!(app.turn_label(), "Thinking...");

        // MoveChosen then MoveReady.
        app.handle_event(rx.recv().await.unwrap());
        app.handle_event(rx.recv().await.unwrap());
        assert_eq!(app.session().phase(), Phase::HumanTurn);
        assert_eq!(app.session().board().occupied_count(), 2);
    }

    #[tokio::test]
    async fn test_input_ignored_while_task_generates() {
        let (mut app, _rx) = app_with(Arc::new(OfflineOracle::new()));
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Enter);
        assert!(app.session().is_busy());

        app.handle_key(KeyCode::Left);
        app.handle_key(KeyCode::Enter);
        assert!(app.session().tasks().is_empty());
        assert_eq!(app.session().phase(), Phase::HumanTurn);
    }

    #[tokio::test]
    async fn test_failed_opponent_waits_for_retry() {
        let (mut app, mut rx) = app_with(Arc::new(DownOracle));
        app.handle_key(KeyCode::Char('f'));
        assert_eq!(app.session().settings().first_player, FirstPlayer::Opponent);
        app.handle_key(KeyCode::Enter);
        assert!(app.session().is_busy());

        app.handle_event(rx.recv().await.unwrap());
        assert!(app.is_stalled());
        assert!(!app.session().is_busy());
        assert_eq!(app.session().phase(), Phase::OpponentTurn);

        app.handle_key(KeyCode::Char('m'));
        assert!(!app.is_stalled());
        assert!(app.session().is_busy());
    }

    #[tokio::test]
    async fn test_finished_game_only_accepts_enter() {
        let (app, mut rx) = app_with(Arc::new(OfflineOracle::new()));
        let mut app = app.with_start_board(Some("XX_OO____".parse().unwrap()));
        app.handle_key(KeyCode::Char('f'));
        app.handle_key(KeyCode::Enter);

        // MoveChosen then MoveReady completes the middle row.
        app.handle_event(rx.recv().await.unwrap());
        app.handle_event(rx.recv().await.unwrap());
        assert_eq!(
            app.session().phase(),
            Phase::Finished(Outcome::Winner(Mark::O))
        );
        assert_eq!(app.turn_label(), "Opponent Won!");

        let settings = *app.session().settings();
        for key in [
            KeyCode::Up,
            KeyCode::Down,
            KeyCode::Char('d'),
            KeyCode::Char('f'),
        ] {
            app.handle_key(key);
        }
        assert_eq!(*app.session().settings(), settings);
        assert_eq!(
            app.session().phase(),
            Phase::Finished(Outcome::Winner(Mark::O))
        );

        app.handle_key(KeyCode::Enter);
        assert_eq!(app.session().outcome(), None);
        assert_eq!(app.session().board().occupied_count(), 4);
        assert_eq!(app.session().settings().first_player, FirstPlayer::Opponent);
    }

    #[tokio::test]
    async fn test_reset_returns_to_menu_with_preferred_settings() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let preferred = GameSettings {
            theme: Theme::HistoryBuff,
            ..GameSettings::default()
        };
        let oracle = Arc::new(OfflineOracle::new());
        let mut app = App::new(preferred, oracle.clone(), oracle, Duration::ZERO, tx);
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Char('r'));
        assert_eq!(app.session().phase(), Phase::NotStarted);
        assert_eq!(app.session().settings().theme, Theme::HistoryBuff);
    }
}
