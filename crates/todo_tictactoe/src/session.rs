//! Game session state machine.
//!
//! A [`Session`] owns the board, the task registry and the busy flag, and is
//! mutated only through its transitions. Oracle calls are split in two: a
//! synchronous *begin* hands out a ticket stamped with the session epoch, and
//! the result later comes back as an [`OracleEvent`] passed to
//! [`Session::apply`]. Every `start` and `reset` bumps the epoch, so results
//! that were in flight across a restart are recognised as stale and dropped.
//!
//! ```text
//! NotStarted --start--> HumanTurn --request_task--> (busy) --TaskGenerated--> HumanTaskPending(p)
//!                          ^                                                     |        |
//!                          |<----------------------cancel_task-------------------+        |
//!                          |                                                     complete_task
//!                          |                                                              v
//!                          +<--MoveReady-- (busy) <--begin_opponent_turn-- OpponentTurn <-+
//!
//! any placement with an outcome --> Finished(outcome) --start--> ...
//! any state --reset--> NotStarted
//! ```

use crate::oracle::{MoveChoice, OracleError};
use crate::settings::{Difficulty, FirstPlayer, GameSettings, Theme};
use crate::task::{Task, TaskRegistry};
use derive_more::{Display, Error};
use todo_board::{evaluate, Board, Mark, Outcome, Position, Square};
use tracing::{debug, error, info, instrument, warn};

/// The human's mark.
pub const HUMAN: Mark = Mark::X;
/// The opponent's mark.
pub const OPPONENT: Mark = Mark::O;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Menu: no game running.
    NotStarted,
    /// Human may pick a square.
    HumanTurn,
    /// Task fetched for this square, waiting for the human to finish it.
    HumanTaskPending(Position),
    /// Opponent is to move.
    OpponentTurn,
    /// Game over.
    Finished(Outcome),
}

impl Phase {
    /// True while a game is being played.
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            Self::HumanTurn | Self::HumanTaskPending(_) | Self::OpponentTurn
        )
    }

    /// Mark whose turn it is; `None` outside a running game.
    pub fn active_player(self) -> Option<Mark> {
        match self {
            Self::HumanTurn | Self::HumanTaskPending(_) => Some(HUMAN),
            Self::OpponentTurn => Some(OPPONENT),
            Self::NotStarted | Self::Finished(_) => None,
        }
    }

    /// Outcome of a finished game.
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Self::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Permission to apply one task-generation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTicket {
    epoch: u64,
    position: Position,
    theme: Theme,
    difficulty: Difficulty,
}

impl TaskTicket {
    /// Session epoch the ticket was issued in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Square the task is for.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Theme at issue time.
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Difficulty at issue time.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

/// Permission to apply one opponent move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTicket {
    epoch: u64,
    board: Board,
    theme: Theme,
}

impl MoveTicket {
    /// Session epoch the ticket was issued in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Board snapshot the move is chosen for. Always has an empty square.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Theme at issue time.
    pub fn theme(&self) -> Theme {
        self.theme
    }
}

/// Result of [`Session::request_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRequest {
    /// A task must be generated; the session is busy until it is applied.
    Generate(TaskTicket),
    /// An unclaimed task was already recorded for the square and is pending again.
    Reused,
}

/// Oracle result coming back to the session.
#[derive(Debug, Clone)]
pub enum OracleEvent {
    /// Task oracle finished.
    TaskGenerated {
        /// Ticket from `request_task`.
        ticket: TaskTicket,
        /// Task text or failure.
        result: Result<String, OracleError>,
    },
    /// Move decoded; reasoning can be shown while the move is held back.
    MoveChosen {
        /// Ticket from `begin_opponent_turn`.
        ticket: MoveTicket,
        /// Decoded move.
        choice: MoveChoice,
    },
    /// Pacing delay elapsed; place the move.
    MoveReady {
        /// Ticket from `begin_opponent_turn`.
        ticket: MoveTicket,
        /// Decoded move.
        choice: MoveChoice,
    },
    /// Move oracle failed before replying.
    MoveFailed {
        /// Ticket from `begin_opponent_turn`.
        ticket: MoveTicket,
        /// Failure.
        error: OracleError,
    },
}

impl OracleEvent {
    /// Epoch of the ticket carried by the event.
    pub fn epoch(&self) -> u64 {
        match self {
            Self::TaskGenerated { ticket, .. } => ticket.epoch,
            Self::MoveChosen { ticket, .. }
            | Self::MoveReady { ticket, .. }
            | Self::MoveFailed { ticket, .. } => ticket.epoch,
        }
    }
}

/// What [`Session::apply`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Event changed the session.
    Applied,
    /// Event belonged to an earlier game or an expired request and was dropped.
    Stale,
}

/// A transition that is not allowed in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TransitionError {
    /// Transition needs a different phase.
    #[display("{} is not allowed in phase {:?}", action, phase)]
    WrongPhase {
        /// Attempted transition.
        action: &'static str,
        /// Phase at the time.
        phase: Phase,
    },
    /// An oracle call is outstanding.
    #[display("An oracle call is in flight")]
    Busy,
    /// Square already holds a mark.
    #[display("{} is already occupied", _0)]
    SquareOccupied(#[error(not(source))] Position),
    /// No pending task for that square.
    #[display("No pending task for {}", _0)]
    NoPendingTask(#[error(not(source))] Position),
    /// Starting position is already decided.
    #[display("Starting position is already over: {}", _0)]
    AlreadyDecided(#[error(not(source))] Outcome),
}

/// A single game of todo tic-tac-toe.
#[derive(Debug, Clone)]
pub struct Session {
    epoch: u64,
    phase: Phase,
    board: Board,
    tasks: TaskRegistry,
    busy: bool,
    started: bool,
    settings: GameSettings,
    reasoning: Option<String>,
}

impl Session {
    /// Creates a session on the menu with default settings.
    #[instrument]
    pub fn new() -> Self {
        Self::with_settings(GameSettings::default())
    }

    /// Creates a session on the menu with the given settings.
    #[instrument]
    pub fn with_settings(settings: GameSettings) -> Self {
        debug!("Creating session");
        Self {
            epoch: 0,
            phase: Phase::NotStarted,
            board: Board::new(),
            tasks: TaskRegistry::new(),
            busy: false,
            started: false,
            settings,
            reasoning: None,
        }
    }

    /// Current epoch; changes on every start and reset.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Tasks generated this game.
    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    /// True while an oracle call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// True once a game has been started and until reset.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Menu settings.
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Latest opponent reasoning, for display.
    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }

    /// Mark whose turn it is.
    pub fn active_player(&self) -> Option<Mark> {
        self.phase.active_player()
    }

    /// Outcome once finished.
    pub fn outcome(&self) -> Option<Outcome> {
        self.phase.outcome()
    }

    /// Square and task the human is working on.
    pub fn pending_task(&self) -> Option<(Position, &Task)> {
        match self.phase {
            Phase::HumanTaskPending(pos) => self.tasks.get(pos).map(|task| (pos, task)),
            _ => None,
        }
    }

    /// True when the opponent is to move and no call is running.
    pub fn opponent_turn_due(&self) -> bool {
        self.phase == Phase::OpponentTurn && !self.busy
    }

    /// Changes the theme. Only on the menu or after a game.
    #[instrument(skip(self))]
    pub fn select_theme(&mut self, theme: Theme) -> Result<(), TransitionError> {
        self.ensure_not_in_progress("select_theme")?;
        self.settings.theme = theme;
        Ok(())
    }

    /// Changes the difficulty. Only on the menu or after a game.
    #[instrument(skip(self))]
    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> Result<(), TransitionError> {
        self.ensure_not_in_progress("select_difficulty")?;
        self.settings.difficulty = difficulty;
        Ok(())
    }

    /// Changes who opens. Only on the menu or after a game.
    #[instrument(skip(self))]
    pub fn select_first_player(&mut self, first_player: FirstPlayer) -> Result<(), TransitionError> {
        self.ensure_not_in_progress("select_first_player")?;
        self.settings.first_player = first_player;
        Ok(())
    }

    /// Starts a game on an empty board.
    #[instrument(skip(self), fields(epoch = self.epoch))]
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.start_from(Board::new())
    }

    /// Starts a game from the given position; the first-player setting
    /// decides who moves.
    #[instrument(skip(self, board), fields(epoch = self.epoch))]
    pub fn start_from(&mut self, board: Board) -> Result<(), TransitionError> {
        self.ensure_not_in_progress("start")?;
        if let Some(outcome) = evaluate(&board) {
            return Err(TransitionError::AlreadyDecided(outcome));
        }

        self.epoch += 1;
        self.board = board;
        self.tasks = TaskRegistry::new();
        self.busy = false;
        self.started = true;
        self.reasoning = None;
        self.phase = match self.settings.first_player {
            FirstPlayer::Human => Phase::HumanTurn,
            FirstPlayer::Opponent => Phase::OpponentTurn,
        };
        info!(
            epoch = self.epoch,
            theme = %self.settings.theme,
            difficulty = %self.settings.difficulty,
            phase = ?self.phase,
            "Game started"
        );
        Ok(())
    }

    /// Asks for the task that claims `pos`.
    ///
    /// Never touches the board. When an unclaimed task from a cancelled
    /// attempt is on record for the square, it becomes pending again without
    /// a new oracle call.
    #[instrument(skip(self), fields(epoch = self.epoch))]
    pub fn request_task(&mut self, pos: Position) -> Result<TaskRequest, TransitionError> {
        self.ensure_phase("request_task", Phase::HumanTurn)?;
        self.ensure_idle()?;
        if !self.board.is_empty(pos) {
            return Err(TransitionError::SquareOccupied(pos));
        }

        if self.tasks.pending(pos).is_some() {
            debug!("Reusing unclaimed task");
            self.phase = Phase::HumanTaskPending(pos);
            return Ok(TaskRequest::Reused);
        }

        self.busy = true;
        debug!("Task requested");
        Ok(TaskRequest::Generate(TaskTicket {
            epoch: self.epoch,
            position: pos,
            theme: self.settings.theme,
            difficulty: self.settings.difficulty,
        }))
    }

    /// Confirms the pending task for `pos` and claims the square.
    #[instrument(skip(self), fields(epoch = self.epoch))]
    pub fn complete_task(&mut self, pos: Position) -> Result<(), TransitionError> {
        self.ensure_phase("complete_task", Phase::HumanTaskPending(pos))?;
        self.ensure_idle()?;
        if !self.tasks.complete(pos) {
            return Err(TransitionError::NoPendingTask(pos));
        }
        info!(position = %pos, "Task completed");
        self.place(HUMAN, pos);
        Ok(())
    }

    /// Backs out of the pending task for `pos`; the task stays on record.
    #[instrument(skip(self), fields(epoch = self.epoch))]
    pub fn cancel_task(&mut self, pos: Position) -> Result<(), TransitionError> {
        self.ensure_phase("cancel_task", Phase::HumanTaskPending(pos))?;
        debug!("Task cancelled");
        self.phase = Phase::HumanTurn;
        Ok(())
    }

    /// Issues the ticket for one opponent move.
    #[instrument(skip(self), fields(epoch = self.epoch))]
    pub fn begin_opponent_turn(&mut self) -> Result<MoveTicket, TransitionError> {
        self.ensure_phase("begin_opponent_turn", Phase::OpponentTurn)?;
        self.ensure_idle()?;
        self.busy = true;
        debug!("Opponent turn begun");
        Ok(MoveTicket {
            epoch: self.epoch,
            board: self.board.clone(),
            theme: self.settings.theme,
        })
    }

    /// Applies an oracle result, dropping it if it no longer matches the game.
    #[instrument(skip(self, event), fields(epoch = self.epoch, event_epoch = event.epoch()))]
    pub fn apply(&mut self, event: OracleEvent) -> Delivery {
        if event.epoch() != self.epoch {
            info!("Discarding result from an earlier game");
            return Delivery::Stale;
        }

        match event {
            OracleEvent::TaskGenerated { ticket, result } => {
                if self.phase != Phase::HumanTurn || !self.busy {
                    warn!(phase = ?self.phase, "Task result arrived without a pending request");
                    return Delivery::Stale;
                }
                self.busy = false;
                match result {
                    Ok(description) => {
                        let pos = ticket.position;
                        self.tasks.record(pos, description, HUMAN);
                        self.phase = Phase::HumanTaskPending(pos);
                        info!(position = %pos, "Task ready");
                    }
                    Err(e) => {
                        warn!(error = %e, "Task generation failed, claim aborted");
                    }
                }
                Delivery::Applied
            }
            OracleEvent::MoveChosen { choice, .. } => {
                if !self.awaiting_move() {
                    return Delivery::Stale;
                }
                debug!(position = %choice.position, fallback = choice.fallback, "Opponent reasoning received");
                self.reasoning = Some(choice.reasoning);
                Delivery::Applied
            }
            OracleEvent::MoveReady { choice, .. } => {
                if !self.awaiting_move() {
                    return Delivery::Stale;
                }
                self.busy = false;
                let target = if self.board.is_empty(choice.position) {
                    Some(choice.position)
                } else {
                    warn!(position = %choice.position, "Chosen square taken, using first empty");
                    self.board.first_empty()
                };
                self.reasoning = Some(choice.reasoning);
                match target {
                    Some(pos) => self.place(OPPONENT, pos),
                    None => error!("Opponent asked to move on a full board"),
                }
                Delivery::Applied
            }
            OracleEvent::MoveFailed { error, .. } => {
                if !self.awaiting_move() {
                    return Delivery::Stale;
                }
                warn!(error = %error, "Opponent move failed; turn can be retried");
                self.busy = false;
                Delivery::Applied
            }
        }
    }

    /// Abandons the game and returns to the menu with default settings.
    #[instrument(skip(self), fields(epoch = self.epoch))]
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self::new();
        self.epoch = epoch;
        info!(epoch, "Session reset");
    }

    /// Places a mark, evaluates the board once, and moves to the next phase.
    fn place(&mut self, mark: Mark, pos: Position) {
        self.board.set(pos, Square::Occupied(mark));
        self.phase = match evaluate(&self.board) {
            Some(outcome) => {
                info!(%outcome, "Game finished");
                Phase::Finished(outcome)
            }
            None if mark == HUMAN => Phase::OpponentTurn,
            None => Phase::HumanTurn,
        };
        debug!(mark = %mark, position = %pos, phase = ?self.phase, "Mark placed");
    }

    fn awaiting_move(&self) -> bool {
        let waiting = self.phase == Phase::OpponentTurn && self.busy;
        if !waiting {
            warn!(phase = ?self.phase, busy = self.busy, "Move result arrived without a pending turn");
        }
        waiting
    }

    fn ensure_phase(&self, action: &'static str, expected: Phase) -> Result<(), TransitionError> {
        if self.phase == expected {
            Ok(())
        } else {
            debug!(action, phase = ?self.phase, "Transition rejected");
            Err(TransitionError::WrongPhase {
                action,
                phase: self.phase,
            })
        }
    }

    fn ensure_not_in_progress(&self, action: &'static str) -> Result<(), TransitionError> {
        if self.phase.is_in_progress() {
            debug!(action, phase = ?self.phase, "Transition rejected");
            return Err(TransitionError::WrongPhase {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), TransitionError> {
        if self.busy {
            debug!("Transition rejected while busy");
            return Err(TransitionError::Busy);
        }
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket_for(request: TaskRequest) -> TaskTicket {
        match request {
            TaskRequest::Generate(ticket) => ticket,
            TaskRequest::Reused => panic!("expected a fresh ticket"),
        }
    }

    #[test]
    fn test_new_session_is_on_menu() {
        let session = Session::new();
        assert_eq!(session.phase(), Phase::NotStarted);
        assert_eq!(session.active_player(), None);
        assert!(!session.is_started());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_busy_blocks_other_transitions() {
        let mut session = Session::new();
        session.start().unwrap();
        let _ticket = ticket_for(session.request_task(Position::Center).unwrap());

        assert!(session.is_busy());
        assert_eq!(
            session.request_task(Position::TopLeft),
            Err(TransitionError::Busy)
        );
        assert!(session.complete_task(Position::Center).is_err());
        assert!(session.begin_opponent_turn().is_err());
    }

    #[test]
    fn test_settings_locked_during_game() {
        let mut session = Session::new();
        session.select_theme(Theme::ZenMaster).unwrap();
        session.start().unwrap();
        assert!(session.select_difficulty(Difficulty::Hard).is_err());
        assert_eq!(session.settings().theme, Theme::ZenMaster);
    }

    #[test]
    fn test_start_rejected_mid_game() {
        let mut session = Session::new();
        session.start().unwrap();
        assert!(matches!(
            session.start(),
            Err(TransitionError::WrongPhase { action: "start", .. })
        ));
    }

    #[test]
    fn test_start_from_decided_board_rejected() {
        let mut session = Session::new();
        let board: Board = "XXXOO____".parse().unwrap();
        assert_eq!(
            session.start_from(board),
            Err(TransitionError::AlreadyDecided(Outcome::Winner(Mark::X)))
        );
        assert_eq!(session.phase(), Phase::NotStarted);
    }

    #[test]
    fn test_opponent_first_setting() {
        let mut session = Session::new();
        session.select_first_player(FirstPlayer::Opponent).unwrap();
        session.start().unwrap();
        assert_eq!(session.phase(), Phase::OpponentTurn);
        assert!(session.opponent_turn_due());
    }

    #[test]
    fn test_reset_restores_defaults_and_bumps_epoch() {
        let mut session = Session::new();
        session.select_theme(Theme::PopCulture).unwrap();
        session.start().unwrap();
        let epoch = session.epoch();
        session.reset();
        assert_eq!(session.phase(), Phase::NotStarted);
        assert_eq!(session.settings(), &GameSettings::default());
        assert!(session.epoch() > epoch);
        assert!(!session.is_started());
    }
}
