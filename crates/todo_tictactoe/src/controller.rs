//! Sequential driver for a [`Session`] without a UI loop.
//!
//! Each call runs begin, oracle, apply to completion before returning, so
//! the session is never observed mid-call. The TUI does the same thing with
//! spawned tasks; this type is what tests and scripted play use.

use crate::oracle::{drive_opponent_turn, drive_task_request, MoveOracle, TaskOracle};
use crate::session::{Delivery, OracleEvent, Session, TaskRequest, TransitionError};
use std::sync::Arc;
use std::time::Duration;
use todo_board::{Board, Position};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// Delay between showing the opponent's reasoning and placing its mark.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1500);

/// Owns a session and its oracles.
pub struct GameController {
    session: Session,
    task_oracle: Arc<dyn TaskOracle>,
    move_oracle: Arc<dyn MoveOracle>,
    pacing: Duration,
}

impl std::fmt::Debug for GameController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameController")
            .field("session", &self.session)
            .field("pacing", &self.pacing)
            .finish_non_exhaustive()
    }
}

impl GameController {
    /// Creates a controller with the default pacing.
    pub fn new(
        session: Session,
        task_oracle: Arc<dyn TaskOracle>,
        move_oracle: Arc<dyn MoveOracle>,
    ) -> Self {
        Self {
            session,
            task_oracle,
            move_oracle,
            pacing: DEFAULT_PACING,
        }
    }

    /// Overrides the opponent pacing delay.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// The session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access for synchronous transitions (settings, cancel, reset).
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Starts a game, playing the opponent's opening move if it goes first.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<(), TransitionError> {
        self.session.start()?;
        self.run_opponent_if_due().await
    }

    /// Starts from a position, playing the opponent's move if it goes first.
    #[instrument(skip(self, board))]
    pub async fn start_from(&mut self, board: Board) -> Result<(), TransitionError> {
        self.session.start_from(board)?;
        self.run_opponent_if_due().await
    }

    /// Requests the task for `pos` and waits for it.
    ///
    /// On success the session is in `HumanTaskPending(pos)`. An oracle failure
    /// leaves it in `HumanTurn`; the failure is logged, not returned.
    #[instrument(skip(self))]
    pub async fn request_task(&mut self, pos: Position) -> Result<(), TransitionError> {
        let ticket = match self.session.request_task(pos)? {
            TaskRequest::Generate(ticket) => ticket,
            TaskRequest::Reused => return Ok(()),
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        drive_task_request(Arc::clone(&self.task_oracle), ticket, tx).await;
        self.drain(&mut rx);
        Ok(())
    }

    /// Completes the pending task for `pos`, then plays the opponent's reply.
    #[instrument(skip(self))]
    pub async fn complete_task(&mut self, pos: Position) -> Result<(), TransitionError> {
        self.session.complete_task(pos)?;
        self.run_opponent_if_due().await
    }

    /// Plays one opponent turn: oracle call, reasoning, pacing delay, placement.
    #[instrument(skip(self))]
    pub async fn run_opponent_turn(&mut self) -> Result<(), TransitionError> {
        let ticket = self.session.begin_opponent_turn()?;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let driver = drive_opponent_turn(Arc::clone(&self.move_oracle), ticket, self.pacing, tx);
        tokio::pin!(driver);

        // Apply MoveChosen while the driver is still sleeping.
        loop {
            tokio::select! {
                biased;
                Some(event) = rx.recv() => {
                    self.deliver(event);
                }
                () = &mut driver => break,
            }
        }
        self.drain(&mut rx);
        Ok(())
    }

    async fn run_opponent_if_due(&mut self) -> Result<(), TransitionError> {
        if self.session.opponent_turn_due() {
            self.run_opponent_turn().await?;
        }
        Ok(())
    }

    fn drain(&mut self, rx: &mut mpsc::UnboundedReceiver<OracleEvent>) {
        while let Ok(event) = rx.try_recv() {
            self.deliver(event);
        }
    }

    fn deliver(&mut self, event: OracleEvent) {
        if self.session.apply(event) == Delivery::Stale {
            debug!("Controller dropped a stale event");
        }
    }
}
