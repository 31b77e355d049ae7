//! Runs oracle calls for issued tickets and reports back as events.

use super::{MoveChoice, MoveOracle, TaskOracle};
use crate::session::{MoveTicket, OracleEvent, TaskTicket};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// Generates the task for a ticket and sends [`OracleEvent::TaskGenerated`].
#[instrument(skip(oracle, tx), fields(epoch = ticket.epoch(), position = %ticket.position()))]
pub async fn drive_task_request(
    oracle: Arc<dyn TaskOracle>,
    ticket: TaskTicket,
    tx: UnboundedSender<OracleEvent>,
) {
    let result = oracle
        .generate_task(ticket.theme(), ticket.position(), ticket.difficulty())
        .await;
    if let Err(e) = &result {
        warn!(error = %e, "Task oracle failed");
    }
    send(&tx, OracleEvent::TaskGenerated { ticket, result });
}

/// Asks for the opponent move, then reports it in two steps.
///
/// [`OracleEvent::MoveChosen`] goes out as soon as the reply is decoded so
/// the reasoning can be shown; [`OracleEvent::MoveReady`] follows after
/// `pacing`. A failed call sends [`OracleEvent::MoveFailed`] instead.
#[instrument(skip(oracle, ticket, tx), fields(epoch = ticket.epoch(), pacing_ms = pacing.as_millis() as u64))]
pub async fn drive_opponent_turn(
    oracle: Arc<dyn MoveOracle>,
    ticket: MoveTicket,
    pacing: Duration,
    tx: UnboundedSender<OracleEvent>,
) {
    let raw = match oracle.select_move(ticket.board(), ticket.theme()).await {
        Ok(raw) => raw,
        Err(error) => {
            warn!(error = %error, "Move oracle failed");
            send(&tx, OracleEvent::MoveFailed { ticket, error });
            return;
        }
    };

    let choice = MoveChoice::decode_or_fallback(&raw, ticket.board());
    info!(position = %choice.position, fallback = choice.fallback, "Opponent move chosen");
    if !send(
        &tx,
        OracleEvent::MoveChosen {
            ticket: ticket.clone(),
            choice: choice.clone(),
        },
    ) {
        return;
    }

    tokio::time::sleep(pacing).await;
    send(&tx, OracleEvent::MoveReady { ticket, choice });
}

/// Returns false when the session side has gone away.
fn send(tx: &UnboundedSender<OracleEvent>, event: OracleEvent) -> bool {
    match tx.send(event) {
        Ok(()) => true,
        Err(_) => {
            debug!("Event receiver dropped");
            false
        }
    }
}
