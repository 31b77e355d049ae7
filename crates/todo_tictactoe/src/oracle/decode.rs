//! Decoding move replies, with the first-empty fallback.

use derive_more::{Display, Error};
use derive_new::new;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use todo_board::{Board, Position};
use tracing::{instrument, warn};

/// Reasoning attached to a fallback move.
pub const FALLBACK_REASONING: &str = "Error in logic, picking first available.";

/// Reply the move oracle is asked to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MoveReply {
    /// The index of the square to claim (0-8).
    pub index: f64,
    /// Brief explanation of the strategic move.
    pub reasoning: String,
}

/// A decoded, playable opponent move.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MoveChoice {
    /// Square to claim.
    pub position: Position,
    /// Explanation shown to the player.
    pub reasoning: String,
    /// True when the reply was unusable and the first empty square was chosen.
    #[new(default)]
    pub fallback: bool,
}

impl MoveChoice {
    /// First empty square in row-major order with a generic explanation.
    ///
    /// A full board has no legal move; index 0 is returned so the value is
    /// still well-formed. Sessions never request a move on a full board.
    #[instrument(skip(board))]
    pub fn fallback(board: &Board) -> Self {
        Self {
            position: board.first_empty().unwrap_or(Position::TopLeft),
            reasoning: FALLBACK_REASONING.to_string(),
            fallback: true,
        }
    }

    /// Decodes a reply, substituting [`MoveChoice::fallback`] when it is malformed.
    #[instrument(skip(raw, board))]
    pub fn decode_or_fallback(raw: &str, board: &Board) -> Self {
        match decode_move(raw, board) {
            Ok(choice) => choice,
            Err(e) => {
                warn!(error = %e, raw, "Malformed move reply, falling back to first empty square");
                Self::fallback(board)
            }
        }
    }
}

/// Why a move reply could not be used.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum MoveDecodeError {
    /// No JSON object in the reply.
    #[display("Reply contains no JSON object")]
    NoJson,
    /// JSON was present but did not match the reply shape.
    #[display("Reply JSON is invalid: {}", _0)]
    Parse(#[error(not(source))] String),
    /// Index is not a whole number.
    #[display("Index {} is not an integer", _0)]
    NotAnInteger(#[error(not(source))] f64),
    /// Index is outside 0-8.
    #[display("Index {} is off the board", _0)]
    OutOfRange(#[error(not(source))] i64),
    /// Index names a square that already holds a mark.
    #[display("{} is already occupied", _0)]
    Occupied(#[error(not(source))] Position),
}

/// Decodes a raw move reply against the board it was requested for.
///
/// Accepts the JSON object on its own, inside a Markdown code fence, or
/// surrounded by prose.
#[instrument(skip(raw, board))]
pub fn decode_move(raw: &str, board: &Board) -> Result<MoveChoice, MoveDecodeError> {
    let json = extract_object(raw).ok_or(MoveDecodeError::NoJson)?;
    let reply: MoveReply =
        serde_json::from_str(json).map_err(|e| MoveDecodeError::Parse(e.to_string()))?;

    if !reply.index.is_finite() || reply.index.fract() != 0.0 {
        return Err(MoveDecodeError::NotAnInteger(reply.index));
    }
    let index = reply.index as i64;
    let position = usize::try_from(index)
        .ok()
        .and_then(Position::from_index)
        .ok_or(MoveDecodeError::OutOfRange(index))?;
    if !board.is_empty(position) {
        return Err(MoveDecodeError::Occupied(position));
    }

    Ok(MoveChoice::new(position, reply.reasoning.trim().to_string()))
}

/// Slice from the first `{` to the last `}`.
fn extract_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}
