//! Error types for the room layer.

use tilematch_engine::InvalidAction;
use tilematch_protocol::{PlayerId, ProtocolError, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No more player (or spectator) slots.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// The room's lifecycle state doesn't allow this, e.g. joining a
    /// finished match.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// The engine refused the action. State is unchanged.
    #[error("action rejected: {0}")]
    Rejected(#[from] InvalidAction),

    /// The action payload could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
