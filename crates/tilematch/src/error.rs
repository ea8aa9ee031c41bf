//! Unified error type for the Tilematch crates.

use tilematch_engine::InvalidAction;
use tilematch_protocol::ProtocolError;
use tilematch_room::RoomError;

/// Top-level error wrapping the errors of each sub-crate, so `?` works
/// across all of them.
#[derive(Debug, thiserror::Error)]
pub enum TilematchError {
    /// A payload could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The room refused a request or is gone.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The engine refused an action when called directly.
    #[error(transparent)]
    Rejected(#[from] InvalidAction),
}
