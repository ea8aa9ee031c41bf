//! Error types for the engine.

use serde::{Deserialize, Serialize};
use tilematch_protocol::PlayerId;

/// Why an action was refused.
///
/// A rejected action never changes the state: every check runs before
/// the first write. The error goes back to the offending caller only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum InvalidAction {
    /// The sender has no player identity (a spectator).
    #[error("spectators cannot act")]
    Spectator,

    /// The win threshold has been reached; nothing more can happen.
    #[error("the match is over")]
    MatchOver,

    /// The pre-game countdown has not finished yet.
    #[error("the game has not started")]
    NotStarted,

    /// The round has been won and the next one has not started.
    #[error("the round is over")]
    RoundOver,

    /// The sender is not on the roster (left, or never joined).
    #[error("player {0} has no grid")]
    UnknownPlayer(PlayerId),

    /// The cell index is past the end of the grid.
    #[error("cell {index} is out of range (grid has {size} cells)")]
    CellOutOfRange { index: usize, size: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_problem() {
        assert_eq!(InvalidAction::Spectator.to_string(), "spectators cannot act");
        assert_eq!(
            InvalidAction::UnknownPlayer(PlayerId(4)).to_string(),
            "player P-4 has no grid"
        );
        assert_eq!(
            InvalidAction::CellOutOfRange { index: 9, size: 9 }.to_string(),
            "cell 9 is out of range (grid has 9 cells)"
        );
    }
}
