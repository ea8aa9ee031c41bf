//! Room configuration and state machine.

use serde::{Deserialize, Serialize};
use tilematch_tick::TickConfig;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for a room instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Players needed before the match is set up. Whoever is in the room
    /// at that moment becomes the starting roster.
    pub min_players: usize,

    /// Maximum players allowed in the room.
    pub max_players: usize,

    /// Engine updates per second.
    pub tick_rate_hz: u32,

    /// Whether spectators may watch.
    pub allow_spectators: bool,

    /// Maximum number of spectators (0 = unlimited when allowed).
    pub max_spectators: usize,

    /// Capacity of the command channel. Senders wait when it is full.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 1,
            max_players: 4,
            tick_rate_hz: 10,
            allow_spectators: true,
            max_spectators: 0,
            channel_size: 64,
        }
    }
}

impl RoomConfig {
    /// Scheduler settings for this room's tick loop.
    pub fn tick_config(&self) -> TickConfig {
        TickConfig::with_rate(self.tick_rate_hz)
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// WaitingForPlayers → InProgress → Finished
/// ```
///
/// - **WaitingForPlayers**: fewer than `min_players` have joined; no
///   match state exists yet.
/// - **InProgress**: the match is set up and the tick loop is running.
///   Players may still join and leave.
/// - **Finished**: someone reached the win threshold. The final state
///   stays readable and frozen; no joins, no ticks. A player may still
///   leave, which only drops their subscription.
///
/// Shutdown can happen from any state and ends the actor, so it is not a
/// state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    WaitingForPlayers,
    InProgress,
    Finished,
}

impl RoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::WaitingForPlayers | Self::InProgress)
    }

    /// The only state this one may move to, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::WaitingForPlayers => Some(Self::InProgress),
            Self::InProgress => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_state_next_follows_strict_order() {
        assert_eq!(RoomState::WaitingForPlayers.next(), Some(RoomState::InProgress));
        assert_eq!(RoomState::InProgress.next(), Some(RoomState::Finished));
        assert_eq!(RoomState::Finished.next(), None);
    }

    #[test]
    fn test_room_state_can_transition_to() {
        assert!(RoomState::WaitingForPlayers.can_transition_to(RoomState::InProgress));
        assert!(!RoomState::WaitingForPlayers.can_transition_to(RoomState::Finished));
        assert!(!RoomState::Finished.can_transition_to(RoomState::InProgress));
    }

    #[test]
    fn test_late_joins_allowed_until_finished() {
        assert!(RoomState::WaitingForPlayers.is_joinable());
        assert!(RoomState::InProgress.is_joinable());
        assert!(!RoomState::Finished.is_joinable());
    }

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.min_players, 1);
        assert_eq!(config.max_players, 4);
        assert_eq!(config.tick_rate_hz, 10);
        assert!(config.allow_spectators);
        assert_eq!(config.tick_config().tick_rate_hz, 10);
    }
}
