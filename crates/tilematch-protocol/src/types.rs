//! Core protocol types: identities, player actions and round events.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A colour index. Valid values are `0..colour_count` for the match's
/// configured colour count.
pub type Colour = u8;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Newtype over `u64` so a `RoomId` can never be passed where a player is
/// expected. `Ord` is derived because per-player maps in the engine are
/// `BTreeMap`s, which keeps snapshots and rankings in a stable order.
///
/// `#[serde(transparent)]` makes `PlayerId(42)` serialize as plain `42`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room (one match).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player and spectator watching the room.
    All,
    /// One specific player.
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// An action a player submits to the engine.
///
/// The acting player is never part of the payload: the host attaches the
/// identity of whoever sent it. Internally tagged, so the JSON looks like
/// `{ "type": "InteractWithCell", "cell": 4 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    /// "I'm ready" during the pre-game countdown.
    MarkReady,
    /// Cycle the colour of one cell of the sender's own grid.
    InteractWithCell { cell: usize },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkReady => write!(f, "MarkReady"),
            Self::InteractWithCell { cell } => write!(f, "InteractWithCell({cell})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Something the engine did, reported to the host for broadcast.
///
/// Every handler returns the events it produced, in order. Events are
/// informational: the authoritative data is always the state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoundEvent {
    /// A player was added to the roster.
    PlayerJoined { player: PlayerId },

    /// A player was removed from the roster.
    PlayerLeft { player: PlayerId },

    /// A player flagged themselves ready.
    PlayerReady { player: PlayerId },

    /// The countdown display value changed.
    Countdown { seconds: u64 },

    /// A new round began: fresh target, every grid cleared.
    RoundStarted { round: u32 },

    /// A cell on a player's grid changed colour.
    CellChanged {
        player: PlayerId,
        cell: usize,
        colour: Colour,
    },

    /// A player reproduced the target pattern.
    RoundWon {
        winner: PlayerId,
        round: u32,
        /// Seconds from the scheduled round start, truncated to 2 dp.
        duration_secs: f64,
        /// The winner's score after this win.
        score: u32,
        /// Cell changes the winner made this round.
        moves: u32,
    },

    /// The win threshold was reached. Carries the final scores; sent
    /// exactly once per match.
    MatchOver { ranking: BTreeMap<PlayerId, u32> },
}
