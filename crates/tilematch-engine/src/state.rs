//! The shared game state and the phase derived from it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tilematch_protocol::PlayerId;

use crate::Pattern;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Which part of the match is active. Exactly one at any time.
///
/// ```text
/// PreGame → InProgress ⇄ RoundOver → MatchOver
/// ```
///
/// - **PreGame**: counting down to the first round; players ready up.
/// - **InProgress**: a round is running and grids accept clicks.
/// - **RoundOver**: someone matched the target; the result shows until
///   the next round's countdown runs out.
/// - **MatchOver**: someone reached the win threshold. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    PreGame,
    InProgress,
    RoundOver,
    MatchOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreGame => write!(f, "PreGame"),
            Self::InProgress => write!(f, "InProgress"),
            Self::RoundOver => write!(f, "RoundOver"),
            Self::MatchOver => write!(f, "MatchOver"),
        }
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// Everything about a match in progress.
///
/// Only [`RoundEngine`](crate::RoundEngine) writes to it. Everyone else
/// gets the accessors below, which are already computed for display:
/// the presentation layer never has to derive anything.
///
/// The roster is the key set of the player grids; `scores` always has the
/// same keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub(crate) round_start_millis: u64,
    pub(crate) game_started: bool,
    pub(crate) target_pattern: Pattern,
    pub(crate) scores: BTreeMap<PlayerId, u32>,
    pub(crate) player_patterns: BTreeMap<PlayerId, Pattern>,
    pub(crate) player_ready: BTreeMap<PlayerId, bool>,
    pub(crate) round_over: bool,
    pub(crate) round_end_time: Option<u64>,
    pub(crate) round_winner: Option<PlayerId>,
    pub(crate) round_duration: f64,
    pub(crate) next_round_start_seconds: u64,
    pub(crate) match_over: bool,
    pub(crate) round: u32,
    // Move counts for the current round. Display only, never scored.
    pub(crate) player_moves: BTreeMap<PlayerId, u32>,
    pub(crate) total_moves: u32,
}

impl GameState {
    /// The phase the match is in.
    pub fn phase(&self) -> Phase {
        if self.match_over {
            Phase::MatchOver
        } else if !self.game_started {
            Phase::PreGame
        } else if self.round_over {
            Phase::RoundOver
        } else {
            Phase::InProgress
        }
    }

    /// Clock time at which the current countdown resolves.
    pub fn round_start_millis(&self) -> u64 {
        self.round_start_millis
    }

    pub fn game_started(&self) -> bool {
        self.game_started
    }

    /// The pattern everyone is racing to reproduce this round.
    pub fn target_pattern(&self) -> &Pattern {
        &self.target_pattern
    }

    /// Round wins per roster member.
    pub fn scores(&self) -> &BTreeMap<PlayerId, u32> {
        &self.scores
    }

    pub fn score(&self, player: PlayerId) -> Option<u32> {
        self.scores.get(&player).copied()
    }

    /// Every roster member's grid.
    pub fn player_patterns(&self) -> &BTreeMap<PlayerId, Pattern> {
        &self.player_patterns
    }

    pub fn player_pattern(&self, player: PlayerId) -> Option<&Pattern> {
        self.player_patterns.get(&player)
    }

    /// Pre-game readiness flags.
    pub fn player_ready(&self) -> &BTreeMap<PlayerId, bool> {
        &self.player_ready
    }

    pub fn is_ready(&self, player: PlayerId) -> bool {
        self.player_ready.get(&player).copied().unwrap_or(false)
    }

    /// `true` when every roster member has readied up.
    pub fn all_ready(&self) -> bool {
        self.roster().all(|player| self.is_ready(player))
    }

    /// Current roster, in id order.
    pub fn roster(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.player_patterns.keys().copied()
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.player_patterns.contains_key(&player)
    }

    /// `true` while the "round over" result should be shown.
    pub fn round_over(&self) -> bool {
        self.round_over
    }

    /// When the last round was won. Meaningful while [`round_over`](Self::round_over).
    pub fn round_end_time(&self) -> Option<u64> {
        self.round_end_time
    }

    /// Who won the last round. Meaningful while [`round_over`](Self::round_over).
    pub fn round_winner(&self) -> Option<PlayerId> {
        self.round_winner
    }

    /// How long the last round took, in seconds truncated to 2 dp.
    pub fn round_duration(&self) -> f64 {
        self.round_duration
    }

    /// Seconds left on the current countdown, 0 when none is running.
    pub fn next_round_start_seconds(&self) -> u64 {
        self.next_round_start_seconds
    }

    pub fn match_over(&self) -> bool {
        self.match_over
    }

    /// 1-based number of the current (or last finished) round; 0 before
    /// the first one starts.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Cells a player has changed this round.
    pub fn moves(&self, player: PlayerId) -> u32 {
        self.player_moves.get(&player).copied().unwrap_or(0)
    }

    /// Cells changed by everyone this round.
    pub fn total_moves(&self) -> u32 {
        self.total_moves
    }
}
