//! Match constants and the config struct that carries them.

use serde::{Deserialize, Serialize};
use tilematch_protocol::Colour;
use tracing::warn;

/// Pre-game grace period: the first round starts this long after setup
/// unless every player readies up sooner.
pub const FORCE_START_MILLIS: u64 = 30_000;

/// Countdown once every player is ready.
pub const ALL_READY_START_MILLIS: u64 = 3_000;

/// Pause between a round being won and the next one starting.
pub const ROUND_START_MILLIS: u64 = 5_000;

/// Cells per grid (a 3×3 board).
pub const GRID_SIZE: usize = 9;

/// Distinct colours a cell cycles through.
pub const COLOUR_COUNT: Colour = 3;

/// Round wins needed to take the match.
pub const WINNING_SCORE: u32 = 5;

/// Timing and grid settings for one match.
///
/// `Default` gives the standard game. Hosts normally never change these;
/// tests shrink the grid or the threshold to keep scenarios short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// See [`FORCE_START_MILLIS`].
    pub force_start_millis: u64,
    /// See [`ALL_READY_START_MILLIS`].
    pub all_ready_start_millis: u64,
    /// See [`ROUND_START_MILLIS`].
    pub round_start_millis: u64,
    /// See [`GRID_SIZE`].
    pub grid_size: usize,
    /// See [`COLOUR_COUNT`].
    pub colour_count: Colour,
    /// See [`WINNING_SCORE`].
    pub winning_score: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            force_start_millis: FORCE_START_MILLIS,
            all_ready_start_millis: ALL_READY_START_MILLIS,
            round_start_millis: ROUND_START_MILLIS,
            grid_size: GRID_SIZE,
            colour_count: COLOUR_COUNT,
            winning_score: WINNING_SCORE,
        }
    }
}

impl RoundConfig {
    /// Clamp values that would make the game unplayable.
    ///
    /// - `grid_size` at least 1.
    /// - `colour_count` at least 2, otherwise every grid already matches.
    /// - `winning_score` at least 1.
    pub fn validated(mut self) -> Self {
        if self.grid_size == 0 {
            warn!("grid_size of 0, clamping to 1");
            self.grid_size = 1;
        }
        if self.colour_count < 2 {
            warn!(colours = self.colour_count, "colour_count below 2, clamping");
            self.colour_count = 2;
        }
        if self.winning_score == 0 {
            warn!("winning_score of 0, clamping to 1");
            self.winning_score = 1;
        }
        self
    }
}

/// Whole seconds shown for a countdown of `millis`, rounded up.
pub(crate) fn countdown_seconds(millis: u64) -> u64 {
    millis.div_ceil(1000)
}
