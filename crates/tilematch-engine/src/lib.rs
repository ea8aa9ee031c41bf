//! Round lifecycle engine for Tilematch.
//!
//! Players cycle the colours of cells on their own grid, racing to
//! reproduce a shared target pattern. This crate is the only thing that
//! writes game state: the host runtime hands it a [`GameState`] by
//! mutable reference for each notification ("action received", "player
//! joined/left", "time advanced") and broadcasts whatever comes back.
//!
//! # Key types
//!
//! - [`RoundEngine`]: the transition functions, holding the injected
//!   [`Clock`] and random source
//! - [`GameState`]: the shared aggregate, read-only outside this crate
//! - [`Phase`]: which of pre-game / in-progress / round-over / match-over
//!   is active
//! - [`Pattern`]: a fixed-length grid of colour indices
//! - [`RoundConfig`]: timing and grid constants
//! - [`InvalidAction`]: why an action was rejected
//!
//! Nothing here blocks or spawns: every call is synchronous, bounded by
//! grid or roster size, and either applies completely or is rejected
//! before touching the state.

mod clock;
mod config;
mod engine;
mod error;
mod pattern;
mod state;

pub use clock::{Clock, ManualClock};
pub use config::{
    ALL_READY_START_MILLIS, COLOUR_COUNT, FORCE_START_MILLIS, GRID_SIZE, ROUND_START_MILLIS,
    RoundConfig, WINNING_SCORE,
};
pub use engine::RoundEngine;
pub use error::InvalidAction;
pub use pattern::Pattern;
pub use state::{GameState, Phase};
