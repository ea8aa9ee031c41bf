//! Host runtime for Tilematch matches.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! [`GameState`](tilematch_engine::GameState) and the
//! [`RoundEngine`](tilematch_engine::RoundEngine) that mutates it. Commands
//! arrive one at a time over a channel and the tick fires from the same
//! loop, so engine handlers never overlap.
//!
//! # Key types
//!
//! - [`spawn_room`]: start a room actor
//! - [`RoomHandle`]: join, leave, act, and read snapshots
//! - [`RoomState`]: room lifecycle state machine
//! - [`RoomConfig`]: player limits, tick rate, spectators
//! - [`TokioClock`]: the engine clock, backed by Tokio's time source

mod clock;
mod config;
mod error;
mod room;

pub use clock::TokioClock;
pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use room::{RoomHandle, RoomInfo, RoomOutbound, Subscriber, spawn_room};
