//! # Tilematch
//!
//! Server-authoritative engine for a multiplayer race: every player
//! cycles the colours of cells on their own grid until it matches a shared
//! target pattern. First to complete the pattern wins the round, first to
//! five rounds wins the match.
//!
//! The pieces:
//!
//! - [`RoundEngine`] owns the rules. It is synchronous and takes the
//!   [`GameState`] by mutable reference on every call.
//! - [`spawn_room`] runs one match in its own Tokio task, feeding the
//!   engine player actions, roster changes and a fixed-rate tick.
//! - [`RoundEvent`] and [`RoomOutbound`] are what subscribers receive.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tilematch::prelude::*;
//!
//! # async fn run() -> Result<(), TilematchError> {
//! tilematch::init_tracing();
//!
//! let engine = RoundEngine::new(RoundConfig::default(), TokioClock::new());
//! let room = spawn_room(RoomId(1), RoomConfig::default(), engine);
//!
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! room.join(PlayerId(1), tx).await?;
//! room.act(Some(PlayerId(1)), Action::MarkReady).await?;
//! while let Some(msg) = rx.recv().await {
//!     // render snapshots, react to events
//! #   let _ = msg;
//! }
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::TilematchError;

pub use tilematch_engine::{
    Clock, GameState, InvalidAction, ManualClock, Pattern, Phase, RoundConfig, RoundEngine,
};
pub use tilematch_protocol::{
    Action, Codec, Colour, JsonCodec, PlayerId, ProtocolError, Recipient, RoomId, RoundEvent,
};
pub use tilematch_room::{
    RoomConfig, RoomError, RoomHandle, RoomInfo, RoomOutbound, RoomState, Subscriber, TokioClock,
    spawn_room,
};
pub use tilematch_tick::{TickConfig, TickPolicy};

/// Everything a host needs, in one import.
pub mod prelude {
    pub use crate::{
        Action, Clock, Codec, GameState, InvalidAction, JsonCodec, Pattern, Phase, PlayerId,
        RoomConfig, RoomError, RoomHandle, RoomId, RoomOutbound, RoomState, RoundConfig,
        RoundEngine, RoundEvent, TilematchError, TokioClock, spawn_room,
    };
}

/// Installs a `tracing` subscriber that writes to stderr, filtered by
/// `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("tracing initialised");
    }
}
