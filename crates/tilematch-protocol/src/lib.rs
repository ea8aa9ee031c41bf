//! Wire-level types for Tilematch.
//!
//! This crate defines what travels between the host runtime, the round
//! engine and whoever is watching a match:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`]).
//! - **Actions** ([`Action`]): the typed payloads players submit.
//! - **Events** ([`RoundEvent`]): what the engine reports back, addressed
//!   with a [`Recipient`].
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, bytes out.
//!
//! The protocol layer knows nothing about rounds or timing; it only
//! describes the shapes that cross the engine boundary.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Action, Colour, PlayerId, Recipient, RoomId, RoundEvent};
