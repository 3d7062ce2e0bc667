//! Wire protocol for the event-bus TCP bridge.
//!
//! This crate defines what travels inside a frame:
//!
//! - **Message model** ([`Message`], [`MessageKind`]) — the five message
//!   kinds and which fields each one carries.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how a message becomes
//!   bytes and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding or
//!   decoding.
//!
//! # Architecture
//!
//! The protocol layer does no I/O. It does not know about sockets or the
//! length prefix; `eventbus-bridge` handles both.
//!
//! ```text
//! Bridge (framed bytes over TCP) → Protocol (Message) → caller
//! ```

mod codec;
mod error;
mod message;
mod wire;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use message::{Message, MessageKind};
