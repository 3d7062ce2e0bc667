//! TCP bridge connection for the event bus.
//!
//! Provides [`BridgeConnection`], which owns one socket to the broker and
//! exchanges [`Message`](eventbus_protocol::Message)s over it, and the
//! [`frame`] module, which implements the length-prefixed framing.
//!
//! # Lifecycle
//!
//! ```text
//! connect() ──► Connected ──► close() ──► Closed
//!                 │    ▲
//!                 └────┘ send() / receive()
//! ```
//!
//! A failed `send` or `receive` (other than a decode error) leaves the
//! connection unusable. Reconnecting is up to the caller.

mod config;
mod connection;
mod error;
pub mod frame;

pub use config::BridgeConfig;
pub use connection::BridgeConnection;
pub use error::BridgeError;

use std::fmt;

/// Opaque identifier for a connection, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bridge-{}", self.0)
    }
}
