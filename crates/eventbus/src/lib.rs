//! # eventbus
//!
//! Client for the event-bus TCP bridge: lets a process outside the broker
//! send, publish, and register for messages over a plain TCP socket.
//!
//! The client is deliberately thin. It gives you [`BridgeConnection`]
//! (`connect`, `send`, `receive`, `close`) and the [`Message`] constructors.
//! Routing inbound messages to handlers by address, and matching replies
//! to requests, is left to the application.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eventbus::prelude::*;
//!
//! # async fn run() -> Result<(), EventBusError> {
//! let conn = BridgeConnection::connect("localhost:7000").await?;
//! conn.send(&Message::register("foo.bar")).await?;
//! conn.send(&Message::publish("foo.bar", br#"{}"#.to_vec(), br#""hello""#.to_vec()))
//!     .await?;
//!
//! let msg = conn.receive().await?;
//! println!("{} on {}", msg.kind(), msg.address());
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::EventBusError;
pub use eventbus_bridge::{BridgeConfig, BridgeConnection, BridgeError, ConnectionId, frame};
pub use eventbus_protocol::{Codec, JsonCodec, Message, MessageKind, ProtocolError};

/// Everything most callers need, in one import.
pub mod prelude {
    pub use crate::EventBusError;
    pub use eventbus_bridge::{BridgeConfig, BridgeConnection};
    pub use eventbus_protocol::{Codec, JsonCodec, Message, MessageKind};
}
