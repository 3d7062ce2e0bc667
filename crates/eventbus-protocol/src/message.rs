//! The bridge message model.
//!
//! Every frame exchanged with the broker carries exactly one [`Message`].
//! A message has a [`MessageKind`] that decides which of the other fields
//! mean anything:
//!
//! | kind         | address | reply address | headers / body |
//! |--------------|---------|---------------|----------------|
//! | `send`       | yes     | optional      | optional       |
//! | `publish`    | yes     | never         | optional       |
//! | `register`   | yes     | never         | never          |
//! | `unregister` | yes     | never         | never          |
//! | `err`        | maybe   | never         | never          |
//!
//! The kind is fixed by the constructor used to build the message. There is
//! no way to build "a message of any kind" and fill in fields afterwards,
//! so cross-kind combinations (a `register` with a body, a `publish` with a
//! reply address) cannot be expressed.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// The kind of a bridge message, carried in the `type` key on the wire.
///
/// The wire strings are lowercase, except that [`MessageKind::Error`] is
/// spelled `"err"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Point-to-point delivery to one handler registered at the address.
    Send,

    /// Fan-out delivery to every handler registered at the address.
    Publish,

    /// Ask the broker to forward messages for the address to this client.
    Register,

    /// Stop forwarding messages for the address.
    Unregister,

    /// The broker rejected something. Only ever received, never built
    /// locally.
    #[serde(rename = "err")]
    Error,
}

impl MessageKind {
    /// Returns the string used for this kind in the `type` key.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Send => "send",
            MessageKind::Publish => "publish",
            MessageKind::Register => "register",
            MessageKind::Unregister => "unregister",
            MessageKind::Error => "err",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single event-bus bridge message.
///
/// `headers` and `body` are opaque, pre-encoded JSON. The message never
/// looks inside them: building the JSON is the caller's job on the way
/// out, and parsing it is the caller's job on the way in.
///
/// An empty `headers` or `body` is stored as absent. An empty reply
/// address means "no reply expected" and is left out of the frame.
///
/// ```rust
/// use eventbus_protocol::{Message, MessageKind};
///
/// let msg = Message::send("orders.new", "", br#"{"k":"v"}"#.to_vec(), b"42".to_vec());
/// assert_eq!(msg.kind(), MessageKind::Send);
/// assert_eq!(msg.reply_address(), None);
/// assert_eq!(msg.body(), Some(&b"42"[..]));
/// assert!(!msg.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub(crate) kind: MessageKind,
    pub(crate) reply_address: String,
    pub(crate) address: String,
    pub(crate) headers: Option<Vec<u8>>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) error_message: String,
}

impl Message {
    /// Builds a point-to-point `send` message.
    ///
    /// Pass an empty `reply_address` when no reply is expected.
    pub fn send(
        address: impl Into<String>,
        reply_address: impl Into<String>,
        headers: Vec<u8>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            kind: MessageKind::Send,
            reply_address: reply_address.into(),
            address: address.into(),
            headers: non_empty(headers),
            body: non_empty(body),
            error_message: String::new(),
        }
    }

    /// Builds a fan-out `publish` message.
    pub fn publish(
        address: impl Into<String>,
        headers: Vec<u8>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            kind: MessageKind::Publish,
            reply_address: String::new(),
            address: address.into(),
            headers: non_empty(headers),
            body: non_empty(body),
            error_message: String::new(),
        }
    }

    /// Builds a `register` message for `address`.
    pub fn register(address: impl Into<String>) -> Self {
        Self::subscription(MessageKind::Register, address.into())
    }

    /// Builds an `unregister` message for `address`.
    pub fn unregister(address: impl Into<String>) -> Self {
        Self::subscription(MessageKind::Unregister, address.into())
    }

    fn subscription(kind: MessageKind, address: String) -> Self {
        Self {
            kind,
            reply_address: String::new(),
            address,
            headers: None,
            body: None,
            error_message: String::new(),
        }
    }

    /// The kind of this message.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns `true` if the broker sent this as an `err` message.
    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }

    /// The logical destination. Empty for error messages that carried none.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Where the receiver should reply, if a reply is expected.
    pub fn reply_address(&self) -> Option<&str> {
        (!self.reply_address.is_empty()).then_some(self.reply_address.as_str())
    }

    /// The raw JSON headers, if any.
    pub fn headers(&self) -> Option<&[u8]> {
        self.headers.as_deref()
    }

    /// The raw JSON body, if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// The broker's description of the failure, for error messages that
    /// carry one (e.g. `"access_denied"`).
    pub fn error_message(&self) -> Option<&str> {
        (!self.error_message.is_empty()).then_some(self.error_message.as_str())
    }
}

fn non_empty(bytes: Vec<u8>) -> Option<Vec<u8>> {
    (!bytes.is_empty()).then_some(bytes)
}
