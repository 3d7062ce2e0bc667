use eventbus_protocol::ProtocolError;

/// Errors that can occur on a bridge connection.
///
/// Transport failures (`Connect`, `Write`, `Read`, `ConnectionClosed`,
/// `Truncated`, `Closed`) mean the connection is dead and must be
/// re-dialed. A `Protocol` error on receive means one frame was unreadable;
/// the stream itself is still in sync.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Dialing the broker failed (DNS, refused, unreachable, timed out).
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    Write(#[source] std::io::Error),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    Read(#[source] std::io::Error),

    /// The broker closed the stream cleanly between frames.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The stream ended in the middle of a frame.
    #[error("truncated frame: expected {expected} bytes, got {received}")]
    Truncated { expected: usize, received: usize },

    /// A frame exceeds the configured maximum size.
    #[error("frame of {size} bytes exceeds limit of {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// The frame payload could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The connection was closed locally.
    #[error("connection is closed")]
    Closed,
}

impl BridgeError {
    /// Returns `true` if a frame arrived intact but its JSON was unusable.
    ///
    /// Callers may keep reading after a decode error; every other receive
    /// error leaves the connection unusable.
    pub fn is_decode(&self) -> bool {
        matches!(self, BridgeError::Protocol(ProtocolError::Decode(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_display() {
        let err = BridgeError::Truncated { expected: 10, received: 3 };
        assert_eq!(err.to_string(), "truncated frame: expected 10 bytes, got 3");
    }

    #[test]
    fn test_is_decode_only_for_decode_errors() {
        let cause = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        assert!(BridgeError::Protocol(ProtocolError::Decode(cause)).is_decode());
        assert!(!BridgeError::ConnectionClosed.is_decode());
        assert!(!BridgeError::Closed.is_decode());
    }
}
