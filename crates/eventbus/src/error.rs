//! Unified error type for the event-bus client.

use eventbus_bridge::BridgeError;
use eventbus_protocol::ProtocolError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `eventbus` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attributes let `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    /// A connection-level error (dial, send, receive, close).
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bridge_error() {
        let err: EventBusError = BridgeError::ConnectionClosed.into();
        assert!(matches!(err, EventBusError::Bridge(_)));
        assert_eq!(err.to_string(), "connection closed by peer");
    }

    #[test]
    fn test_from_protocol_error() {
        let cause = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let err: EventBusError = ProtocolError::Decode(cause).into();
        assert!(matches!(err, EventBusError::Protocol(_)));
        assert!(err.to_string().starts_with("decode failed"));
    }
}
