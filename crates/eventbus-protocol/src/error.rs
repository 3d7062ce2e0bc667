//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. A
//! `ProtocolError` always means the problem is in turning a [`Message`]
//! into JSON or back, never in networking.
//!
//! [`Message`]: crate::Message

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into bytes).
    ///
    /// The usual cause is a `headers` or `body` byte sequence that is not
    /// valid JSON text, since both are embedded verbatim in the frame.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a message).
    ///
    /// Common causes: malformed JSON, a missing `type` field, or a `type`
    /// value that is not one of the known message kinds.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display_mentions_cause() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ProtocolError::Decode(cause);
        assert!(err.to_string().starts_with("decode failed: "));
    }
}
