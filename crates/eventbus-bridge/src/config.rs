//! Connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::frame::DEFAULT_MAX_FRAME_SIZE;

/// Configuration for a [`BridgeConnection`](crate::BridgeConnection).
///
/// The defaults match what the broker accepts out of the box, so most
/// callers use [`BridgeConnection::connect`](crate::BridgeConnection::connect)
/// and never build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Largest payload, in bytes, accepted in either direction.
    pub max_frame_size: usize,

    /// Give up dialing after this long. `None` leaves it to the OS.
    pub connect_timeout: Option<Duration>,

    /// Set `TCP_NODELAY` on the socket.
    pub nodelay: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            connect_timeout: None,
            nodelay: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.max_frame_size, 16 * 1024 * 1024);
        assert_eq!(config.connect_timeout, None);
        assert!(config.nodelay);
    }

    #[test]
    fn test_config_from_json() {
        let config: BridgeConfig = serde_json::from_str(
            r#"{
                "max_frame_size": 1024,
                "connect_timeout": { "secs": 2, "nanos": 0 },
                "nodelay": false
            }"#,
        )
        .unwrap();
        assert_eq!(config.max_frame_size, 1024);
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(2)));
        assert!(!config.nodelay);
    }
}
