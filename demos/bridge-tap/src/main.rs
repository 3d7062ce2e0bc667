//! Registers for one address on a bridge and logs everything that arrives.
//!
//! ```text
//! bridge-tap [BROKER] [ADDRESS]
//! ```
//!
//! Log level comes from `RUST_LOG`.

use std::sync::Arc;

use clap::Parser;
use eventbus::prelude::*;
use eventbus::BridgeError;
use tracing_subscriber::EnvFilter;

const DEFAULT_BROKER: &str = "localhost:7000";
const DEFAULT_ADDRESS: &str = "foo.bar";

#[derive(Parser, Debug, PartialEq, Eq)]
#[command(name = "bridge-tap")]
#[command(about = "Log every message the event bus delivers to one address")]
#[command(version)]
struct Args {
    /// Broker bridge endpoint (`host:port`)
    #[arg(env = "EVENTBUS_ADDR", default_value = DEFAULT_BROKER)]
    broker: String,

    /// Event-bus address to register for
    #[arg(default_value = DEFAULT_ADDRESS)]
    address: String,
}

#[tokio::main]
async fn main() -> Result<(), EventBusError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let conn = Arc::new(BridgeConnection::connect(&args.broker).await?);
    tracing::info!(broker = %conn.peer_addr(), address = %args.address, "tapping");

    conn.send(&Message::register(args.address.as_str())).await?;

    let reader = {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move { tap(&conn).await })
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, unregistering");
            conn.send(&Message::unregister(args.address.as_str())).await?;
        }
        finished = reader => {
            if let Ok(Err(e)) = finished {
                tracing::error!(error = %e, "bridge connection failed");
            }
        }
    }

    conn.close().await?;
    Ok(())
}

/// Logs inbound messages until the connection ends.
async fn tap(conn: &BridgeConnection) -> Result<(), BridgeError> {
    loop {
        match conn.receive().await {
            Ok(msg) if msg.is_error() => {
                tracing::warn!(reason = msg.error_message().unwrap_or("unknown"), "broker error");
            }
            Ok(msg) => {
                let body = msg.body().map(String::from_utf8_lossy).unwrap_or_default();
                tracing::info!(
                    kind = %msg.kind(),
                    address = msg.address(),
                    reply_to = msg.reply_address().unwrap_or("-"),
                    %body,
                    "message"
                );
            }
            Err(e) if e.is_decode() => {
                tracing::warn!(error = %e, "skipping unreadable frame");
            }
            Err(BridgeError::ConnectionClosed | BridgeError::Closed) => {
                tracing::info!("connection closed");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn default_of(arg: &clap::Arg) -> Option<&str> {
        arg.get_default_values().first().and_then(|v| v.to_str())
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cmd = Args::command();
        let broker = cmd
            .get_positionals()
            .find(|arg| arg.get_id() == "broker")
            .unwrap();
        assert_eq!(default_of(broker), Some(DEFAULT_BROKER));

        let address = cmd
            .get_positionals()
            .find(|arg| arg.get_id() == "address")
            .unwrap();
        assert_eq!(default_of(address), Some(DEFAULT_ADDRESS));
    }

    #[test]
    fn test_broker_falls_back_to_env() {
        let cmd = Args::command();
        let broker = cmd
            .get_positionals()
            .find(|arg| arg.get_id() == "broker")
            .unwrap();
        assert_eq!(broker.get_env().and_then(|v| v.to_str()), Some("EVENTBUS_ADDR"));
    }

    #[test]
    fn test_positional_args_win() {
        let parsed = Args::try_parse_from(["bridge-tap", "10.0.0.1:7000", "orders"]).unwrap();
        assert_eq!(
            parsed,
            Args {
                broker: "10.0.0.1:7000".into(),
                address: "orders".into(),
            }
        );
    }

    #[test]
    fn test_address_defaults_when_only_broker_given() {
        let parsed = Args::try_parse_from(["bridge-tap", "bus:9000"]).unwrap();
        assert_eq!(parsed.broker, "bus:9000");
        assert_eq!(parsed.address, DEFAULT_ADDRESS);
    }

    #[test]
    fn test_extra_arguments_are_rejected() {
        let result = Args::try_parse_from(["bridge-tap", "bus:9000", "orders", "extra"]);
        assert!(result.is_err());
    }
}
