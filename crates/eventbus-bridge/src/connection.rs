//! TCP connection to the broker's bridge endpoint.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use eventbus_protocol::{Codec, JsonCodec, Message};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, watch};

use crate::frame::{self, FrameReader};
use crate::{BridgeConfig, BridgeError, ConnectionId};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// One live connection to the broker.
///
/// The socket is split into a read half and a write half, each behind its
/// own lock. One task can sit in [`receive`](Self::receive) while others
/// call [`send`](Self::send): reads and writes never wait on each other.
/// Concurrent senders queue on the write lock, so frames never interleave.
///
/// [`close`](Self::close) wakes any task blocked in `send` or `receive`;
/// they return [`BridgeError::Closed`]. There is no reconnect: once a call
/// fails with a transport error, close the connection and dial a new one.
///
/// ```rust,no_run
/// use eventbus_bridge::BridgeConnection;
/// use eventbus_protocol::Message;
///
/// # async fn run() -> Result<(), eventbus_bridge::BridgeError> {
/// let conn = BridgeConnection::connect("localhost:7000").await?;
/// conn.send(&Message::register("foo.bar")).await?;
///
/// let msg = conn.receive().await?;
/// if msg.is_error() {
///     eprintln!("broker said: {:?}", msg.error_message());
/// }
/// conn.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct BridgeConnection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    config: BridgeConfig,
    codec: JsonCodec,
    reader: Mutex<Option<FrameReader<OwnedReadHalf>>>,
    writer: Mutex<Option<OwnedWriteHalf>>,
    closed: watch::Sender<bool>,
}

impl BridgeConnection {
    /// Dials `addr` (`host:port`) with the default [`BridgeConfig`].
    pub async fn connect(addr: &str) -> Result<Self, BridgeError> {
        Self::connect_with(addr, BridgeConfig::default()).await
    }

    /// Dials `addr` (`host:port`) with an explicit configuration.
    ///
    /// # Errors
    /// `BridgeError::Connect` if resolution or the TCP handshake fails, or
    /// if `connect_timeout` elapses first.
    pub async fn connect_with(addr: &str, config: BridgeConfig) -> Result<Self, BridgeError> {
        let connect_err = |source| BridgeError::Connect {
            addr: addr.to_string(),
            source,
        };

        let dialed = match config.connect_timeout {
            Some(limit) => match tokio::time::timeout(limit, TcpStream::connect(addr)).await {
                Ok(result) => result,
                Err(_) => Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("no connection within {limit:?}"),
                )),
            },
            None => TcpStream::connect(addr).await,
        };
        let stream = dialed.map_err(connect_err)?;

        stream.set_nodelay(config.nodelay).map_err(connect_err)?;
        let peer_addr = stream.peer_addr().map_err(connect_err)?;
        let local_addr = stream.local_addr().map_err(connect_err)?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer_addr, "connected to bridge");

        let (read_half, write_half) = stream.into_split();
        let reader = FrameReader::new(read_half, config.max_frame_size);
        let (closed, _) = watch::channel(false);

        Ok(Self {
            id,
            peer_addr,
            local_addr,
            config,
            codec: JsonCodec,
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(write_half)),
            closed,
        })
    }

    /// Encodes `message` and writes it as one frame.
    ///
    /// # Errors
    /// - `Protocol` if the message cannot be encoded (invalid JSON in
    ///   headers or body). Nothing is written.
    /// - `FrameTooLarge` if the payload exceeds `max_frame_size`. Nothing
    ///   is written.
    /// - `Write` if the socket fails. Partial writes are not retried; treat
    ///   the connection as dead.
    /// - `Closed` if the connection was closed before or during the call.
    pub async fn send(&self, message: &Message) -> Result<(), BridgeError> {
        if self.is_closed() {
            return Err(BridgeError::Closed);
        }
        let payload = self.codec.encode(message)?;

        tokio::select! {
            biased;
            _ = self.closed_signal() => Err(BridgeError::Closed),
            written = async {
                let mut guard = self.writer.lock().await;
                let writer = guard.as_mut().ok_or(BridgeError::Closed)?;
                frame::write_frame(writer, &payload, self.config.max_frame_size).await
            } => {
                written?;
                tracing::trace!(id = %self.id, kind = %message.kind(), address = message.address(), "sent message");
                Ok(())
            }
        }
    }

    /// Waits for the next frame and decodes it.
    ///
    /// Returns only complete messages. A broker `err` message is a
    /// successful receive; check [`Message::is_error`].
    ///
    /// # Cancel safety
    /// Cancel safe. Bytes of a partly received frame stay buffered in the
    /// connection, so a `receive` dropped by `select!` or a timeout loses
    /// nothing and the next call returns that frame.
    ///
    /// # Errors
    /// - `ConnectionClosed` if the broker closed the stream between frames.
    /// - `Truncated` if the stream ended mid-frame.
    /// - `Read` for other socket failures.
    /// - `FrameTooLarge` if the announced length exceeds `max_frame_size`.
    /// - `Protocol` if the payload is not a valid message. The frame has
    ///   been consumed, so the caller may keep reading.
    /// - `Closed` if the connection was closed before or during the call.
    pub async fn receive(&self) -> Result<Message, BridgeError> {
        let payload = tokio::select! {
            biased;
            _ = self.closed_signal() => return Err(BridgeError::Closed),
            read = async {
                let mut guard = self.reader.lock().await;
                let reader = guard.as_mut().ok_or(BridgeError::Closed)?;
                reader.next_frame().await
            } => read?,
        };

        let message: Message = self.codec.decode(&payload)?;
        tracing::trace!(id = %self.id, kind = %message.kind(), address = message.address(), "received message");
        Ok(message)
    }

    /// Closes the connection and releases the socket.
    ///
    /// Any task blocked in `send` or `receive` returns `Closed`. Calling
    /// `close` again is a no-op.
    ///
    /// # Errors
    /// `Write` if shutting down the write side fails. The socket is
    /// released either way.
    pub async fn close(&self) -> Result<(), BridgeError> {
        if self.closed.send_replace(true) {
            return Ok(());
        }
        tracing::debug!(id = %self.id, peer_addr = %self.peer_addr, "closing bridge connection");

        // In-flight calls have seen the signal and dropped their guards.
        let writer = self.writer.lock().await.take();
        drop(self.reader.lock().await.take());

        match writer {
            Some(mut writer) => match writer.shutdown().await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                Err(e) => Err(BridgeError::Write(e)),
            },
            None => Ok(()),
        }
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// The unique identifier for this connection, used in log fields.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The broker's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// The local end of the socket.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The configuration this connection was dialed with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Resolves once the connection is closed.
    async fn closed_signal(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives as long as `self`, so this cannot fail early.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl std::fmt::Debug for BridgeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConnection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}
