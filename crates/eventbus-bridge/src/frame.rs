//! Length-prefixed framing.
//!
//! Every message on the bridge is one frame:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ length (u32 BE)  │ payload (length bytes)   │
//! │ 4 bytes          │ UTF-8 JSON object        │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! JSON objects are not self-delimiting on a raw stream, so the reader
//! relies on the prefix alone and never scans the payload.
//!
//! [`read_frame`] reads exactly one frame and nothing more, but a frame
//! half-read when its future is dropped is lost. [`FrameReader`] keeps
//! partial frames in its own buffer and is safe to use in `select!`.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::BridgeError;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default largest payload accepted in either direction (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Builds a complete frame (prefix + payload) in one buffer.
///
/// # Errors
/// `FrameTooLarge` if the payload exceeds `max_frame_size` or does not fit
/// in a `u32` length.
pub fn encode_frame(payload: &[u8], max_frame_size: usize) -> Result<Vec<u8>, BridgeError> {
    let too_large = || BridgeError::FrameTooLarge {
        size: payload.len(),
        max: max_frame_size,
    };
    if payload.len() > max_frame_size {
        return Err(too_large());
    }
    let len = u32::try_from(payload.len()).map_err(|_| too_large())?;

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Writes `payload` as a single frame and flushes.
///
/// The prefix and payload go out in one `write_all`, so a caller holding
/// the write half exclusively never interleaves frames.
pub async fn write_frame<W>(
    writer: &mut W,
    payload: &[u8],
    max_frame_size: usize,
) -> Result<(), BridgeError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload, max_frame_size)?;
    writer.write_all(&frame).await.map_err(BridgeError::Write)?;
    writer.flush().await.map_err(BridgeError::Write)
}

/// Reads one frame and returns its payload.
///
/// Not cancel safe: dropping the future mid-frame loses the bytes already
/// read. Use [`FrameReader`] when reads may be cancelled.
///
/// # Errors
/// - `ConnectionClosed` if the stream ends cleanly before the first byte.
/// - `Truncated` if it ends part-way through the prefix or payload.
/// - `FrameTooLarge` if the announced length exceeds `max_frame_size`.
/// - `Read` for any other I/O failure.
pub async fn read_frame<R>(reader: &mut R, max_frame_size: usize) -> Result<Vec<u8>, BridgeError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    match read_full(reader, &mut prefix).await? {
        0 => return Err(BridgeError::ConnectionClosed),
        LENGTH_PREFIX_SIZE => {}
        received => {
            return Err(BridgeError::Truncated {
                expected: LENGTH_PREFIX_SIZE,
                received,
            });
        }
    }

    let len = u32::from_be_bytes(prefix) as usize;
    if len > max_frame_size {
        return Err(BridgeError::FrameTooLarge {
            size: len,
            max: max_frame_size,
        });
    }

    let mut payload = vec![0u8; len];
    let received = read_full(reader, &mut payload).await?;
    if received < len {
        return Err(BridgeError::Truncated {
            expected: len,
            received,
        });
    }

    tracing::trace!(len, "read frame");
    Ok(payload)
}

/// Fills `buf` unless the stream ends first; returns how many bytes landed.
///
/// Unlike `read_exact`, this reports how far it got, so the caller can tell
/// a clean close from a truncated frame.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize, BridgeError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(BridgeError::Read(e)),
        }
    }
    Ok(filled)
}

/// Bytes requested from the underlying reader per `read` call.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Buffered frame reader that survives cancellation.
///
/// Bytes are moved into an internal buffer as soon as they arrive, and a
/// frame is only handed out once it is complete. Dropping a
/// [`next_frame`](Self::next_frame) future at any await point leaves the
/// buffered bytes in place, and the next call carries on with the same
/// frame.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    buf: Vec<u8>,
    max_frame_size: usize,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Wraps `inner`, rejecting frames larger than `max_frame_size`.
    pub fn new(inner: R, max_frame_size: usize) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            max_frame_size,
        }
    }

    /// Number of bytes read from the stream but not yet returned.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Reads the next complete frame and returns its payload.
    ///
    /// Cancel safe. Errors are the same as [`read_frame`]'s.
    pub async fn next_frame(&mut self) -> Result<Vec<u8>, BridgeError> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            if let Some(payload) = self.take_frame()? {
                tracing::trace!(len = payload.len(), "read frame");
                return Ok(payload);
            }

            // A single `read` either completes or reads nothing, so
            // cancellation here cannot lose bytes.
            let n = match self.inner.read(&mut chunk).await {
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(BridgeError::Read(e)),
            };
            if n == 0 {
                return Err(self.eof_error());
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Splits a complete frame off the front of the buffer, if there is one.
    fn take_frame(&mut self) -> Result<Option<Vec<u8>>, BridgeError> {
        let Some(len) = self.announced_len() else {
            return Ok(None);
        };
        if len > self.max_frame_size {
            return Err(BridgeError::FrameTooLarge {
                size: len,
                max: self.max_frame_size,
            });
        }

        let end = LENGTH_PREFIX_SIZE + len;
        if self.buf.len() < end {
            return Ok(None);
        }
        let payload = self.buf[LENGTH_PREFIX_SIZE..end].to_vec();
        self.buf.drain(..end);
        Ok(Some(payload))
    }

    fn announced_len(&self) -> Option<usize> {
        let prefix: [u8; LENGTH_PREFIX_SIZE] =
            self.buf.get(..LENGTH_PREFIX_SIZE)?.try_into().ok()?;
        Some(u32::from_be_bytes(prefix) as usize)
    }

    fn eof_error(&self) -> BridgeError {
        match self.announced_len() {
            None if self.buf.is_empty() => BridgeError::ConnectionClosed,
            None => BridgeError::Truncated {
                expected: LENGTH_PREFIX_SIZE,
                received: self.buf.len(),
            },
            Some(len) => BridgeError::Truncated {
                expected: len,
                received: self.buf.len() - LENGTH_PREFIX_SIZE,
            },
        }
    }
}
