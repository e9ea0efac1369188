//! Length-prefixed framing over a byte stream.
//!
//! Format: `[u32 little-endian payload length][payload]`. One frame carries
//! exactly one encoded [`Packet`](crate::Packet), so reads can never merge or
//! split two messages.

use crate::{decode_packet, encode_packet, Packet};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// The peer closed the stream cleanly between two frames.
    #[error("connection closed")]
    ConnectionClosed,
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Reads one frame payload, refusing lengths above `max_len` before
/// allocating anything.
pub async fn read_frame<R: AsyncRead + Unpin>(
    stream: &mut R,
    max_len: usize,
) -> Result<Vec<u8>, FramingError> {
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        let n = stream.read(&mut len_buf[filled..]).await?;
        if n == 0 {
            // Only a close before the first prefix byte is clean.
            if filled == 0 {
                return Err(FramingError::ConnectionClosed);
            }
            return Err(FramingError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed inside a frame length prefix",
            )));
        }
        filled += n;
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > max_len {
        return Err(FramingError::FrameTooLarge { len, max: max_len });
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Writes one frame and flushes it.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    stream: &mut W,
    payload: &[u8],
) -> Result<(), FramingError> {
    if payload.len() > crate::MAX_FRAME_LEN {
        return Err(FramingError::FrameTooLarge {
            len: payload.len(),
            max: crate::MAX_FRAME_LEN,
        });
    }

    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
    stream.write_all(&buf).await?;
    stream.flush().await?;
    Ok(())
}

/// Encodes and sends a packet as a single frame.
pub async fn send_packet<W: AsyncWrite + Unpin>(
    stream: &mut W,
    packet: &Packet,
) -> Result<(), FramingError> {
    let payload = encode_packet(packet)
        .map_err(|e| FramingError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    write_frame(stream, &payload).await
}

/// Receives one frame and decodes it. Used by clients; the server keeps the
/// two steps apart to tell transport failures from protocol violations.
pub async fn recv_packet<R: AsyncRead + Unpin>(
    stream: &mut R,
    max_len: usize,
) -> Result<Packet, FramingError> {
    let payload = read_frame(stream, max_len).await?;
    decode_packet(&payload)
        .map_err(|e| FramingError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}
