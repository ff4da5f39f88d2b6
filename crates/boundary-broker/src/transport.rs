//! Length-prefixed multipart framing over a TCP stream.
//!
//! One message on the socket is:
//!
//! ```text
//! +------------------+
//! | frame count (4)  |  u32 little-endian
//! +------------------+
//! | frame 0 len (4)  |  u32 little-endian
//! | frame 0 bytes    |
//! +------------------+
//! | ...              |  repeated per frame
//! +------------------+
//! ```
//!
//! The frame lists themselves (channel id, class tag, skeleton, buffers) are
//! laid out by `boundary_core::protocol::wire`.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use boundary_core::error::{BoundaryError, Result};

/// Upper bound on frames per message; a count above this is hostile input.
const MAX_FRAMES: usize = 4096;

/// Write one multipart message and flush it.
pub async fn write_message<W>(writer: &mut W, frames: &[Bytes]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let count = u32::try_from(frames.len())
        .map_err(|_| BoundaryError::protocol("too many frames in message"))?;

    let payload: usize = frames.iter().map(|f| f.len() + 4).sum();
    let mut buf = Vec::with_capacity(4 + payload);
    buf.extend_from_slice(&count.to_le_bytes());
    for frame in frames {
        let len = u32::try_from(frame.len())
            .map_err(|_| BoundaryError::protocol("frame exceeds u32 length"))?;
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(frame);
    }

    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one multipart message, rejecting frames above `max_frame_bytes`.
pub async fn read_message<R>(reader: &mut R, max_frame_bytes: usize) -> Result<Vec<Bytes>>
where
    R: AsyncRead + Unpin,
{
    let mut word = [0u8; 4];
    reader.read_exact(&mut word).await?;
    let count = u32::from_le_bytes(word) as usize;
    if count > MAX_FRAMES {
        return Err(BoundaryError::protocol(format!(
            "message declares {count} frames (max {MAX_FRAMES})"
        )));
    }

    let mut frames = Vec::with_capacity(count);
    for _ in 0..count {
        reader.read_exact(&mut word).await?;
        let len = u32::from_le_bytes(word) as usize;
        if len > max_frame_bytes {
            return Err(BoundaryError::protocol(format!(
                "frame of {len} bytes exceeds cap of {max_frame_bytes}"
            )));
        }
        let mut data = vec![0u8; len];
        reader.read_exact(&mut data).await?;
        frames.push(Bytes::from(data));
    }
    Ok(frames)
}
