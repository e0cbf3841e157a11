//! Length-prefixed JSON framing for server messages.

use crate::error::{NetError, NetResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame size (64 KiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Reads a length-prefixed JSON frame.
pub async fn read_frame<T, R>(io: &mut R) -> NetResult<T>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    // Read 4-byte length prefix
    let mut len_bytes = [0u8; 4];
    io.read_exact(&mut len_bytes).await?;
    let len = u32::from_be_bytes(len_bytes) as usize;

    if len > MAX_FRAME_SIZE {
        return Err(NetError::Protocol(format!("frame too large: {len} bytes")));
    }

    let mut buf = vec![0u8; len];
    io.read_exact(&mut buf).await?;

    Ok(serde_json::from_slice(&buf)?)
}

/// Writes a length-prefixed JSON frame.
pub async fn write_frame<T, W>(io: &mut W, message: &T) -> NetResult<()>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let data = serde_json::to_vec(message)?;

    if data.len() > MAX_FRAME_SIZE {
        return Err(NetError::Protocol(format!(
            "frame too large: {} bytes",
            data.len()
        )));
    }

    let len_bytes = (data.len() as u32).to_be_bytes();
    io.write_all(&len_bytes).await?;
    io.write_all(&data).await?;
    io.flush().await?;

    Ok(())
}
