//! Length-prefixed JSON frames, the browser native-messaging layout:
//! a 4-byte length in native byte order followed by that many bytes of JSON.

use std::io;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Read one frame. `Ok(None)` on a clean end of stream, that is before the
/// first byte of a length prefix.
pub async fn read_frame<R, T>(reader: &mut R) -> io::Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut length_bytes = [0u8; 4];
    let mut filled = 0;
    while filled < length_bytes.len() {
        let read = reader.read(&mut length_bytes[filled..]).await?;
        if read == 0 {
            if filled == 0 {
                return Ok(None); // No more messages
            }
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("truncated frame header ({filled} of 4 bytes)"),
            ));
        }
        filled += read;
    }

    let length = u32::from_ne_bytes(length_bytes) as usize;
    if length > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {length} bytes exceeds {MAX_FRAME_LEN}"),
        ));
    }

    let mut buffer = vec![0u8; length];
    reader.read_exact(&mut buffer).await?;

    let message = serde_json::from_slice(&buffer)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(message))
}

pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let json =
        serde_json::to_vec(message).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let length = u32::try_from(json.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "frame too large"))?;

    writer.write_all(&length.to_ne_bytes()).await?;
    writer.write_all(&json).await?;
    writer.flush().await?;
    Ok(())
}
