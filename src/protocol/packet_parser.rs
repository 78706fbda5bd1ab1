// Wire codec and length-prefix framing.
//
// A frame is a 4 byte big-endian length followed by exactly that many bytes
// of encoded `WireMessage`. One frame is sent per connection.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{AppError, Result};
use crate::protocol::message_types::WireMessage;

pub const PREFIX_LEN: usize = 4;

/// Largest payload accepted on either side of a connection.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub struct PacketParser;

impl PacketParser {
    pub fn serialize_message(message: &WireMessage) -> Result<Vec<u8>> {
        let bytes = serde_json::to_vec(message)?;
        Ok(bytes)
    }

    pub fn parse_message(data: &[u8]) -> Result<WireMessage> {
        serde_json::from_slice(data).map_err(AppError::DecodeError)
    }
}

pub fn encode(message: &WireMessage) -> Result<Vec<u8>> {
    PacketParser::serialize_message(message)
}

pub fn decode(data: &[u8]) -> Result<WireMessage> {
    PacketParser::parse_message(data)
}

fn checked_len(payload: &[u8]) -> Result<u32> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(AppError::FramingError(format!(
            "Payload of {} bytes exceeds the {} byte limit",
            payload.len(),
            MAX_FRAME_LEN
        )));
    }
    Ok(payload.len() as u32)
}

/// Prefixes `payload` with its length in network byte order.
pub fn add_length_prefix(payload: &[u8]) -> Result<Vec<u8>> {
    let len = checked_len(payload)?;
    let mut frame = Vec::with_capacity(PREFIX_LEN + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Validates a complete frame and returns its payload.
pub fn strip_length_prefix(frame: &[u8]) -> Result<&[u8]> {
    if frame.len() < PREFIX_LEN {
        return Err(AppError::FramingError(format!(
            "Frame of {} bytes is shorter than the length prefix",
            frame.len()
        )));
    }
    let mut prefix = [0u8; PREFIX_LEN];
    prefix.copy_from_slice(&frame[..PREFIX_LEN]);
    let len = u32::from_be_bytes(prefix) as usize;
    let payload = &frame[PREFIX_LEN..];
    if payload.len() != len {
        return Err(AppError::FramingError(format!(
            "Prefix announces {} bytes but frame carries {}",
            len,
            payload.len()
        )));
    }
    Ok(payload)
}

/// Writes the prefix then the payload. Returns the number of bytes written.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<usize> {
    let len = checked_len(payload)?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(PREFIX_LEN + payload.len())
}

/// Reads one frame, looping over short reads until the announced length is
/// accumulated. A stream that ends early is a framing error.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut prefix = [0u8; PREFIX_LEN];
    reader
        .read_exact(&mut prefix)
        .await
        .map_err(|e| short_read(e, "length prefix"))?;

    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_FRAME_LEN {
        return Err(AppError::FramingError(format!(
            "Announced length {} exceeds the {} byte limit",
            len, MAX_FRAME_LEN
        )));
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| short_read(e, &format!("{} byte payload", len)))?;
    Ok(payload)
}

fn short_read(err: std::io::Error, what: &str) -> AppError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        AppError::FramingError(format!("Connection closed before the {} was read", what))
    } else {
        AppError::IOError(err)
    }
}
