//! Frame codec
//!
//! Encoding and decoding functions for the length-prefixed, opcode-tagged
//! framing. Stream helpers are generic over `Read`/`Write` so they work
//! against sockets and in-memory buffers alike.

use std::io::{Read, Write};

use crate::error::{ClientError, Result};

/// Header size: 4 byte length prefix + 1 byte opcode
pub const HEADER_SIZE: usize = 5;

/// Maximum accepted frame length, opcode byte included (16 MB)
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Encode a frame to bytes
///
/// Format: length (4, big-endian, counts opcode + body) + opcode (1) + body
pub fn encode_frame(opcode: u8, body: &[u8]) -> Result<Vec<u8>> {
    let frame_len = body.len() as u64 + 1;
    if frame_len > MAX_FRAME_LEN as u64 {
        return Err(ClientError::Framing(format!(
            "frame too large: {} bytes (max {})",
            frame_len, MAX_FRAME_LEN
        )));
    }

    let mut frame = Vec::with_capacity(HEADER_SIZE + body.len());
    frame.extend_from_slice(&(frame_len as u32).to_be_bytes());
    frame.push(opcode);
    frame.extend_from_slice(body);

    Ok(frame)
}

/// Write one complete frame to a stream and flush it
///
/// The flush guarantees the frame is handed to the transport before the
/// caller turns around to read the response.
pub fn write_frame<W: Write>(writer: &mut W, opcode: u8, body: &[u8]) -> Result<()> {
    let bytes = encode_frame(opcode, body)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read one complete frame from a stream
///
/// Blocks until the full frame is received or an error occurs. Returns the
/// opcode and the (possibly empty) body. The declared length is validated
/// before the body is allocated; a zero or oversized length means the stream
/// can no longer be trusted.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<(u8, Vec<u8>)> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let frame_len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    let opcode = header[4];

    if frame_len == 0 {
        return Err(ClientError::Framing(
            "frame length zero: length must cover the opcode byte".to_string(),
        ));
    }
    if frame_len > MAX_FRAME_LEN {
        return Err(ClientError::Framing(format!(
            "frame too large: {} bytes (max {})",
            frame_len, MAX_FRAME_LEN
        )));
    }

    let body_len = (frame_len - 1) as usize;
    let mut body = vec![0u8; body_len];
    if body_len > 0 {
        reader.read_exact(&mut body)?;
    }

    Ok((opcode, body))
}
