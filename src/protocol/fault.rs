//! Server error descriptor
//!
//! Body codec for the reserved error-response frame.

use crate::error::{ClientError, Result};

/// A structured error reported by the server
///
/// Carried in the body of an error-response frame: a 4-byte big-endian
/// numeric code followed by a UTF-8 message occupying the rest of the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFault {
    /// Numeric error code
    pub code: u32,

    /// Human-readable message
    pub message: String,
}

impl ServerFault {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Encode the descriptor as an error-frame body
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(4 + self.message.len());
        body.extend_from_slice(&self.code.to_be_bytes());
        body.extend_from_slice(self.message.as_bytes());
        body
    }

    /// Decode a descriptor from an error-frame body
    ///
    /// A truncated or non-UTF-8 descriptor is a framing error: the peer is
    /// not speaking the protocol and the stream cannot be trusted.
    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < 4 {
            return Err(ClientError::Framing(format!(
                "truncated error descriptor: {} bytes (need at least 4)",
                body.len()
            )));
        }

        let code = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
        let message = std::str::from_utf8(&body[4..])
            .map_err(|_| {
                ClientError::Framing("error descriptor message is not valid UTF-8".to_string())
            })?
            .to_string();

        Ok(Self { code, message })
    }
}
