//! Error types for the OrbitKV client
//!
//! Provides a unified error type for all connection operations.

use thiserror::Error;

/// Result type alias using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

/// Unified error type for OrbitKV client operations
#[derive(Debug, Error)]
pub enum ClientError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("connection closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    #[error("framing error: {0}")]
    Framing(String),

    // -------------------------------------------------------------------------
    // Server-Reported Errors
    // -------------------------------------------------------------------------
    #[error("server error {code}: {message}")]
    Server { code: u32, message: String },

    // -------------------------------------------------------------------------
    // Resource Release Errors
    // -------------------------------------------------------------------------
    #[error("socket release failed: {0}")]
    Resource(#[source] std::io::Error),
}

impl ClientError {
    /// Whether the connection must be discarded after this error.
    ///
    /// Transport and framing failures leave the byte stream in an unknown
    /// state, so the connection cannot be reused. A server-reported error is
    /// an application-level reply; the stream stays aligned and the next
    /// request may proceed on the same connection.
    pub fn is_fatal(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Closed => true,
            ClientError::Framing(_) => true,
            ClientError::Server { .. } => false,
            ClientError::Resource(_) => false,
        }
    }
}
