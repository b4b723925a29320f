//! Protocol Module
//!
//! Defines the wire framing for client-server communication.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Len (4)  │ Op (1)   │         Body                │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! `Len` is big-endian and counts the opcode byte plus the body, so a
//! body-less frame carries `Len = 1`.
//!
//! ## Reserved Opcodes
//! - 0x00: ERROR_RESP - body is a structured error descriptor
//! - 0x01: PING_REQ   - body: empty
//! - 0x02: PING_RESP  - body: empty
//!
//! All other opcodes belong to the message schemas layered on top of this
//! crate; frames are matched against the opcode the caller expects and the
//! body is returned undecoded.
//!
//! ## Error Descriptor Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Code (4) │   Message (UTF-8)           │
//! └──────────┴─────────────────────────────┘
//! ```

mod fault;
mod frame;

pub use fault::ServerFault;
pub use frame::{encode_frame, read_frame, write_frame, HEADER_SIZE, MAX_FRAME_LEN};

/// Opcodes with reserved meaning to the connection core
pub mod opcode {
    /// Error-response frame; body is a [`ServerFault`](super::ServerFault) descriptor
    pub const ERROR_RESP: u8 = 0x00;

    /// Liveness request (body-less)
    pub const PING_REQ: u8 = 0x01;

    /// Liveness response (body-less)
    pub const PING_RESP: u8 = 0x02;
}
