//! # OrbitKV Client
//!
//! Connection core for the OrbitKV key-value store protocol:
//! - Length-prefixed, opcode-tagged binary framing over TCP
//! - Error-frame detection with structured server fault reporting
//! - Pooled-idle lifecycle with a race-safe reclaim-vs-expiry guard
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Pool / Session Layer                     │
//! │        (reuse policy, domain operations - external)         │
//! └──────────┬────────────────────────────────┬─────────────────┘
//!            │ send / receive                 │ begin_idle /
//!            │                                │ end_idle_and_check_valid
//! ┌──────────▼──────────┐          ┌──────────▼──────────┐
//! │     Connection      │◀─ token ─│   IdleScheduler     │
//! │  (socket + framing) │   check  │   (timer thread)    │
//! └──────────┬──────────┘          └─────────────────────┘
//!            │ TCP
//! ┌──────────▼──────────┐
//! │   OrbitKV Server    │
//! └─────────────────────┘
//! ```
//!
//! One request frame out, one response frame back, strictly alternating per
//! connection. A connection returned to the pool unused is parked with
//! [`Connection::begin_idle`]; the pool either reclaims it in time or the
//! shared timer retires its socket.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ClientError, Result};
pub use config::Config;
pub use network::{Connection, IdleScheduler};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the OrbitKV client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
