//! Network Module
//!
//! TCP connection core and the idle retirement scheduler.
//!
//! ## Architecture
//! - One caller thread drives send/receive per connection
//! - A shared timer thread retires parked connections
//! - Reclaim vs. expiry races resolved by a per-idle token under one mutex

mod connection;
mod idle;

pub use connection::Connection;
pub use idle::{IdleScheduler, TimerKey};
