//! OrbitKV Ping Utility
//!
//! Sends one body-less ping frame and waits for the matching response.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use orbitkv_client::protocol::opcode;
use orbitkv_client::{Config, Connection, IdleScheduler};

/// OrbitKV Ping
#[derive(Parser, Debug)]
#[command(name = "orbitkv-ping")]
#[command(about = "Liveness check for an OrbitKV server")]
#[command(version)]
struct Args {
    /// Server hostname or IP address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server TCP port
    #[arg(short, long, default_value_t = orbitkv_client::config::DEFAULT_PORT)]
    port: u16,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,orbitkv_client=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    let config = Config::builder().host(&args.host).port(args.port).build();
    let scheduler = Arc::new(IdleScheduler::new());

    let started = Instant::now();
    let conn = match Connection::connect(&config, scheduler) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("failed to connect to {}:{}: {}", args.host, args.port, e);
            std::process::exit(1);
        }
    };

    let result = conn
        .send(opcode::PING_REQ, &[])
        .and_then(|_| conn.receive_ack(opcode::PING_RESP));

    match result {
        Ok(()) => {
            println!("PONG from {} in {:?}", conn.peer_addr(), started.elapsed());
        }
        Err(e) => {
            tracing::error!("ping to {} failed: {}", conn.peer_addr(), e);
            std::process::exit(1);
        }
    }
}
