//! Connection Tests
//!
//! Exercises the framing contract against real sockets: a listener thread
//! plays the server side of the protocol using the frame codec directly.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::JoinHandle;

use orbitkv_client::protocol::{opcode, read_frame, write_frame, ServerFault};
use orbitkv_client::{ClientError, Config, Connection, IdleScheduler};

const OP_REQ: u8 = 0x0B;
const OP_RESP: u8 = 0x0C;

/// Spawn a one-connection server running `serve` on the accepted stream
fn spawn_server<F>(serve: F) -> (SocketAddr, JoinHandle<()>)
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = std::thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            serve(stream);
        }
    });
    (addr, handle)
}

fn connect(addr: SocketAddr) -> Connection {
    let config = Config::builder()
        .host("127.0.0.1")
        .port(addr.port())
        .build();
    let scheduler = Arc::new(IdleScheduler::new());
    Connection::connect(&config, scheduler).unwrap()
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_echo_round_trip() {
    let (addr, server) = spawn_server(|mut stream| {
        if let Ok((op, body)) = read_frame(&mut stream) {
            write_frame(&mut stream, op, &body).unwrap();
        }
    });

    let conn = connect(addr);
    conn.send(OP_REQ, b"some payload").unwrap();
    let body = conn.receive(OP_REQ).unwrap();

    assert_eq!(body, b"some payload");
    server.join().unwrap();
}

#[test]
fn test_echo_empty_payload() {
    let (addr, server) = spawn_server(|mut stream| {
        if let Ok((op, body)) = read_frame(&mut stream) {
            write_frame(&mut stream, op, &body).unwrap();
        }
    });

    let conn = connect(addr);
    conn.send(OP_REQ, &[]).unwrap();
    let body = conn.receive(OP_REQ).unwrap();

    assert!(body.is_empty());
    server.join().unwrap();
}

#[test]
fn test_echo_large_binary_payload() {
    let payload: Vec<u8> = (0..64 * 1024u32).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();

    let (addr, server) = spawn_server(|mut stream| {
        if let Ok((op, body)) = read_frame(&mut stream) {
            write_frame(&mut stream, op, &body).unwrap();
        }
    });

    let conn = connect(addr);
    conn.send(OP_REQ, &payload).unwrap();
    let body = conn.receive(OP_REQ).unwrap();

    assert_eq!(body, expected);
    server.join().unwrap();
}

#[test]
fn test_multiple_request_cycles() {
    let (addr, server) = spawn_server(|mut stream| {
        for _ in 0..3 {
            match read_frame(&mut stream) {
                Ok((op, body)) => write_frame(&mut stream, op, &body).unwrap(),
                Err(_) => return,
            }
        }
    });

    let conn = connect(addr);
    for i in 0..3u8 {
        let payload = vec![i; 8];
        conn.send(OP_REQ, &payload).unwrap();
        assert_eq!(conn.receive(OP_REQ).unwrap(), payload);
    }
    server.join().unwrap();
}

// =============================================================================
// Opcode Mismatch Tests
// =============================================================================

#[test]
fn test_unexpected_message_code() {
    let (addr, server) = spawn_server(|mut stream| {
        if read_frame(&mut stream).is_ok() {
            // Respond with the wrong (non-error) opcode
            write_frame(&mut stream, 0x07, b"whatever").unwrap();
        }
    });

    let conn = connect(addr);
    conn.send(0x05, &[]).unwrap();
    let err = conn.receive(0x05).unwrap_err();

    match &err {
        ClientError::Framing(msg) => assert!(msg.contains("unexpected message code")),
        other => panic!("expected framing error, got {:?}", other),
    }
    assert!(err.is_fatal());
    server.join().unwrap();
}

// =============================================================================
// Error Frame Tests
// =============================================================================

#[test]
fn test_error_frame_reported_as_server_error() {
    let (addr, server) = spawn_server(|mut stream| {
        if read_frame(&mut stream).is_ok() {
            let fault = ServerFault::new(2, "overload");
            write_frame(&mut stream, opcode::ERROR_RESP, &fault.encode()).unwrap();
        }
    });

    let conn = connect(addr);
    conn.send(OP_REQ, b"req").unwrap();
    let err = conn.receive(OP_RESP).unwrap_err();

    match &err {
        ClientError::Server { code, message } => {
            assert_eq!(*code, 2);
            assert_eq!(message, "overload");
        }
        other => panic!("expected server error, got {:?}", other),
    }
    // Server-reported errors leave the connection usable
    assert!(!err.is_fatal());
    assert!(conn.is_open());
    server.join().unwrap();
}

#[test]
fn test_error_frame_wins_over_opcode_match() {
    // Even when the caller "expects" the error opcode, the frame decodes as
    // a server error rather than as a payload
    let (addr, server) = spawn_server(|mut stream| {
        if read_frame(&mut stream).is_ok() {
            let fault = ServerFault::new(9, "shutting down");
            write_frame(&mut stream, opcode::ERROR_RESP, &fault.encode()).unwrap();
        }
    });

    let conn = connect(addr);
    conn.send(OP_REQ, &[]).unwrap();
    let err = conn.receive(opcode::ERROR_RESP).unwrap_err();

    assert!(matches!(err, ClientError::Server { code: 9, .. }));
    server.join().unwrap();
}

#[test]
fn test_malformed_error_frame() {
    let (addr, server) = spawn_server(|mut stream| {
        if read_frame(&mut stream).is_ok() {
            // Error frame with a 2-byte body: too short for a descriptor
            write_frame(&mut stream, opcode::ERROR_RESP, &[0x00, 0x01]).unwrap();
        }
    });

    let conn = connect(addr);
    conn.send(OP_REQ, &[]).unwrap();
    let err = conn.receive(OP_RESP).unwrap_err();

    assert!(matches!(err, ClientError::Framing(_)));
    server.join().unwrap();
}

// =============================================================================
// Ack Tests
// =============================================================================

#[test]
fn test_receive_ack_bodyless() {
    let (addr, server) = spawn_server(|mut stream| {
        if read_frame(&mut stream).is_ok() {
            write_frame(&mut stream, opcode::PING_RESP, &[]).unwrap();
        }
    });

    let conn = connect(addr);
    conn.send(opcode::PING_REQ, &[]).unwrap();
    conn.receive_ack(opcode::PING_RESP).unwrap();
    server.join().unwrap();
}

#[test]
fn test_receive_ack_rejects_payload() {
    let (addr, server) = spawn_server(|mut stream| {
        if read_frame(&mut stream).is_ok() {
            // Frame length 5: opcode plus a 4-byte body
            write_frame(&mut stream, OP_RESP, &[1, 2, 3, 4]).unwrap();
        }
    });

    let conn = connect(addr);
    conn.send(OP_REQ, &[]).unwrap();
    let err = conn.receive_ack(OP_RESP).unwrap_err();

    match err {
        ClientError::Framing(msg) => assert!(msg.contains("unexpected payload")),
        other => panic!("expected framing error, got {:?}", other),
    }
    server.join().unwrap();
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_send_after_close() {
    let (addr, server) = spawn_server(|_stream| {});

    let conn = connect(addr);
    conn.close().unwrap();

    assert!(!conn.is_open());
    assert!(matches!(conn.send(OP_REQ, &[]), Err(ClientError::Closed)));
    assert!(matches!(conn.receive(OP_RESP), Err(ClientError::Closed)));
    server.join().unwrap();
}

#[test]
fn test_close_twice_is_noop() {
    let (addr, server) = spawn_server(|_stream| {});

    let conn = connect(addr);
    conn.close().unwrap();
    conn.close().unwrap();
    server.join().unwrap();
}

#[test]
fn test_connect_refused() {
    // Grab a port with no listener behind it
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = Config::builder()
        .host("127.0.0.1")
        .port(addr.port())
        .build();
    let scheduler = Arc::new(IdleScheduler::new());
    let result = Connection::connect(&config, scheduler);

    assert!(matches!(result, Err(ClientError::Transport(_))));
}

#[test]
fn test_with_writer_raw_access() {
    let (addr, server) = spawn_server(|mut stream| {
        if let Ok((op, body)) = read_frame(&mut stream) {
            write_frame(&mut stream, op, &body).unwrap();
        }
    });

    let conn = connect(addr);
    // Hand-write a frame through the raw writer, then read it back normally
    let frame = orbitkv_client::protocol::encode_frame(OP_REQ, b"batched").unwrap();
    conn.with_writer(|writer| {
        use std::io::Write;
        writer.write_all(&frame)?;
        writer.flush()
    })
    .unwrap();

    assert_eq!(conn.receive(OP_REQ).unwrap(), b"batched");
    server.join().unwrap();
}
