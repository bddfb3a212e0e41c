#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use trellis::{Server, ServerConfig};

/// Pick a free port, apply the caller's route registration, start the
/// server on a background thread and wait until it accepts.
pub fn start_server(configure: impl FnOnce(&mut Server)) -> SocketAddr {
    let probe = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = probe.local_addr().unwrap();
    drop(probe);

    let config = ServerConfig {
        port: addr.port(),
        thread_pool_size: 4,
        ..ServerConfig::default()
    };
    let mut server = Server::new(config);
    configure(&mut server);
    thread::spawn(move || server.start().unwrap());
    wait_ready(&addr);
    addr
}

/// Poll until the server answers TCP connects.
pub fn wait_ready(addr: &SocketAddr) {
    for _ in 0..100 {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("server at {addr} not ready");
}

/// Send one raw HTTP request and return the complete raw response.
pub fn send_request(addr: &SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    read_response(&mut stream)
}

/// Read a single response off an open connection: headers first, then
/// exactly `Content-Length` body bytes.
pub fn read_response(stream: &mut TcpStream) -> String {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut raw: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];
    let deadline = Instant::now() + Duration::from_secs(5);

    let header_end = loop {
        if let Some(pos) = find(&raw, b"\r\n\r\n") {
            break pos;
        }
        assert!(Instant::now() < deadline, "no header terminator received");
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "connection closed before headers completed");
        raw.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
    let length: usize = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())?
        })
        .unwrap_or(0);

    let total = header_end + 4 + length;
    while raw.len() < total {
        assert!(Instant::now() < deadline, "body truncated");
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "connection closed mid-body");
        raw.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&raw[..total]).to_string()
}

/// Split a raw response into (status, headers, body).
pub fn parse_response(raw: &str) -> (u16, String, String) {
    let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    (status, head.to_string(), body.to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
