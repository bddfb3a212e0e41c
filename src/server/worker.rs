//! Worker threads: the per-connection keep-alive loop.
//!
//! A worker pops a socket off the hand-off queue and owns it for the
//! rest of the conversation. Bytes are accumulated into a growing
//! buffer; once `\r\n\r\n` and the full `Content-Length` body are
//! buffered, the request is decoded, dispatched through the root
//! router and the serialised response written back. Exactly the
//! consumed request's bytes are drained from the buffer, so
//! pipelined requests left behind are answered in order on the next
//! turn of the loop.
//!
//! Connection state walks `Reading → Parsing → Dispatching → Writing`
//! and back to `Reading` on keep-alive; it closes on parse failure,
//! zero-byte read, a receive error other than the timeout, a send
//! error, or a non-keep-alive exchange.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::http::{content_length, find_header_end, Request, Response};
use crate::middleware::{Handler, Next};
use crate::render::RenderEngine;
use crate::router::{terminal_not_found, Router};
use crate::server::queue::HandoffQueue;
use crate::shutdown;

/// Everything a worker thread needs, shared across the pool.
pub(crate) struct WorkerContext {
    pub router: Arc<Router>,
    pub engine: Option<Arc<dyn RenderEngine>>,
    pub view_dir: String,
    pub active: Arc<AtomicUsize>,
    pub buffer_size: usize,
}

enum Exchange {
    KeepAlive,
    Close,
}

/// Pool-thread body: dequeue, serve, repeat until shutdown.
pub(crate) fn run(queue: Arc<HandoffQueue<TcpStream>>, ctx: Arc<WorkerContext>) {
    while !shutdown::requested() {
        if let Some(stream) = queue.pop() {
            handle_client(stream, &ctx);
            ctx.active.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

fn handle_client(mut stream: TcpStream, ctx: &WorkerContext) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    debug!(peer = %peer, "connection picked up");

    let mut chunk = vec![0u8; ctx.buffer_size];
    let mut buffer: Vec<u8> = Vec::new();

    while !shutdown::requested() {
        let read = match stream.read(&mut chunk) {
            Ok(0) => {
                debug!(peer = %peer, "connection closed by client");
                return;
            }
            Ok(n) => n,
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                // Receive timeout; re-check the shutdown flag and wait on.
                continue;
            }
            Err(e) => {
                debug!(peer = %peer, error = %e, "receive failed");
                return;
            }
        };
        buffer.extend_from_slice(&chunk[..read]);

        // Answer every complete request currently buffered.
        loop {
            let Some(header_end) = find_header_end(&buffer) else {
                break;
            };
            let length = match content_length(&buffer[..header_end]) {
                Ok(length) => length,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "rejecting request");
                    reject(&mut stream);
                    return;
                }
            };
            let total = header_end + 4 + length;
            if buffer.len() < total {
                break;
            }
            let exchange = serve(&buffer[..total], &mut stream, ctx, &peer);
            buffer.drain(..total);
            if matches!(exchange, Exchange::Close) {
                return;
            }
        }
    }
}

/// Decode, dispatch and answer one request.
fn serve(raw: &[u8], stream: &mut TcpStream, ctx: &WorkerContext, peer: &str) -> Exchange {
    let mut req = match Request::parse(raw) {
        Ok(req) => req,
        Err(e) => {
            warn!(peer = %peer, error = %e, "failed to parse request");
            reject(stream);
            return Exchange::Close;
        }
    };

    let mut res = Response::with_engine(ctx.engine.clone(), &ctx.view_dir);
    let keep_alive = req.wants_keep_alive();
    if !keep_alive {
        res.set_close();
    }

    ctx.router
        .handle(&mut req, &mut res, Next::new(terminal_not_found));

    info!(
        peer = %peer,
        method = %req.method,
        path = %req.path,
        status = res.status,
        "request served"
    );

    if let Err(e) = stream.write_all(&res.to_bytes()) {
        error!(peer = %peer, error = %e, "send failed");
        return Exchange::Close;
    }

    if keep_alive {
        Exchange::KeepAlive
    } else {
        Exchange::Close
    }
}

/// Best-effort `400 Bad Request` with `Connection: close`.
fn reject(stream: &mut TcpStream) {
    let res = Response::bad_request();
    let _ = stream.write_all(&res.to_bytes());
}
