//! Connection acceptance: non-blocking listeners driven by an OS
//! readiness facility.
//!
//! Each acceptor thread owns its own listener bound to the shared
//! port via `SO_REUSEPORT` and its own `mio::Poll`. The listener is
//! drained to `WouldBlock` on every readiness event; accepted sockets
//! are counted against the connection cap, switched to `TCP_NODELAY`
//! and registered for read readiness. A client socket is handed to
//! the worker queue on its first readable event, converted back to a
//! blocking stream with the receive timeout the workers expect.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::os::fd::{FromRawFd, IntoRawFd};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, error, warn};

use crate::config::ServerConfig;
use crate::server::queue::HandoffQueue;
use crate::shutdown;

const LISTENER: Token = Token(0);
/// Poll timeout; bounds how long a parked acceptor takes to observe
/// the shutdown flag.
const POLL_WAIT: Duration = Duration::from_millis(100);
/// Receive timeout applied to sockets before hand-off.
pub(crate) const RECV_TIMEOUT: Duration = Duration::from_secs(5);

const SOCKET_BUFFER: usize = 1024 * 1024;

/// Bind a non-blocking listener with the address/port-reuse and
/// buffer options the server runs with everywhere.
pub(crate) fn bind_listener(config: &ServerConfig) -> io::Result<std::net::TcpListener> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_reuse_port(true)?;
    socket.set_recv_buffer_size(SOCKET_BUFFER)?;
    socket.set_send_buffer_size(SOCKET_BUFFER)?;
    socket.set_nonblocking(true)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    socket.bind(&addr.into())?;
    socket.listen(config.accept_queue_size)?;
    Ok(socket.into())
}

/// Accept-loop body run by each acceptor thread until shutdown.
pub(crate) fn run(
    listener: std::net::TcpListener,
    queue: Arc<HandoffQueue<std::net::TcpStream>>,
    active: Arc<AtomicUsize>,
    config: ServerConfig,
) {
    if let Err(e) = accept_loop(listener, &queue, &active, &config) {
        error!(error = %e, "acceptor terminated");
    }
}

fn accept_loop(
    listener: std::net::TcpListener,
    queue: &HandoffQueue<std::net::TcpStream>,
    active: &AtomicUsize,
    config: &ServerConfig,
) -> io::Result<()> {
    let mut listener = TcpListener::from_std(listener);
    let mut poll = Poll::new()?;
    poll.registry()
        .register(&mut listener, LISTENER, Interest::READABLE)?;

    let mut events = Events::with_capacity(config.max_events);
    let mut pending: HashMap<Token, TcpStream> = HashMap::new();
    let mut next_token: usize = 1;

    while !shutdown::requested() {
        if let Err(e) = poll.poll(&mut events, Some(POLL_WAIT)) {
            if e.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(e);
        }

        for event in events.iter() {
            if event.token() == LISTENER {
                accept_ready(&listener, &poll, &mut pending, &mut next_token, active, config);
            } else {
                let Some(mut stream) = pending.remove(&event.token()) else {
                    continue;
                };
                let _ = poll.registry().deregister(&mut stream);
                if event.is_readable() {
                    match into_blocking(stream) {
                        Ok(stream) => queue.push(stream),
                        Err(e) => {
                            warn!(error = %e, "failed to prepare client socket");
                            active.fetch_sub(1, Ordering::Relaxed);
                        }
                    }
                } else {
                    // Error or hang-up before the first byte arrived.
                    active.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
    }
    Ok(())
}

/// Drain the listener until it would block.
fn accept_ready(
    listener: &TcpListener,
    poll: &Poll,
    pending: &mut HashMap<Token, TcpStream>,
    next_token: &mut usize,
    active: &AtomicUsize,
    config: &ServerConfig,
) {
    loop {
        match listener.accept() {
            Ok((mut stream, peer)) => {
                if active.load(Ordering::Relaxed) >= config.max_connections {
                    debug!(peer = %peer, "connection cap reached, dropping socket");
                    continue;
                }
                active.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(peer = %peer, error = %e, "failed to set TCP_NODELAY");
                }
                let token = Token(*next_token);
                *next_token = next_token.wrapping_add(1).max(1);
                if let Err(e) = poll
                    .registry()
                    .register(&mut stream, token, Interest::READABLE)
                {
                    error!(peer = %peer, error = %e, "failed to register client socket");
                    active.fetch_sub(1, Ordering::Relaxed);
                    continue;
                }
                pending.insert(token, stream);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) if is_fd_exhaustion(&e) => {
                warn!(error = %e, "file descriptor limit reached");
                break;
            }
            Err(e) => {
                error!(error = %e, "accept failed");
                break;
            }
        }
    }
}

fn is_fd_exhaustion(e: &io::Error) -> bool {
    matches!(e.raw_os_error(), Some(libc::EMFILE) | Some(libc::ENFILE))
}

/// Convert a polled non-blocking stream into the blocking stream with
/// a receive timeout that the worker loop reads from.
fn into_blocking(stream: TcpStream) -> io::Result<std::net::TcpStream> {
    let stream = unsafe { std::net::TcpStream::from_raw_fd(stream.into_raw_fd()) };
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(RECV_TIMEOUT))?;
    Ok(stream)
}
