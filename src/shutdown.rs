//! Process-wide shutdown flag and signal wiring.
//!
//! `SIGINT` and `SIGTERM` set a single atomic flag. Acceptors check
//! it between readiness waits, workers between requests, the hand-off
//! queue gates its timed wait on it, and the cluster master polls it
//! before tearing workers down. The flag lives for the whole process;
//! teardown happens when the accept and worker threads have joined.

use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn on_terminate(_signum: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

extern "C" fn on_child(_signum: libc::c_int) {
    // Reap any exited children so the master never accumulates zombies.
    unsafe {
        while libc::waitpid(-1, ptr::null_mut(), libc::WNOHANG) > 0 {}
    }
}

/// Install the `SIGINT`/`SIGTERM` handlers that request shutdown.
pub fn install_handlers() {
    let handler = on_terminate as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
    }
}

/// Install the `SIGCHLD` reaper; only the cluster master needs this.
pub fn install_child_reaper() {
    let handler = on_child as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGCHLD, handler as libc::sighandler_t);
    }
}

/// Whether shutdown has been requested.
pub fn requested() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

/// Request shutdown programmatically, as the signal handlers would.
pub fn trigger() {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// Clear the flag again. Test support; a real process never unsets it.
pub fn reset() {
    SHUTDOWN.store(false, Ordering::SeqCst);
}
