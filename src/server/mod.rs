//! # Server Module
//!
//! The connection pipeline: acceptance, hand-off, and the worker
//! loop that runs the full HTTP conversation.
//!
//! ## Architecture
//!
//! ```text
//! master process
//!   └─ worker process × N      (SO_REUSEPORT shares the port)
//!        ├─ acceptor thread × 4  (readiness loop, non-blocking accept)
//!        │     └─ hand-off queue (mutex + condvar, 100 ms waits)
//!        └─ worker thread × pool (keep-alive loop: read → parse →
//!                                 dispatch → write)
//! ```
//!
//! Request dispatch happens entirely on the worker thread that owns
//! the connection; handlers are synchronous and nothing in the
//! pipeline suspends. The route trie is frozen before accept starts
//! and read lock-free by every thread.

mod acceptor;
pub mod cluster;
mod queue;
#[allow(clippy::module_inception)]
mod server;
mod worker;

pub use queue::HandoffQueue;
pub use server::Server;
