//! # Server Configuration Module
//!
//! Runtime settings for the acceptor, worker pool and cluster,
//! loaded from environment variables.
//!
//! Configuration *files* are an external concern: whatever loads them
//! only has to produce the named values below. This module carries
//! the defaults and the environment override path used by the demo
//! binary and the tests.
//!
//! ## Environment Variables
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `TRELLIS_PORT` | TCP port to bind | `8080` |
//! | `TRELLIS_ACCEPT_QUEUE_SIZE` | `listen()` backlog | `65535` |
//! | `TRELLIS_MAX_CONNECTIONS` | active-connection cap per worker process | `500000` |
//! | `TRELLIS_MAX_EVENTS` | readiness batch size per poll | `8192` |
//! | `TRELLIS_BUFFER_SIZE` | receive buffer capacity in bytes | `4096` |
//! | `TRELLIS_THREAD_POOL_SIZE` | request-handling threads per process | `100` |
//! | `TRELLIS_CLUSTER_WORKERS` | worker processes (`0` means 4) | `0` |
//!
//! Size-like values accept decimal (`65536`) or hexadecimal
//! (`0x10000`) notation.

use std::env;

/// Settings for one server instance.
///
/// `Default` carries the values the server has always shipped with;
/// [`ServerConfig::from_env`] starts from those and applies any
/// `TRELLIS_*` overrides.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port the listeners bind to.
    pub port: u16,
    /// Backlog passed to `listen()`.
    pub accept_queue_size: i32,
    /// Active-connection cap for this worker process.
    pub max_connections: usize,
    /// Maximum readiness events drained per poll.
    pub max_events: usize,
    /// Capacity of the per-connection receive buffer.
    pub buffer_size: usize,
    /// Number of request-handling threads per worker process.
    pub thread_pool_size: usize,
    /// Number of worker processes forked by the master; `0` selects
    /// the default of 4.
    pub cluster_workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            accept_queue_size: 65535,
            max_connections: 500_000,
            max_events: 8192,
            buffer_size: 4096,
            thread_pool_size: 100,
            cluster_workers: 0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment on top of the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_value("TRELLIS_PORT").unwrap_or(defaults.port as usize) as u16,
            accept_queue_size: env_value("TRELLIS_ACCEPT_QUEUE_SIZE")
                .unwrap_or(defaults.accept_queue_size as usize) as i32,
            max_connections: env_value("TRELLIS_MAX_CONNECTIONS")
                .unwrap_or(defaults.max_connections),
            max_events: env_value("TRELLIS_MAX_EVENTS").unwrap_or(defaults.max_events),
            buffer_size: env_value("TRELLIS_BUFFER_SIZE").unwrap_or(defaults.buffer_size),
            thread_pool_size: env_value("TRELLIS_THREAD_POOL_SIZE")
                .unwrap_or(defaults.thread_pool_size),
            cluster_workers: env_value("TRELLIS_CLUSTER_WORKERS")
                .unwrap_or(defaults.cluster_workers),
        }
    }

    /// Number of worker processes the master should run.
    pub fn worker_processes(&self) -> usize {
        if self.cluster_workers == 0 {
            4
        } else {
            self.cluster_workers
        }
    }
}

/// Read a numeric environment variable, accepting decimal or `0x` hex.
fn env_value(name: &str) -> Option<usize> {
    let raw = env::var(name).ok()?;
    parse_size(&raw)
}

fn parse_size(raw: &str) -> Option<usize> {
    if let Some(hex) = raw.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        raw.parse().ok()
    }
}
