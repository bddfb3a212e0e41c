//! # Router Module
//!
//! Path matching and route resolution.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Storing routes in a per-segment radix trie with literal,
//!   parameter (`:name`) and wildcard (`*`) segments
//! - Matching incoming requests and extracting path parameters
//! - Walking mount points so routers nest under path prefixes
//! - Driving the per-route middleware chain once a leaf matches
//!
//! ## Matching order
//!
//! At every trie level a literal child wins over the parameter child,
//! which wins over the wildcard; the wildcard consumes the rest of
//! the path. Matching backtracks, so a literal branch that cannot
//! finish the path does not shadow a parameter branch that can.
//!
//! Routes are installed at startup and immutable while the server
//! accepts, which is what lets every worker thread read the trie
//! without synchronisation.

mod builder;
mod radix;
#[allow(clippy::module_inception)]
mod router;

pub use builder::{GroupBuilder, RouteBuilder};
pub use radix::RouteHit;
pub(crate) use router::terminal_not_found;
pub use router::{dispatch_request, Router};
