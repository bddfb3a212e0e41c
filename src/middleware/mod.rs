//! # Middleware Module
//!
//! The continuation-style execution model shared by route handlers,
//! middlewares and routers. A middleware is any [`Handler`] mounted
//! ahead of another handler; it receives the request, the response
//! under construction, and a [`Next`] continuation. Calling the
//! continuation advances the chain, dropping it stops the request
//! where it is.

mod core;

pub(crate) use self::core::run_chain;
pub use self::core::{from_fn, Handler, Next};
