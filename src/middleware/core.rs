//! The continuation model that drives both router traversal and
//! per-route execution.
//!
//! Everything that can see a request (middlewares, route handlers,
//! routers, the static file handler) implements the one [`Handler`]
//! trait. The [`Next`] argument is the rest of the pipeline: calling
//! `next.run(req, res)` hands control onward, not calling it ends the
//! chain with whatever is already on the response. There is no
//! implicit error surfacing; a handler that aborts is responsible for
//! leaving the response complete.
//!
//! Execution is synchronous on the worker thread that owns the
//! connection; nothing here suspends.

use std::sync::Arc;

use crate::http::{Request, Response};

/// A request processor in the middleware chain.
pub trait Handler: Send + Sync {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>);
}

/// Plain functions and closures with the right shape are handlers.
impl<F> Handler for F
where
    F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync,
{
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        self(req, res, next)
    }
}

/// Wrap a function as a shared handler.
pub fn from_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The continuation a handler receives. One-shot: running it consumes
/// it, and a dropped `Next` simply ends the chain.
pub struct Next<'a> {
    inner: Option<Box<dyn FnOnce(&mut Request, &mut Response) + 'a>>,
}

impl<'a> Next<'a> {
    pub fn new(f: impl FnOnce(&mut Request, &mut Response) + 'a) -> Self {
        Self {
            inner: Some(Box::new(f)),
        }
    }

    /// The do-nothing continuation the worker passes to the root
    /// router.
    pub fn empty() -> Next<'static> {
        Next { inner: None }
    }

    /// Advance the chain.
    pub fn run(self, req: &mut Request, res: &mut Response) {
        if let Some(f) = self.inner {
            f(req, res);
        }
    }
}

const NO_HANDLERS: &[Arc<dyn Handler>] = &[];

/// Run a leaf's middleware list, then its handler list, then `tail`.
///
/// Each middleware sees a `Next` that advances to the following
/// middleware, the first handler once the middlewares are exhausted,
/// then each further handler in turn; `tail` runs only if the last
/// handler forwards.
pub(crate) fn run_chain<'a>(
    middlewares: &'a [Arc<dyn Handler>],
    handlers: &'a [Arc<dyn Handler>],
    req: &mut Request,
    res: &mut Response,
    tail: Next<'a>,
) {
    advance(middlewares, handlers, tail).run(req, res);
}

fn advance<'a>(
    middlewares: &'a [Arc<dyn Handler>],
    handlers: &'a [Arc<dyn Handler>],
    tail: Next<'a>,
) -> Next<'a> {
    Next::new(move |req, res| {
        if let Some((first, rest)) = middlewares.split_first() {
            first.handle(req, res, advance(rest, handlers, tail));
        } else if let Some((first, rest)) = handlers.split_first() {
            first.handle(req, res, advance(NO_HANDLERS, rest, tail));
        } else {
            tail.run(req, res);
        }
    })
}
