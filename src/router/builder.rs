//! Registration sugar: route builders and group builders.
//!
//! `router.get("/u/:id").with(auth).then(show_user)` accumulates the
//! route middlewares and performs a single trie insertion on `then`.
//! `router.group("/v1")` builds a nested router mounted under the
//! prefix, with any group middlewares mounted ahead of it.

use std::sync::Arc;

use http::Method;

use crate::middleware::Handler;
use crate::router::Router;

/// Builder returned by `Router::route` and the method shorthands.
pub struct RouteBuilder<'r> {
    router: &'r mut Router,
    method: Method,
    path: String,
    middlewares: Vec<Arc<dyn Handler>>,
}

impl<'r> RouteBuilder<'r> {
    pub(crate) fn new(router: &'r mut Router, method: Method, path: &str) -> Self {
        Self {
            router,
            method,
            path: path.to_string(),
            middlewares: Vec::new(),
        }
    }

    /// Add a route middleware; runs before the handler in
    /// registration order.
    pub fn with(mut self, middleware: impl Handler + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Add an already-shared middleware.
    pub fn with_arc(mut self, middleware: Arc<dyn Handler>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Finish the registration. Calling `then` again for the same
    /// method and path appends another handler to the leaf, which
    /// then runs as a chain; the usual setup is one handler per route
    /// with shared logic in middlewares.
    pub fn then(self, handler: impl Handler + 'static) {
        self.then_arc(Arc::new(handler));
    }

    pub fn then_arc(self, handler: Arc<dyn Handler>) {
        self.router
            .insert(self.method, &self.path, self.middlewares, handler);
    }
}

/// Builder returned by `Router::group`.
pub struct GroupBuilder<'r> {
    router: &'r mut Router,
    prefix: String,
    middlewares: Vec<Arc<dyn Handler>>,
}

impl<'r> GroupBuilder<'r> {
    pub(crate) fn new(router: &'r mut Router, prefix: &str) -> Self {
        Self {
            router,
            prefix: prefix.to_string(),
            middlewares: Vec::new(),
        }
    }

    /// Add a middleware that runs for every request entering the
    /// group.
    pub fn with(mut self, middleware: impl Handler + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn with_arc(mut self, middleware: Arc<dyn Handler>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Build the group: the closure registers routes on a fresh
    /// nested router, which is then mounted at the prefix behind the
    /// group middlewares.
    pub fn then(self, build: impl FnOnce(&mut Router)) {
        let GroupBuilder {
            router,
            prefix,
            middlewares,
        } = self;
        let mut nested = Router::with_base(&prefix);
        build(&mut nested);
        for middleware in middlewares {
            router.mount(&prefix, middleware);
        }
        router.mount(&prefix, Arc::new(nested));
    }
}
