//! Router: a radix trie plus an ordered list of mount points.
//!
//! A router is itself a [`Handler`], which is what makes composition
//! work: mounting a router under a prefix on another router nests
//! them, and the worker simply invokes the root router as the first
//! middleware of every request.

use std::sync::Arc;

use http::Method;
use tracing::{debug, warn};

use crate::http::{Request, Response};
use crate::middleware::{run_chain, Handler, Next};
use crate::router::builder::{GroupBuilder, RouteBuilder};
use crate::router::radix::{RadixNode, RouteHit};

pub struct Router {
    root: RadixNode,
    /// Ordered `(prefix, handler)` mount points, walked before the
    /// trie on every request.
    mounts: Vec<(String, Arc<dyn Handler>)>,
    /// Prefix this router was mounted under, when nested via
    /// [`Router::group`]. Joined in front of the rewritten path on
    /// the first dispatch attempt.
    base_path: String,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            root: RadixNode::new(),
            mounts: Vec::new(),
            base_path: String::new(),
        }
    }

    pub(crate) fn with_base(prefix: &str) -> Self {
        let mut router = Self::new();
        router.base_path = prefix.to_string();
        router
    }

    /// Register a mount point. Mounts are consulted in insertion
    /// order, before this router's own routes.
    pub fn mount(&mut self, prefix: &str, handler: Arc<dyn Handler>) {
        self.mounts.push((prefix.to_string(), handler));
    }

    /// Register a handler with its route middlewares. The trie
    /// appends on re-registration, so a second handler on the same
    /// method and path joins the leaf's chain rather than replacing
    /// it.
    pub fn insert(
        &mut self,
        method: Method,
        path: &str,
        middlewares: Vec<Arc<dyn Handler>>,
        handler: Arc<dyn Handler>,
    ) {
        debug!(method = %method, path = %path, middlewares = middlewares.len(), "route registered");
        self.root.insert(&method, path, middlewares, handler);
    }

    /// Start a route registration for an arbitrary method.
    pub fn route(&mut self, method: Method, path: &str) -> RouteBuilder<'_> {
        RouteBuilder::new(self, method, path)
    }

    pub fn get(&mut self, path: &str) -> RouteBuilder<'_> {
        self.route(Method::GET, path)
    }

    pub fn post(&mut self, path: &str) -> RouteBuilder<'_> {
        self.route(Method::POST, path)
    }

    pub fn put(&mut self, path: &str) -> RouteBuilder<'_> {
        self.route(Method::PUT, path)
    }

    pub fn delete(&mut self, path: &str) -> RouteBuilder<'_> {
        self.route(Method::DELETE, path)
    }

    /// Start a nested router under `prefix`.
    pub fn group(&mut self, prefix: &str) -> GroupBuilder<'_> {
        GroupBuilder::new(self, prefix)
    }

    /// Raw trie lookup; mounts are not consulted.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteHit<'_>> {
        self.root.find(method, path)
    }

    /// Dispatch against this router's own routes.
    ///
    /// Tries the request path joined with the mount prefix first,
    /// then the `/*` catch-all, then (for mounted routers) the
    /// unprefixed path, which lets a nested router resolve routes it
    /// registered under the bare remainder. A full miss reports
    /// `false` so the caller can offer the request to its own
    /// continuation; only the terminal continuation writes the 404.
    pub fn dispatch(&self, req: &mut Request, res: &mut Response) -> bool {
        let lookup = if self.base_path.is_empty() {
            req.path.clone()
        } else {
            join_paths(&self.base_path, &req.path)
        };
        if self.try_dispatch(&lookup, req, res) {
            return true;
        }
        if self.try_dispatch("/*", req, res) {
            return true;
        }
        if !self.base_path.is_empty() {
            let bare = req.path.clone();
            if self.try_dispatch(&bare, req, res) {
                return true;
            }
        }
        warn!(method = %req.method, path = %req.path, "no route matched");
        false
    }

    fn try_dispatch(&self, lookup_path: &str, req: &mut Request, res: &mut Response) -> bool {
        let Some(hit) = self.root.find(&req.method, lookup_path) else {
            return false;
        };
        let RouteHit {
            handlers,
            middlewares,
            params,
        } = hit;
        debug!(
            method = %req.method,
            path = %req.path,
            params = ?params,
            "route matched"
        );
        for (name, value) in params {
            req.params.insert(name, value);
        }
        run_chain(middlewares, handlers, req, res, Next::empty());
        true
    }

    /// Mount-point traversal: offer the request to each matching
    /// mount, rewriting the path to the remainder for the mounted
    /// handler and restoring it when that handler declines.
    fn handle_from(&self, index: usize, req: &mut Request, res: &mut Response, next: Next<'_>) {
        for i in index..self.mounts.len() {
            let (prefix, handler) = &self.mounts[i];
            let Some(remainder) = match_prefix(&req.path, prefix) else {
                continue;
            };
            let original = std::mem::replace(&mut req.path, remainder);
            let resume = Next::new(move |req: &mut Request, res: &mut Response| {
                req.path = original;
                self.handle_from(i + 1, req, res, next);
            });
            handler.handle(req, res, resume);
            return;
        }
        if !self.dispatch(req, res) {
            next.run(req, res);
        }
    }
}

impl Handler for Router {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        self.handle_from(0, req, res, next);
    }
}

/// Prefix match for mount points: the path must equal the prefix or
/// continue it at a segment boundary. Returns the remainder, which is
/// at least `/`.
fn match_prefix(path: &str, prefix: &str) -> Option<String> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/".to_string())
    } else if rest.starts_with('/') {
        Some(rest.to_string())
    } else {
        None
    }
}

fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path == "/" {
        base.to_string()
    } else {
        format!("{base}{path}")
    }
}

/// The continuation that terminates every traversal: it runs only
/// when all mounts and every dispatch attempt have declined, so a
/// route miss becomes a 404 without shadowing matches found later in
/// the walk. A registered `/*` route wins over this default.
pub(crate) fn terminal_not_found(_req: &mut Request, res: &mut Response) {
    res.set_status(404);
}

/// Convenience used in tests and embedding code: run a request
/// through a router the way the worker does.
pub fn dispatch_request(router: &Router, req: &mut Request) -> Response {
    let mut res = Response::new();
    router.handle(req, &mut res, Next::new(terminal_not_found));
    res
}
