//! Radix tree for route matching.
//!
//! Paths are tokenised on `/` into non-empty segments and stored one
//! node per segment. A node is a literal, a parameter (`:name`) or
//! the wildcard `*`; every node has at most one parameter child and
//! at most one wildcard child, and its literal children are disjoint.
//! Lookup tries a literal child first, falls back to the parameter
//! child (recording the matched segment under the parameter name),
//! then to the wildcard, which consumes the remainder of the path.
//!
//! Leaves keep handler and middleware lists per HTTP method.
//! Registering the same method and path again appends; nothing is
//! ever deleted while the server is accepting.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use crate::middleware::Handler;

type HandlerList = Vec<Arc<dyn Handler>>;

const NO_MIDDLEWARES: &[Arc<dyn Handler>] = &[];

/// A successful lookup: the leaf's lists plus the path parameters
/// bound along the way.
pub struct RouteHit<'a> {
    pub handlers: &'a [Arc<dyn Handler>],
    pub middlewares: &'a [Arc<dyn Handler>],
    pub params: HashMap<String, String>,
}

pub(crate) struct RadixNode {
    segment: String,
    /// Parameter name when this node matches any single segment.
    param_name: Option<String>,
    children: Vec<RadixNode>,
    param_child: Option<Box<RadixNode>>,
    wildcard_child: Option<Box<RadixNode>>,
    handlers: HashMap<Method, HandlerList>,
    middlewares: HashMap<Method, HandlerList>,
}

impl RadixNode {
    pub fn new() -> Self {
        Self::with_segment(String::new())
    }

    fn with_segment(segment: String) -> Self {
        Self {
            segment,
            param_name: None,
            children: Vec::new(),
            param_child: None,
            wildcard_child: None,
            handlers: HashMap::new(),
            middlewares: HashMap::new(),
        }
    }

    fn new_param(name: String) -> Self {
        let mut node = Self::with_segment(String::new());
        node.param_name = Some(name);
        node
    }

    /// Register a handler (and its route middlewares) under a path
    /// pattern. Appends when the leaf already has entries for the
    /// method.
    pub fn insert(
        &mut self,
        method: &Method,
        path: &str,
        middlewares: Vec<Arc<dyn Handler>>,
        handler: Arc<dyn Handler>,
    ) {
        let segments = split(path);
        self.insert_segments(&segments, method, middlewares, handler);
    }

    fn insert_segments(
        &mut self,
        segments: &[&str],
        method: &Method,
        middlewares: Vec<Arc<dyn Handler>>,
        handler: Arc<dyn Handler>,
    ) {
        let Some((&segment, rest)) = segments.split_first() else {
            self.handlers.entry(method.clone()).or_default().push(handler);
            self.middlewares
                .entry(method.clone())
                .or_default()
                .extend(middlewares);
            return;
        };

        if segment == "*" {
            let node = self
                .wildcard_child
                .get_or_insert_with(|| Box::new(RadixNode::with_segment("*".to_string())));
            node.insert_segments(rest, method, middlewares, handler);
        } else if let Some(name) = segment.strip_prefix(':') {
            // Patterns differing only in the parameter name share the
            // child; the first registration names the binding.
            let node = self
                .param_child
                .get_or_insert_with(|| Box::new(RadixNode::new_param(name.to_string())));
            node.insert_segments(rest, method, middlewares, handler);
        } else {
            if let Some(child) = self.children.iter_mut().find(|c| c.segment == segment) {
                child.insert_segments(rest, method, middlewares, handler);
                return;
            }
            let mut child = RadixNode::with_segment(segment.to_string());
            child.insert_segments(rest, method, middlewares, handler);
            self.children.push(child);
        }
    }

    /// Look up a concrete path. Returns the leaf lists only when the
    /// method has at least one registered handler there.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteHit<'_>> {
        let segments = split(path);
        let mut params = HashMap::new();
        let node = self.search(&segments, method, &mut params)?;
        let handlers = node.handlers.get(method)?;
        Some(RouteHit {
            handlers,
            middlewares: node
                .middlewares
                .get(method)
                .map(Vec::as_slice)
                .unwrap_or(NO_MIDDLEWARES),
            params,
        })
    }

    fn search<'a>(
        &'a self,
        segments: &[&str],
        method: &Method,
        params: &mut HashMap<String, String>,
    ) -> Option<&'a RadixNode> {
        let Some((&segment, rest)) = segments.split_first() else {
            return self
                .handlers
                .get(method)
                .filter(|h| !h.is_empty())
                .map(|_| self);
        };

        for child in &self.children {
            if child.segment == segment {
                if let Some(hit) = child.search(rest, method, params) {
                    return Some(hit);
                }
            }
        }

        if let Some(param_child) = &self.param_child {
            if let Some(name) = &param_child.param_name {
                params.insert(name.clone(), segment.to_string());
                if let Some(hit) = param_child.search(rest, method, params) {
                    return Some(hit);
                }
                params.remove(name);
            }
        }

        if let Some(wildcard) = &self.wildcard_child {
            if wildcard.handlers.get(method).is_some_and(|h| !h.is_empty()) {
                return Some(wildcard);
            }
        }

        None
    }
}

fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
