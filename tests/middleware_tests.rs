use std::sync::{Arc, Mutex};

use http::Method;
use trellis::router::dispatch_request;
use trellis::{Handler, Next, Request, Response, Router};

type Log = Arc<Mutex<Vec<&'static str>>>;

struct Trace {
    label: &'static str,
    log: Log,
    forward: bool,
}

impl Handler for Trace {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        self.log.lock().unwrap().push(self.label);
        if self.forward {
            next.run(req, res);
        }
    }
}

fn trace(label: &'static str, log: &Log, forward: bool) -> Arc<dyn Handler> {
    Arc::new(Trace {
        label,
        log: log.clone(),
        forward,
    })
}

/// Rejects requests without the expected token, in the shape an auth
/// middleware takes.
struct RequireToken {
    token: &'static str,
}

impl Handler for RequireToken {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        match req.header("Authorization") {
            Some(value) if value == self.token => next.run(req, res),
            _ => {
                res.set_status(401);
                res.set_body("{\"error\":\"Unauthorized\"}");
            }
        }
    }
}

fn request(method: Method, path: &str) -> Request {
    Request {
        method,
        path: path.to_string(),
        version: "HTTP/1.1".to_string(),
        ..Request::default()
    }
}

fn done(_req: &mut Request, res: &mut Response, _next: Next) {
    res.set_body("done");
}

#[test]
fn test_route_middlewares_run_in_registration_order() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut router = Router::new();
    router
        .get("/x")
        .with_arc(trace("m1", &log, true))
        .with_arc(trace("m2", &log, true))
        .then_arc(trace("h", &log, false));

    let mut req = request(Method::GET, "/x");
    dispatch_request(&router, &mut req);
    assert_eq!(*log.lock().unwrap(), vec!["m1", "m2", "h"]);
}

#[test]
fn test_aborting_middleware_stops_the_chain() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut router = Router::new();
    router
        .get("/x")
        .with_arc(trace("gate", &log, false))
        .then_arc(trace("h", &log, false));

    let mut req = request(Method::GET, "/x");
    dispatch_request(&router, &mut req);
    assert_eq!(*log.lock().unwrap(), vec!["gate"]);
}

#[test]
fn test_auth_middleware_shapes_response_on_abort() {
    let mut router = Router::new();
    router
        .get("/secure")
        .with(RequireToken { token: "tok-1" })
        .then(done);

    let mut req = request(Method::GET, "/secure");
    let res = dispatch_request(&router, &mut req);
    assert_eq!(res.status, 401);
    assert_eq!(res.body, b"{\"error\":\"Unauthorized\"}");

    let mut req = request(Method::GET, "/secure");
    req.headers.insert("Authorization".into(), "tok-1".into());
    let res = dispatch_request(&router, &mut req);
    assert_eq!(res.status, 200);
    assert_eq!(res.body, b"done");
}

#[test]
fn test_group_middleware_runs_before_group_routes() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut router = Router::new();
    let h = trace("h", &log, false);
    router
        .group("/v1")
        .with_arc(trace("group-mw", &log, true))
        .then(move |v1| {
            v1.get("/u").then_arc(h);
        });

    let mut req = request(Method::GET, "/v1/u");
    dispatch_request(&router, &mut req);
    assert_eq!(*log.lock().unwrap(), vec!["group-mw", "h"]);
}

#[test]
fn test_group_middleware_skipped_outside_prefix() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut router = Router::new();
    router
        .group("/v1")
        .with_arc(trace("group-mw", &log, true))
        .then(|v1| {
            v1.get("/u").then(done);
        });
    router.get("/plain").then(done);

    let mut req = request(Method::GET, "/plain");
    let res = dispatch_request(&router, &mut req);
    assert_eq!(res.status, 200);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_mounted_middleware_declining_falls_through_to_routes() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut router = Router::new();
    router.mount("/area", trace("mw", &log, true));
    router.get("/area/page").then(done);

    let mut req = request(Method::GET, "/area/page");
    let res = dispatch_request(&router, &mut req);
    assert_eq!(*log.lock().unwrap(), vec!["mw"]);
    assert_eq!(res.status, 200);
    assert_eq!(res.body, b"done");
    // The continuation restored the full path before the trie lookup.
    assert_eq!(req.path, "/area/page");
}

#[test]
fn test_mount_order_is_insertion_order() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut router = Router::new();
    router.mount("/a", trace("first", &log, true));
    router.mount("/a", trace("second", &log, false));

    let mut req = request(Method::GET, "/a/x");
    dispatch_request(&router, &mut req);
    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}
