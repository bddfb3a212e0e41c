use std::sync::Arc;

use anyhow::Result;
use trellis::{Next, Request, Response, Server, ServerConfig, StaticFiles};

fn index(_req: &mut Request, res: &mut Response, _next: Next) {
    res.set_body("trellis is running\n");
}

fn show_user(req: &mut Request, res: &mut Response, _next: Next) {
    let id = req.param("id").unwrap_or("unknown");
    res.set_body(format!("{{\"user\":\"{id}\"}}"));
}

fn echo(req: &mut Request, res: &mut Response, _next: Next) {
    match &req.json_body {
        Some(body) => res.set_body(body.to_string()),
        None => res.set_status(400),
    }
}

fn request_log(req: &mut Request, res: &mut Response, next: Next) {
    tracing::info!(method = %req.method, path = %req.path, "incoming request");
    next.run(req, res);
}

fn main() -> Result<()> {
    telemetry_init()?;
    let config = ServerConfig::from_env();
    let mut server = Server::new(config);

    server.get("/").then(index);
    server.get("/u/:id").with(request_log).then(show_user);
    server.post("/echo").then(echo);
    server.group("/v1").then(|v1| {
        v1.get("/u/:id").then(show_user);
    });
    server.mount("/assets", Arc::new(StaticFiles::new("./public")));

    server.start_cluster()?;
    Ok(())
}

fn telemetry_init() -> Result<()> {
    let level = std::env::var("TRELLIS_LOG").unwrap_or_else(|_| "info".to_string());
    trellis::telemetry::init_logging(&level)
}
