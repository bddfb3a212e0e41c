//! Outgoing response construction and serialisation.

use std::sync::Arc;

use tracing::error;

use crate::http::cookie::{self, CookieOptions};
use crate::render::RenderEngine;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Infer a `Content-Type` from the leading body bytes: JSON when the
/// first non-whitespace byte opens an object or array, HTML when the
/// body carries an `<html` or doctype marker, plain text otherwise.
fn detect_content_type(body: &[u8]) -> &'static str {
    let Some(&first) = body.iter().find(|&&b| !b" \t\r\n".contains(&b)) else {
        return "text/plain";
    };
    if first == b'{' || first == b'[' {
        return "application/json";
    }
    if super::body::find(body, b"<html").is_some()
        || super::body::find(body, b"<!DOCTYPE html").is_some()
    {
        return "text/html";
    }
    "text/plain"
}

/// A response under construction, owned by the worker thread for one
/// request/response exchange. Serialised exactly once per request via
/// [`Response::to_bytes`].
pub struct Response {
    pub status: u16,
    pub reason: String,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    pub body: Vec<u8>,
    keep_alive: bool,
    engine: Option<Arc<dyn RenderEngine>>,
    view_dir: String,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: 200,
            reason: status_reason(200).to_string(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: Vec::new(),
            keep_alive: true,
            engine: None,
            view_dir: "./views".to_string(),
        }
    }

    pub(crate) fn with_engine(engine: Option<Arc<dyn RenderEngine>>, view_dir: &str) -> Self {
        let mut response = Self::new();
        response.engine = engine;
        response.view_dir = view_dir.to_string();
        response
    }

    /// The canned reply the worker sends for requests it cannot parse.
    pub(crate) fn bad_request() -> Self {
        let mut response = Self::new();
        response.set_status(400);
        response.keep_alive = false;
        response
    }

    /// Set the status code; the reason phrase follows the fixed table.
    pub fn set_status(&mut self, status: u16) {
        self.status = status;
        self.reason = status_reason(status).to_string();
    }

    /// Set or replace a header. Name comparison is case-insensitive,
    /// the stored spelling is the caller's.
    pub fn set_header(&mut self, name: &str, value: &str) {
        if let Some(existing) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            existing.1 = value.to_string();
        } else {
            self.headers.push((name.to_string(), value.to_string()));
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    pub fn append_body(&mut self, chunk: impl AsRef<[u8]>) {
        self.body.extend_from_slice(chunk.as_ref());
    }

    /// Queue a `Set-Cookie` for this response. Setting the same name
    /// again replaces the pending cookie.
    pub fn set_cookie(&mut self, name: &str, value: &str, opts: &CookieOptions) {
        let serialized = cookie::serialize(value, opts);
        if let Some(existing) = self.cookies.iter_mut().find(|(n, _)| n == name) {
            existing.1 = serialized;
        } else {
            self.cookies.push((name.to_string(), serialized));
        }
    }

    /// Queue a tamper-evident cookie: the value is extended with an
    /// HMAC-SHA256 tag that `Request::signed_cookie` verifies.
    pub fn set_signed_cookie(
        &mut self,
        name: &str,
        value: &str,
        secret: &str,
        opts: &CookieOptions,
    ) {
        let signed = cookie::sign(value, secret);
        self.set_cookie(name, &signed, opts);
    }

    /// 301 redirect; clears any body set so far.
    pub fn moved_redirect(&mut self, location: &str) {
        self.body.clear();
        self.set_status(301);
        self.set_header("Location", location);
    }

    /// 302 redirect; clears any body set so far.
    pub fn temporary_redirect(&mut self, location: &str) {
        self.body.clear();
        self.set_status(302);
        self.set_header("Location", location);
    }

    /// Render a template through the attached engine into the body.
    /// Without an engine this degrades to a 500.
    pub fn render(&mut self, view: &str, context: &serde_json::Value) {
        let Some(engine) = self.engine.clone() else {
            error!(view = %view, "render requested without an engine attached");
            self.set_status(500);
            return;
        };
        let path = format!("{}/{}", self.view_dir.trim_end_matches('/'), view);
        match engine.render(&path, context) {
            Ok(rendered) => {
                self.set_header("Content-Type", "text/html; charset=UTF-8");
                self.body = rendered.into_bytes();
            }
            Err(e) => {
                error!(view = %view, error = %e, "template rendering failed");
                self.set_status(500);
            }
        }
    }

    /// Serve a file from disk into this response.
    pub fn send_file(&mut self, path: &str) {
        crate::static_files::send_file(path, self);
    }

    pub(crate) fn set_close(&mut self) {
        self.keep_alive = false;
    }

    /// Serialise the full response. `Content-Length` and `Connection`
    /// are always emitted by the builder itself, so caller-set copies
    /// of either are ignored.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.body.len());
        out.extend_from_slice(format!("HTTP/1.1 {} {}\r\n", self.status, self.reason).as_bytes());

        if self.header("Content-Type").is_none() {
            out.extend_from_slice(
                format!("Content-Type: {}\r\n", detect_content_type(&self.body)).as_bytes(),
            );
        }
        for (name, value) in &self.cookies {
            out.extend_from_slice(format!("Set-Cookie: {name}={value}\r\n").as_bytes());
        }
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("connection")
            {
                continue;
            }
            out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        out.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        let connection = if self.keep_alive { "keep-alive" } else { "close" };
        out.extend_from_slice(format!("Connection: {connection}\r\n\r\n").as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}
