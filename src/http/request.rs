//! Incoming request representation and decoding.
//!
//! The worker accumulates connection bytes and uses the framing
//! helpers here ([`find_header_end`], [`content_length`]) to decide
//! when a full request is buffered; [`Request::parse`] then decodes
//! the complete request in one pass. Handlers see the result
//! read-only except for `params`, which the router fills during
//! dispatch.

use std::collections::HashMap;

use http::Method;

use crate::error::ProtocolError;
use crate::http::body::{self, FormField};
use crate::http::cookie;

/// Header storage: case-preserving on insert, case-insensitive on
/// lookup. A repeated header name keeps the last value.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, value: String) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            existing.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A fully decoded HTTP/1.1 request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Request method, stored as received.
    pub method: Method,
    /// Target path with the query string stripped; never contains `?`.
    pub path: String,
    /// Protocol token, e.g. `HTTP/1.1`.
    pub version: String,
    pub headers: Headers,
    /// Query-string pairs; values are stored undecoded, a bare key
    /// maps to the empty string.
    pub query: HashMap<String, String>,
    /// Route parameters. Filled by the router during dispatch (and by
    /// urlencoded bodies, whose decoded pairs land here).
    pub params: HashMap<String, String>,
    /// Fields decoded from a `multipart/form-data` body.
    pub form_data: HashMap<String, FormField>,
    /// Parsed value of an `application/json` body, when parsing
    /// succeeded.
    pub json_body: Option<serde_json::Value>,
    /// Cookies from the `Cookie` header; names are case-sensitive.
    pub cookies: HashMap<String, String>,
    /// Raw body bytes for content types no body parser claims.
    pub body: Vec<u8>,
}

/// Locate the `\r\n\r\n` header terminator in a connection buffer.
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    body::find(buf, b"\r\n\r\n")
}

/// Read the `Content-Length` value out of a raw header block.
/// A missing header means a zero-length body.
pub fn content_length(head: &[u8]) -> Result<usize, ProtocolError> {
    let head = String::from_utf8_lossy(head);
    let mut length = 0;
    for line in head.split("\r\n").skip(1) {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                length = value
                    .trim()
                    .parse()
                    .map_err(|_| ProtocolError::invalid_content_length(value.trim()))?;
            }
        }
    }
    Ok(length)
}

impl Request {
    /// Decode one complete request (header block plus exactly
    /// `Content-Length` body bytes).
    pub fn parse(raw: &[u8]) -> Result<Self, ProtocolError> {
        let header_end = find_header_end(raw).ok_or(ProtocolError::BadRequestLine)?;
        let head = String::from_utf8_lossy(&raw[..header_end]).into_owned();
        let payload = &raw[header_end + 4..];

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ProtocolError::BadRequestLine)?;
        let mut tokens = request_line.split_whitespace();
        let method = tokens.next().ok_or(ProtocolError::BadRequestLine)?;
        let target = tokens.next().ok_or(ProtocolError::BadRequestLine)?;
        let version = tokens.next().ok_or(ProtocolError::BadRequestLine)?;

        let method =
            Method::from_bytes(method.as_bytes()).map_err(|_| ProtocolError::BadRequestLine)?;

        let mut request = Request {
            method,
            version: version.to_string(),
            ..Request::default()
        };

        let (path, raw_query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        request.path = path.to_string();
        if let Some(raw_query) = raw_query {
            parse_query(raw_query, &mut request.query);
        }

        for line in lines {
            if line.is_empty() {
                break;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            request
                .headers
                .insert(name.to_string(), value.trim().to_string());
        }

        if let Some(cookie_header) = request.headers.get("Cookie") {
            request.cookies = parse_cookies(cookie_header);
        }

        request.decode_body(payload)?;
        Ok(request)
    }

    /// Pick a body parser by `Content-Type` substring; the first match
    /// wins, and unclaimed bodies are retained as raw bytes.
    fn decode_body(&mut self, payload: &[u8]) -> Result<(), ProtocolError> {
        if payload.is_empty() {
            return Ok(());
        }
        let content_type = self.headers.get("Content-Type").unwrap_or("").to_string();
        if content_type.contains("multipart/form-data") {
            body::parse_multipart(&content_type, payload, &mut self.form_data)?;
        } else if content_type.contains("application/x-www-form-urlencoded") {
            body::parse_urlencoded(payload, &mut self.params);
        } else if content_type.contains("application/json") {
            self.json_body = serde_json::from_slice(payload).ok();
        } else {
            self.body = payload.to_vec();
        }
        Ok(())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn form_field(&self, name: &str) -> Option<&FormField> {
        self.form_data.get(name)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Recover the value of a cookie written with
    /// `Response::set_signed_cookie`. Returns `None` when the cookie
    /// is absent or its signature does not verify.
    pub fn signed_cookie(&self, name: &str, secret: &str) -> Option<String> {
        cookie::verify(self.cookie(name)?, secret)
    }

    /// Whether a JSON body was present and parsed successfully.
    pub fn has_json_body(&self) -> bool {
        self.json_body.is_some()
    }

    /// Keep-alive decision for this exchange: an explicit
    /// `Connection: keep-alive` keeps the connection on any version;
    /// otherwise HTTP/1.1 keeps it unless `Connection: close` was sent.
    pub fn wants_keep_alive(&self) -> bool {
        match self.header("Connection") {
            Some(value) if value.eq_ignore_ascii_case("keep-alive") => true,
            Some(value) if value.eq_ignore_ascii_case("close") => false,
            _ => self.version == "HTTP/1.1",
        }
    }
}

/// Split a raw query string into pairs. Values stay undecoded; a key
/// without `=` maps to the empty string.
fn parse_query(raw: &str, out: &mut HashMap<String, String>) {
    for pair in raw.split('&') {
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((key, value)) => out.insert(key.to_string(), value.to_string()),
            None => out.insert(pair.to_string(), String::new()),
        };
    }
}

/// Split a `Cookie` header into name/value pairs.
fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let (name, value) = entry.split_once('=').unwrap_or((entry, ""));
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
