//! Cookie serialisation and HMAC-signed cookie values.
//!
//! Outgoing cookies are rendered once into their full `Set-Cookie`
//! value (attributes included) and stored on the response by name.
//! Signed cookies carry `value.<hmac-sha256 hex>`; verification
//! recomputes the tag over the value part and compares it to the
//! suffix, so flipping any byte of either part rejects the cookie.

use std::fmt::Write as _;
use std::time::{Duration, SystemTime};

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// `SameSite` attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes appended to a `Set-Cookie` value.
///
/// Attributes are rendered in a fixed order: `Max-Age`, `Expires`
/// (derived from `Max-Age`), `Path`, `Domain`, `Secure`, `HttpOnly`,
/// `SameSite`.
#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    /// Lifetime in seconds; also drives the `Expires` attribute.
    pub max_age: Option<u64>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

/// Render a cookie value plus its attributes (everything after the
/// `name=` part of the `Set-Cookie` header line).
pub(crate) fn serialize(value: &str, opts: &CookieOptions) -> String {
    let mut out = String::from(value);
    if let Some(age) = opts.max_age {
        let _ = write!(out, "; Max-Age={age}");
        let expires = SystemTime::now() + Duration::from_secs(age);
        let _ = write!(out, "; Expires={}", httpdate::fmt_http_date(expires));
    }
    if let Some(path) = &opts.path {
        let _ = write!(out, "; Path={path}");
    }
    if let Some(domain) = &opts.domain {
        let _ = write!(out, "; Domain={domain}");
    }
    if opts.secure {
        out.push_str("; Secure");
    }
    if opts.http_only {
        out.push_str("; HttpOnly");
    }
    if let Some(same_site) = opts.same_site {
        let _ = write!(out, "; SameSite={}", same_site.as_str());
    }
    out
}

/// Produce `value.<hmac-sha256(secret, value) as lowercase hex>`.
pub(crate) fn sign(value: &str, secret: &str) -> String {
    let mut out = String::with_capacity(value.len() + 65);
    out.push_str(value);
    out.push('.');
    out.push_str(&hex_tag(value, secret));
    out
}

/// Verify a signed cookie value, returning the raw value on success.
pub(crate) fn verify(raw: &str, secret: &str) -> Option<String> {
    let (value, tag) = raw.rsplit_once('.')?;
    if hex_tag(value, secret) == tag {
        Some(value.to_string())
    } else {
        None
    }
}

fn hex_tag(value: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(value.as_bytes());
    let digest = mac.finalize().into_bytes();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}
