//! HTTP message types: request decoding, response building, cookies.

mod body;
mod cookie;
mod request;
mod response;

pub use body::FormField;
pub use cookie::{CookieOptions, SameSite};
pub use request::{content_length, find_header_end, Headers, Request};
pub use response::Response;
