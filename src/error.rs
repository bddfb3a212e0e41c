//! Error types for request decoding.
//!
//! Every error in this module is converted into a `400 Bad Request`
//! at the worker boundary; nothing here propagates past the
//! connection loop.

use std::io;
use thiserror::Error;

/// Errors produced while framing and decoding an HTTP/1.1 request.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The request line did not contain `METHOD SP TARGET SP VERSION`.
    #[error("malformed request line")]
    BadRequestLine,

    /// A header line could not be interpreted.
    #[error("malformed header: {reason}")]
    BadHeader { reason: String },

    /// The `Content-Length` header was present but not a valid length.
    #[error("invalid content-length: {reason}")]
    InvalidContentLength { reason: String },

    /// A `multipart/form-data` body was structurally broken.
    #[error("malformed multipart body: {reason}")]
    BadMultipart { reason: String },

    /// I/O error while reading from the connection.
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ProtocolError {
    pub fn bad_header<S: ToString>(reason: S) -> Self {
        Self::BadHeader {
            reason: reason.to_string(),
        }
    }

    pub fn invalid_content_length<S: ToString>(reason: S) -> Self {
        Self::InvalidContentLength {
            reason: reason.to_string(),
        }
    }

    pub fn bad_multipart<S: ToString>(reason: S) -> Self {
        Self::BadMultipart {
            reason: reason.to_string(),
        }
    }
}
