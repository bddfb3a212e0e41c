//! Request body decoding: `multipart/form-data`,
//! `application/x-www-form-urlencoded` and `application/json`.

use std::collections::HashMap;

use crate::error::ProtocolError;

/// One decoded `multipart/form-data` field.
///
/// A part that carried a `filename` becomes a [`FormField::File`]
/// with the raw bytes; anything else is a [`FormField::Text`] with
/// the content as a string. Exactly one of the two holds for every
/// entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text {
        value: String,
    },
    File {
        bytes: Vec<u8>,
        filename: String,
        content_type: String,
    },
}

impl FormField {
    pub fn is_file(&self) -> bool {
        matches!(self, FormField::File { .. })
    }

    /// Text value, for non-file fields.
    pub fn value(&self) -> Option<&str> {
        match self {
            FormField::Text { value } => Some(value),
            FormField::File { .. } => None,
        }
    }

    /// Raw file bytes, for file fields.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            FormField::File { bytes, .. } => Some(bytes),
            FormField::Text { .. } => None,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            FormField::File { filename, .. } => Some(filename),
            FormField::Text { .. } => None,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        match self {
            FormField::File { content_type, .. } => Some(content_type),
            FormField::Text { .. } => None,
        }
    }
}

/// Decode a multipart body into `out`, keyed by field name.
///
/// `content_type` must be the full `Content-Type` header value so the
/// boundary parameter can be extracted. Parts are the byte ranges
/// between `--<boundary>` markers; each part's content ends two bytes
/// (the CRLF) before the next marker.
pub(crate) fn parse_multipart(
    content_type: &str,
    body: &[u8],
    out: &mut HashMap<String, FormField>,
) -> Result<(), ProtocolError> {
    let boundary = content_type
        .split_once("boundary=")
        .map(|(_, b)| b.trim())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| ProtocolError::bad_multipart("missing boundary parameter"))?;
    let marker = format!("--{boundary}");
    let marker = marker.as_bytes();

    let mut pos = 0;
    while pos < body.len() {
        let Some(found) = find(&body[pos..], marker) else {
            break;
        };
        let part_start = pos + found + marker.len();
        if part_start >= body.len() || body[part_start..].starts_with(b"--") {
            break;
        }
        // Skip the rest of the boundary line.
        let Some(line_end) = find(&body[part_start..], b"\r\n") else {
            break;
        };
        let headers_start = part_start + line_end + 2;
        let Some(headers_len) = find(&body[headers_start..], b"\r\n\r\n") else {
            break;
        };
        let part_headers = &body[headers_start..headers_start + headers_len];
        let content_start = headers_start + headers_len + 4;

        let part_end = find(&body[content_start..], marker)
            .map(|p| content_start + p)
            .unwrap_or(body.len());
        // Content stops before the CRLF that precedes the next marker.
        let content_end = part_end.saturating_sub(2).max(content_start);
        let content = &body[content_start..content_end];

        parse_part(part_headers, content, out)?;
        pos = part_end;
    }
    Ok(())
}

/// Decode one part's header block and store the resulting field.
fn parse_part(
    headers: &[u8],
    content: &[u8],
    out: &mut HashMap<String, FormField>,
) -> Result<(), ProtocolError> {
    let headers = String::from_utf8_lossy(headers);
    let disposition = headers
        .find("Content-Disposition:")
        .ok_or_else(|| ProtocolError::bad_multipart("part without Content-Disposition"))?;
    let name = quoted_attr(&headers[disposition..], "name=\"")
        .ok_or_else(|| ProtocolError::bad_multipart("part without field name"))?;

    let field = match quoted_attr(&headers[disposition..], "filename=\"") {
        Some(filename) => {
            let content_type = headers
                .find("Content-Type:")
                .map(|ct| {
                    let rest = &headers[ct + "Content-Type:".len()..];
                    rest.lines().next().unwrap_or("").trim().to_string()
                })
                .unwrap_or_default();
            FormField::File {
                bytes: content.to_vec(),
                filename,
                content_type,
            }
        }
        None => FormField::Text {
            value: String::from_utf8_lossy(content).into_owned(),
        },
    };

    out.insert(name, field);
    Ok(())
}

/// Extract a `key="value"` attribute following `prefix` in `haystack`.
fn quoted_attr(haystack: &str, prefix: &str) -> Option<String> {
    let start = haystack.find(prefix)? + prefix.len();
    let end = haystack[start..].find('"')?;
    Some(haystack[start..start + end].to_string())
}

/// Decode an urlencoded body (`%HH` escapes, `+` as space) into the
/// request's parameter map.
pub(crate) fn parse_urlencoded(body: &[u8], params: &mut HashMap<String, String>) {
    for (key, value) in url::form_urlencoded::parse(body) {
        params.insert(key.into_owned(), value.into_owned());
    }
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
