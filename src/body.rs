//! Body encoding rules for cassette files.
//!
//! Bodies are stored in the JSON document according to the sibling
//! `Content-Type` header: `text/*` as a string, `application/json` as inline
//! JSON, anything else as base64. Both directions are best-effort and degrade
//! to an absent body instead of failing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use crate::request::{header, Headers};

const CONTENT_TYPE: &str = "Content-Type";

/// Converts raw body bytes into their cassette representation.
#[must_use]
pub fn encode(body: Option<&[u8]>, headers: &Headers) -> Option<Value> {
    let body = body?;
    let content_type = header(headers, CONTENT_TYPE)?;

    if content_type.starts_with("text/") {
        std::str::from_utf8(body).ok().map(|text| Value::String(text.to_owned()))
    } else if content_type.starts_with("application/json") {
        serde_json::from_slice(body).ok()
    } else {
        Some(Value::String(STANDARD.encode(body)))
    }
}

/// Converts a cassette body representation back into raw bytes.
#[must_use]
pub fn decode(body: Option<&Value>, headers: Option<&Headers>) -> Option<Vec<u8>> {
    let body = body?;

    let Some(content_type) = headers.and_then(|h| header(h, CONTENT_TYPE)) else {
        // Without a content type the only safe reading is plain text.
        return body.as_str().map(|text| text.as_bytes().to_vec());
    };

    if content_type.starts_with("text/") {
        if let Some(text) = body.as_str() {
            return Some(text.as_bytes().to_vec());
        }
    }

    if content_type.starts_with("application/json") {
        return serde_json::to_vec(body).ok();
    }

    let text = body.as_str()?;
    let decoded = STANDARD.decode(text);
    if decoded.is_err() {
        tracing::trace!(content_type, "body is not valid base64, treating as absent");
    }
    decoded.ok()
}
