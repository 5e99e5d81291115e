//! Request and response shapes exchanged with the playback engine.

use std::collections::BTreeMap;

/// Header map. Names keep the case they were stored with.
pub type Headers = BTreeMap<String, String>;

/// Looks up a header by name, ignoring ASCII case.
#[must_use]
pub fn header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers.get(name).map(String::as_str).or_else(|| {
        headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    })
}

/// An outgoing request handed to the engine in place of a network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method, e.g. `GET`.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Header fields; `None` when the caller set none.
    pub headers: Option<Headers>,
    /// Body bytes, if any.
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Creates a request with the given method and URL and no headers or body.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: None,
            body: None,
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Adds a header field, creating the header map if needed.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Response metadata delivered before the body: URL, status and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    /// URL the response was recorded for.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response header fields.
    pub headers: Headers,
}

impl ResponseMeta {
    /// The response `Content-Type`, if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        header(&self.headers, "Content-Type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let mut headers = Headers::new();
        headers.insert("content-type".into(), "text/plain".into());
        assert_eq!(header(&headers, "Content-Type"), Some("text/plain"));
        assert_eq!(header(&headers, "Accept"), None);
    }

    #[test]
    fn builder_sets_headers_and_body() {
        let request = Request::new("POST", "http://api.test1.com")
            .header("Accept", "application/json")
            .body("payload");
        assert_eq!(request.method, "POST");
        assert_eq!(request.headers.as_ref().map(Headers::len), Some(1));
        assert_eq!(request.body.as_deref(), Some(b"payload".as_slice()));
        assert!(Request::get("http://x").headers.is_none());
    }
}
