//! Bridges between `reqwest` and a playback [`Session`].
//!
//! Code written against a `reqwest::Client` can build its requests as usual and
//! hand them to [`Session::execute`] instead of sending them.

use reqwest::ResponseBuilderExt;

use crate::error::{DeckError, Result};
use crate::request::{Headers, Request, ResponseMeta};
use crate::session::Session;

impl TryFrom<&reqwest::Request> for Request {
    type Error = DeckError;

    /// Copies method, URL, headers and a buffered body. Streaming bodies are rejected.
    fn try_from(request: &reqwest::Request) -> Result<Self> {
        let headers: Headers = request
            .headers()
            .iter()
            .map(|(name, value)| {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                (name.as_str().to_string(), value)
            })
            .collect();

        let body = request
            .body()
            .map(|body| {
                body.as_bytes().map(<[u8]>::to_vec).ok_or_else(|| {
                    DeckError::Transport("streaming request bodies cannot be replayed".into())
                })
            })
            .transpose()?;

        Ok(Self {
            method: request.method().as_str().to_string(),
            url: request.url().to_string(),
            headers: (!headers.is_empty()).then_some(headers),
            body,
        })
    }
}

/// Builds an `http::Response` from replayed metadata and body.
///
/// # Errors
///
/// Returns [`DeckError::Transport`] when the recorded status or a header is not
/// valid HTTP.
pub fn to_http_response(
    meta: &ResponseMeta,
    body: Option<Vec<u8>>,
) -> Result<http::Response<Vec<u8>>> {
    let mut builder = http::Response::builder().status(meta.status);
    if let Ok(url) = url::Url::parse(&meta.url) {
        builder = builder.url(url);
    }
    for (name, value) in &meta.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.body(body.unwrap_or_default()).map_err(|e| {
        DeckError::Transport(format!("invalid recorded response for {}: {e}", meta.url))
    })
}

impl Session {
    /// Serves a `reqwest` request from the cassette.
    ///
    /// # Errors
    ///
    /// Returns the playback error for the request, or [`DeckError::Transport`]
    /// when either side cannot be converted.
    pub async fn execute(&self, request: &reqwest::Request) -> Result<reqwest::Response> {
        let request = Request::try_from(request)?;
        let reply = self.fetch(request).await?;
        let response = to_http_response(&reply.response, reply.body)?;
        Ok(reqwest::Response::from(response))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use reqwest::{Method, Url};

    use super::*;
    use crate::cassette::Cassette;
    use crate::session::NoMatchMode;

    const FIXTURE: &str = r#"[
        {"request": {"method": "GET", "url": "http://api.test1.com/items?page=2"},
         "response": {"url": "http://api.test1.com/items?page=2", "status": 200,
                      "headers": {"Content-Type": "application/json"}, "body": {"items": [1, 2]}}}
    ]"#;

    fn items_request() -> reqwest::Request {
        let url = Url::parse("http://api.test1.com/items?page=2").unwrap();
        reqwest::Request::new(Method::GET, url)
    }

    fn session(mode: NoMatchMode) -> Session {
        Session::builder(Cassette::from_slice("transport", FIXTURE.as_bytes()).unwrap())
            .no_match(mode)
            .build()
    }

    #[test]
    fn converts_reqwest_request() {
        let client = reqwest::Client::new();
        let request = client
            .post("http://api.test1.com/upload")
            .header("X-Trace", "abc")
            .body("payload")
            .build()
            .unwrap();

        let converted = Request::try_from(&request).unwrap();
        assert_eq!(converted.method, "POST");
        assert_eq!(converted.url, "http://api.test1.com/upload");
        let headers = converted.headers.unwrap();
        assert_eq!(headers.get("x-trace").map(String::as_str), Some("abc"));
        assert_eq!(converted.body, Some(b"payload".to_vec()));
    }

    #[test]
    fn request_without_headers_or_body() {
        let url = Url::parse("http://api.test1.com/").unwrap();
        let request = reqwest::Request::new(Method::GET, url);
        let converted = Request::try_from(&request).unwrap();
        assert_eq!(converted.headers, None);
        assert_eq!(converted.body, None);
    }

    #[test]
    fn rejects_invalid_status() {
        let meta = ResponseMeta {
            url: "http://a".into(),
            status: 42,
            headers: BTreeMap::new(),
        };
        assert!(matches!(to_http_response(&meta, None), Err(DeckError::Transport(_))));
    }

    #[tokio::test]
    async fn execute_returns_recorded_response() {
        let request = items_request();
        let response = session(NoMatchMode::Handler).execute(&request).await.unwrap();

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.url().as_str(), "http://api.test1.com/items?page=2");
        assert_eq!(response.headers()["content-type"], "application/json");
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, serde_json::json!({"items": [1, 2]}));
    }

    #[tokio::test]
    async fn execute_reports_miss() {
        let session = session(NoMatchMode::Deliver);
        let request = items_request();
        session.execute(&request).await.unwrap();

        let err = session.execute(&request).await.unwrap_err();
        assert_eq!(err.code(), 404);
    }
}
