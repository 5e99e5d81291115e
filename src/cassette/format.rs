//! Cassette data structures and their JSON decoding.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::body;
use crate::error::{DeckError, Result};
use crate::request::{Headers, ResponseMeta};

/// A recorded request. The body has already been decoded into raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    /// HTTP method.
    pub method: String,
    /// Full URL as recorded.
    pub url: String,
    /// Header fields, if the recording had any.
    pub headers: Option<Headers>,
    /// Raw body bytes.
    pub body: Option<Vec<u8>>,
}

/// A recorded response. The body stays in its cassette encoding until playback.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    /// URL the response belongs to.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Header fields.
    pub headers: Headers,
    /// Encoded body, decoded with [`body::decode`] at delivery time.
    pub body: Option<Value>,
    /// Error recorded alongside the response.
    pub error: Option<String>,
}

impl ResponseRecord {
    /// Metadata for the first delivery phase.
    #[must_use]
    pub fn meta(&self) -> ResponseMeta {
        ResponseMeta {
            url: self.url.clone(),
            status: self.status,
            headers: self.headers.clone(),
        }
    }

    /// Raw body bytes.
    #[must_use]
    pub fn decoded_body(&self) -> Option<Vec<u8>> {
        body::decode(self.body.as_ref(), Some(&self.headers))
    }
}

/// One recorded request/response pair. Identified by its position in the cassette.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    /// The recorded request.
    pub request: RequestRecord,
    /// The recorded response.
    pub response: ResponseRecord,
}

/// An ordered, immutable list of recorded interactions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cassette {
    /// Human-readable name, when the file carries one.
    pub name: Option<String>,
    /// When the cassette was recorded, when the file carries it.
    pub recorded_at: Option<DateTime<Utc>>,
    /// Interactions in recorded order.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Creates an unnamed cassette from interactions.
    #[must_use]
    pub fn new(interactions: Vec<Interaction>) -> Self {
        Self {
            name: None,
            recorded_at: None,
            interactions,
        }
    }

    /// Decodes a cassette from JSON bytes. Accepts both the
    /// `{"interactions": [...]}` object form and a bare array.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::MalformedFixture`] if the bytes do not decode.
    pub fn from_slice(name: &str, bytes: &[u8]) -> Result<Self> {
        let malformed = |detail: String| DeckError::MalformedFixture {
            name: name.to_string(),
            detail,
        };
        let value: Value = serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;

        let cassette = match value {
            Value::Array(_) => {
                let interactions: Vec<WireInteraction> =
                    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
                Self::new(interactions.into_iter().map(Interaction::from).collect())
            }
            Value::Object(_) => {
                let document: WireDocument =
                    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
                let interactions = document.interactions.into_iter().map(Interaction::from);
                Self {
                    name: document.name,
                    recorded_at: document.recorded_at,
                    interactions: interactions.collect(),
                }
            }
            _ => return Err(malformed("expected an array or an object with interactions".into())),
        };
        tracing::debug!(
            fixture = name,
            interactions = cassette.interactions.len(),
            "decoded cassette"
        );
        Ok(cassette)
    }

    /// Reads and decodes a cassette file.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::MissingFixture`] if the file does not exist,
    /// [`DeckError::Io`] for other read failures and
    /// [`DeckError::MalformedFixture`] if it does not decode.
    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DeckError::MissingFixture(path.display().to_string()),
            _ => DeckError::Io(e),
        })?;
        Self::from_slice(&path.display().to_string(), &bytes)
    }

    /// Number of interactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// True when the cassette holds no interactions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}

// --- Wire format ---

/// Object form: `{"name", "recorded_at", "interactions"}`.
#[derive(Debug, Deserialize)]
struct WireDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    recorded_at: Option<DateTime<Utc>>,
    interactions: Vec<WireInteraction>,
}

/// Serialized interaction shape shared by both cassette forms.
#[derive(Debug, Deserialize)]
struct WireInteraction {
    request: WireRequest,
    response: WireResponse,
}

#[derive(Debug, Deserialize)]
struct WireRequest {
    #[serde(default = "default_method")]
    method: String,
    url: String,
    #[serde(default)]
    headers: Option<Headers>,
    #[serde(default)]
    body: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    url: String,
    status: u16,
    #[serde(default)]
    headers: Headers,
    #[serde(default)]
    body: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl From<WireInteraction> for Interaction {
    fn from(wire: WireInteraction) -> Self {
        let WireInteraction { request, response } = wire;
        let body = body::decode(request.body.as_ref(), request.headers.as_ref());

        Self {
            request: RequestRecord {
                method: request.method,
                url: request.url,
                headers: request.headers,
                body,
            },
            response: ResponseRecord {
                url: response.url,
                status: response.status,
                headers: response.headers,
                body: response.body.filter(|b| !b.is_null()),
                error: response.error,
            },
        }
    }
}
