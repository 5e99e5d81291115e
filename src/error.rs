//! Error types for cassette loading and playback.

use crate::request::Request;

/// Result type for tapedeck operations.
pub type Result<T> = std::result::Result<T, DeckError>;

/// Errors produced while loading cassettes or playing them back.
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    /// The fixture file could not be found. Carries the file name that was tried.
    #[error("Fixture not found: {0}")]
    MissingFixture(String),

    /// The fixture exists but does not decode into a cassette.
    #[error("Malformed fixture {name}: {detail}")]
    MalformedFixture {
        /// Fixture name or path.
        name: String,
        /// Decoder message.
        detail: String,
    },

    /// No recorded interaction satisfies the playback policy for the request.
    #[error("Unable to find match for request: {} {}", .0.method, .0.url)]
    NoMatchFound(Box<Request>),

    /// An error stored on the recorded response itself.
    #[error("Recorded error: {0}")]
    Recorded(String),

    /// Configuration file could not be read or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A replayed response could not be converted for the transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error while reading a fixture.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeckError {
    /// Status-like code for the error: 404 for a missing match, 500 otherwise.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::NoMatchFound(_) => 404,
            _ => 500,
        }
    }

    /// The request that failed to match, if this is a [`DeckError::NoMatchFound`].
    #[must_use]
    pub fn unmatched_request(&self) -> Option<&Request> {
        match self {
            Self::NoMatchFound(request) => Some(request),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_reports_request_and_code() {
        let err = DeckError::NoMatchFound(Box::new(Request::get("http://api.test1.com")));
        assert_eq!(err.code(), 404);
        assert_eq!(err.to_string(), "Unable to find match for request: GET http://api.test1.com");
        assert_eq!(err.unmatched_request().map(|r| r.url.as_str()), Some("http://api.test1.com"));
    }

    #[test]
    fn other_errors_use_generic_code() {
        let err = DeckError::MissingFixture("nope.json".into());
        assert_eq!(err.code(), 500);
        assert!(err.unmatched_request().is_none());
        assert_eq!(err.to_string(), "Fixture not found: nope.json");
    }
}
