//! Turns sequencer results into responses or not-found errors.

use crate::cassette::{Cassette, ResponseRecord};
use crate::error::{DeckError, Result};
use crate::request::Request;
use crate::sequencer::{Playback, Sequencer};

/// Looks up recorded responses for requests.
#[derive(Debug)]
pub struct Player {
    sequencer: Sequencer,
}

impl Player {
    /// Creates a player over the cassette with the given policy.
    #[must_use]
    pub fn new(cassette: Cassette, playback: Playback) -> Self {
        Self {
            sequencer: Sequencer::new(cassette, playback),
        }
    }

    /// Finds the response for `request`. The body is still in cassette encoding.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::NoMatchFound`] carrying the request when nothing is eligible.
    pub fn lookup(&mut self, request: &Request) -> Result<ResponseRecord> {
        match self.sequencer.next(request) {
            Some(interaction) => {
                tracing::debug!(
                    method = %request.method,
                    url = %request.url,
                    status = interaction.response.status,
                    "replaying recorded interaction"
                );
                Ok(interaction.response.clone())
            }
            None => {
                tracing::debug!(method = %request.method, url = %request.url, "no recorded match");
                Err(DeckError::NoMatchFound(Box::new(request.clone())))
            }
        }
    }

    /// Replaces the cassette, keeping the playback policy and starting a fresh view.
    pub fn load(&mut self, cassette: Cassette) {
        let playback = self.sequencer.playback().clone();
        self.sequencer = Sequencer::new(cassette, playback);
    }

    /// True when each interaction can be served only once.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.sequencer.playback().is_unique()
    }

    /// Number of interactions that can still be served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.sequencer.remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{MatchKind, MatcherSpec};
    use crate::sequencer::Consumption;

    fn cassette() -> Cassette {
        let doc = r#"[
            {"request": {"url": "http://api.test1.com"},
             "response": {"url": "http://api.test1.com", "status": 200,
                          "headers": {"Content-Type": "text/plain"}, "body": "one"}},
            {"request": {"url": "http://api.test2.com"},
             "response": {"url": "http://api.test2.com", "status": 200,
                          "headers": {"Content-Type": "text/plain"}, "body": "two"}}
        ]"#;
        Cassette::from_slice("player", doc.as_bytes()).unwrap()
    }

    #[test]
    fn url_matching_single_use() {
        let spec = MatcherSpec::new(vec![MatchKind::Url]);
        let mut player = Player::new(cassette(), Playback::matching(spec, Consumption::Ephemeral));

        let first = player.lookup(&Request::get("http://api.test1.com")).unwrap();
        assert_eq!(first.status, 200);
        assert_eq!(first.decoded_body(), Some(b"one".to_vec()));

        let second = player.lookup(&Request::get("http://api.test2.com")).unwrap();
        assert_eq!(second.url, "http://api.test2.com");

        let err = player.lookup(&Request::get("http://api.test1.com")).unwrap_err();
        assert_eq!(
            err.unmatched_request().map(|r| r.url.as_str()),
            Some("http://api.test1.com")
        );
        assert!(player.is_unique());
        assert_eq!(player.remaining(), 0);
    }

    #[test]
    fn load_starts_a_fresh_view() {
        let mut player = Player::new(cassette(), Playback::default());
        let request = Request::get("http://any");
        assert!(player.lookup(&request).is_ok());
        assert!(player.lookup(&request).is_ok());
        assert!(player.lookup(&request).is_err());

        player.load(cassette());
        assert_eq!(player.remaining(), 2);
        assert!(player.lookup(&request).is_ok());
    }
}
