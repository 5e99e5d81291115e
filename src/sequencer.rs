//! Selects the next recorded interaction for a request.
//!
//! Two independent policies combine here. [`Order`] decides whether requests
//! are ignored (recorded order) or matched against a [`MatcherSpec`].
//! [`Consumption`] decides whether an interaction can be served once or any
//! number of times.

use crate::cassette::{Cassette, Interaction};
use crate::matcher::MatcherSpec;
use crate::request::Request;

/// How the next interaction is chosen.
#[derive(Debug, Clone, Default)]
pub enum Order {
    /// Serve interactions in cassette order, ignoring the request.
    #[default]
    Recorded,
    /// Serve the first interaction, in cassette order, accepted by the spec.
    Matching(MatcherSpec),
}

/// Whether a served interaction stays available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Consumption {
    /// Each interaction is served at most once.
    #[default]
    Ephemeral,
    /// Interactions are never used up. Recorded order wraps around.
    Looping,
}

/// Order and consumption policy for one session.
#[derive(Debug, Clone, Default)]
pub struct Playback {
    /// Selection order.
    pub order: Order,
    /// Consumption policy.
    pub consumption: Consumption,
}

impl Playback {
    /// Recorded order with the given consumption.
    #[must_use]
    pub fn recorded(consumption: Consumption) -> Self {
        Self {
            order: Order::Recorded,
            consumption,
        }
    }

    /// Matching order with the given matchers and consumption.
    #[must_use]
    pub fn matching(spec: MatcherSpec, consumption: Consumption) -> Self {
        Self {
            order: Order::Matching(spec),
            consumption,
        }
    }

    /// True when interactions are served at most once.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.consumption == Consumption::Ephemeral
    }
}

/// Mutable view over an immutable cassette.
///
/// Consumed interactions are tombstoned rather than removed so indices stay
/// stable; each lookup scans the cassette once.
#[derive(Debug)]
pub struct Sequencer {
    cassette: Cassette,
    playback: Playback,
    cursor: usize,
    consumed: Vec<bool>,
}

impl Sequencer {
    /// Creates a sequencer with a fresh view over the cassette.
    #[must_use]
    pub fn new(cassette: Cassette, playback: Playback) -> Self {
        let consumed = vec![false; cassette.len()];
        Self { cassette, playback, cursor: 0, consumed }
    }

    /// The policy this sequencer applies.
    #[must_use]
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    /// The underlying cassette.
    #[must_use]
    pub fn cassette(&self) -> &Cassette {
        &self.cassette
    }

    /// Returns the next eligible interaction for `request`, or `None` when
    /// nothing is eligible.
    pub fn next(&mut self, request: &Request) -> Option<&Interaction> {
        let index = match (&self.playback.order, self.playback.consumption) {
            (Order::Recorded, Consumption::Ephemeral) => self.next_recorded(),
            (Order::Recorded, Consumption::Looping) => self.next_looping(),
            (Order::Matching(spec), Consumption::Ephemeral) => {
                let index = self.first_match(spec, request, true)?;
                self.consumed[index] = true;
                Some(index)
            }
            (Order::Matching(spec), Consumption::Looping) => self.first_match(spec, request, false),
        }?;
        self.cassette.interactions.get(index)
    }

    /// Number of interactions that can still be served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        match self.playback.consumption {
            Consumption::Looping => self.cassette.len(),
            Consumption::Ephemeral => self.consumed.iter().filter(|used| !**used).count(),
        }
    }

    /// Discards all consumption state.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.consumed.iter_mut().for_each(|used| *used = false);
    }

    fn next_recorded(&mut self) -> Option<usize> {
        let index = self.cursor;
        if index >= self.cassette.len() {
            return None;
        }
        self.cursor += 1;
        self.consumed[index] = true;
        Some(index)
    }

    fn next_looping(&mut self) -> Option<usize> {
        if self.cassette.is_empty() {
            return None;
        }
        let index = self.cursor;
        self.cursor = (index + 1) % self.cassette.len();
        Some(index)
    }

    fn first_match(&self, spec: &MatcherSpec, request: &Request, skip_used: bool) -> Option<usize> {
        self.cassette
            .interactions
            .iter()
            .enumerate()
            .filter(|(index, _)| !(skip_used && self.consumed[*index]))
            .find(|(_, interaction)| spec.matches(interaction, request))
            .map(|(index, _)| index)
    }
}
