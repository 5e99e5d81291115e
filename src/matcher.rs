//! Composable predicates comparing an incoming request to a recorded one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::cassette::Interaction;
use crate::request::{Headers, Request};

/// Predicate supplied by the caller for [`MatchKind::Custom`].
pub type CustomMatch = Arc<dyn Fn(&Interaction, &Request) -> bool + Send + Sync>;

/// One attribute comparison between a recorded interaction and a request.
#[derive(Clone)]
pub enum MatchKind {
    /// Exact method equality.
    Method,
    /// Exact equality of the full URL string.
    Url,
    /// Equality of the URL path component.
    Path,
    /// Query parameters compared regardless of order. URLs without a query never match.
    Query,
    /// Header maps compared with case-insensitive names. Absent headers never match.
    Headers,
    /// Byte equality of the bodies. Absent bodies never match.
    Body,
    /// Caller-supplied predicate.
    Custom(CustomMatch),
}

impl MatchKind {
    /// Wraps a closure as a [`MatchKind::Custom`] matcher.
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Interaction, &Request) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Evaluates this matcher.
    #[must_use]
    pub fn matches(&self, interaction: &Interaction, request: &Request) -> bool {
        let recorded = &interaction.request;
        match self {
            Self::Method => recorded.method == request.method,
            Self::Url => recorded.url == request.url,
            Self::Path => match (Url::parse(&recorded.url), Url::parse(&request.url)) {
                (Ok(a), Ok(b)) => a.path() == b.path(),
                _ => false,
            },
            Self::Query => match (sorted_query(&recorded.url), sorted_query(&request.url)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            Self::Headers => match (&recorded.headers, &request.headers) {
                (Some(a), Some(b)) => normalized(a) == normalized(b),
                _ => false,
            },
            Self::Body => match (&recorded.body, &request.body) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            Self::Custom(predicate) => predicate(interaction, request),
        }
    }
}

impl fmt::Debug for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method => f.write_str("Method"),
            Self::Url => f.write_str("Url"),
            Self::Path => f.write_str("Path"),
            Self::Query => f.write_str("Query"),
            Self::Headers => f.write_str("Headers"),
            Self::Body => f.write_str("Body"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Query pairs sorted by name, then value. `None` if the URL has no query.
fn sorted_query(raw: &str) -> Option<Vec<(String, String)>> {
    let url = Url::parse(raw).ok()?;
    if url.query().is_none() {
        return None;
    }
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    pairs.sort();
    Some(pairs)
}

fn normalized(headers: &Headers) -> BTreeMap<String, &str> {
    headers.iter().map(|(name, value)| (name.to_ascii_lowercase(), value.as_str())).collect()
}

/// The matchers that can be named in configuration files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    /// See [`MatchKind::Method`].
    Method,
    /// See [`MatchKind::Url`].
    Url,
    /// See [`MatchKind::Path`].
    Path,
    /// See [`MatchKind::Query`].
    Query,
    /// See [`MatchKind::Headers`].
    Headers,
    /// See [`MatchKind::Body`].
    Body,
}

impl From<MatchField> for MatchKind {
    fn from(field: MatchField) -> Self {
        match field {
            MatchField::Method => Self::Method,
            MatchField::Url => Self::Url,
            MatchField::Path => Self::Path,
            MatchField::Query => Self::Query,
            MatchField::Headers => Self::Headers,
            MatchField::Body => Self::Body,
        }
    }
}

/// An ordered set of matchers combined with logical AND.
///
/// An empty set matches every interaction.
#[derive(Debug, Clone, Default)]
pub struct MatcherSpec {
    kinds: Vec<MatchKind>,
}

impl MatcherSpec {
    /// Creates a set from matchers in evaluation order.
    #[must_use]
    pub fn new(kinds: Vec<MatchKind>) -> Self {
        Self { kinds }
    }

    /// Appends a matcher.
    #[must_use]
    pub fn with(mut self, kind: MatchKind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// The configured matchers in order.
    #[must_use]
    pub fn kinds(&self) -> &[MatchKind] {
        &self.kinds
    }

    /// True when no matcher is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// True if every matcher accepts the pair.
    #[must_use]
    pub fn matches(&self, interaction: &Interaction, request: &Request) -> bool {
        self.kinds.iter().all(|kind| kind.matches(interaction, request))
    }
}

impl FromIterator<MatchKind> for MatcherSpec {
    fn from_iter<I: IntoIterator<Item = MatchKind>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl FromIterator<MatchField> for MatcherSpec {
    fn from_iter<I: IntoIterator<Item = MatchField>>(iter: I) -> Self {
        iter.into_iter().map(MatchKind::from).collect()
    }
}
