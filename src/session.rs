//! A playback session: one player, one delivery queue, many tasks.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::cassette::{Cassette, FixtureLocator};
use crate::error::{DeckError, Result};
use crate::handler::{ErrorHandler, FatalErrorHandler};
use crate::observer::TaskObserver;
use crate::player::Player;
use crate::queue::{DeliveryQueue, WorkerQueue};
use crate::request::{Request, ResponseMeta};
use crate::sequencer::Playback;
use crate::task::{Completion, PlaybackTask};

/// What happens when a resumed task finds no interaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum NoMatchMode {
    /// Call the session [`ErrorHandler`] synchronously and deliver nothing.
    #[default]
    Handler,
    /// Deliver a completion carrying [`DeckError::NoMatchFound`] on the queue.
    Deliver,
}

/// State shared between a session and the tasks it created.
pub(crate) struct Shared {
    pub(crate) player: Mutex<Player>,
    pub(crate) queue: Arc<dyn DeliveryQueue>,
    pub(crate) observer: Option<Arc<dyn TaskObserver>>,
    pub(crate) error_handler: Arc<dyn ErrorHandler>,
    pub(crate) no_match: NoMatchMode,
    pub(crate) unique: bool,
}

/// A successful replay: the response metadata and decoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Response metadata.
    pub response: ResponseMeta,
    /// Decoded body bytes.
    pub body: Option<Vec<u8>>,
}

/// Serves requests from a cassette in place of a network client.
///
/// Cloning a session yields another handle to the same player and queue.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

/// Configures a [`Session`].
pub struct SessionBuilder {
    cassette: Cassette,
    playback: Playback,
    queue: Option<Arc<dyn DeliveryQueue>>,
    observer: Option<Arc<dyn TaskObserver>>,
    error_handler: Arc<dyn ErrorHandler>,
    no_match: NoMatchMode,
}

impl SessionBuilder {
    /// Order and consumption policy. Defaults to recorded order, single use.
    #[must_use]
    pub fn playback(mut self, playback: Playback) -> Self {
        self.playback = playback;
        self
    }

    /// Queue events are delivered on. Defaults to a [`WorkerQueue`].
    #[must_use]
    pub fn queue(mut self, queue: Arc<dyn DeliveryQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Observer notified of every delivery phase of every task.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn TaskObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Handler used in [`NoMatchMode::Handler`]. Defaults to [`FatalErrorHandler`].
    #[must_use]
    pub fn error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = handler;
        self
    }

    /// How misses are reported.
    #[must_use]
    pub fn no_match(mut self, mode: NoMatchMode) -> Self {
        self.no_match = mode;
        self
    }

    /// Builds the session.
    #[must_use]
    pub fn build(self) -> Session {
        let unique = self.playback.is_unique();
        let queue = self.queue.unwrap_or_else(|| Arc::new(WorkerQueue::new()));
        Session {
            shared: Arc::new(Shared {
                player: Mutex::new(Player::new(self.cassette, self.playback)),
                queue,
                observer: self.observer,
                error_handler: self.error_handler,
                no_match: self.no_match,
                unique,
            }),
        }
    }
}

impl Session {
    /// Starts configuring a session over `cassette`.
    #[must_use]
    pub fn builder(cassette: Cassette) -> SessionBuilder {
        SessionBuilder {
            cassette,
            playback: Playback::default(),
            queue: None,
            observer: None,
            error_handler: Arc::new(FatalErrorHandler),
            no_match: NoMatchMode::default(),
        }
    }

    /// A session with every default.
    #[must_use]
    pub fn new(cassette: Cassette) -> Self {
        Self::builder(cassette).build()
    }

    /// Loads the named fixture and starts configuring a session over it.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::MissingFixture`] or [`DeckError::MalformedFixture`].
    pub fn from_fixture(locator: &dyn FixtureLocator, name: &str) -> Result<SessionBuilder> {
        Ok(Self::builder(locator.load(name)?))
    }

    /// Creates a task without a completion callback. Nothing happens until it is resumed.
    #[must_use]
    pub fn data_task(&self, request: Request) -> PlaybackTask {
        PlaybackTask::new(Arc::clone(&self.shared), request, None)
    }

    /// Creates a task whose completion invokes `callback` with `(body, response, error)`.
    #[must_use]
    pub fn data_task_with<F>(&self, request: Request, callback: F) -> PlaybackTask
    where
        F: FnOnce(Option<Vec<u8>>, Option<ResponseMeta>, Option<DeckError>) + Send + 'static,
    {
        let callback: Completion = Box::new(callback);
        PlaybackTask::new(Arc::clone(&self.shared), request, Some(callback))
    }

    /// Like [`data_task_with`](Self::data_task_with) with `body` replacing the request body.
    #[must_use]
    pub fn upload_task<F>(
        &self,
        request: Request,
        body: impl Into<Vec<u8>>,
        callback: F,
    ) -> PlaybackTask
    where
        F: FnOnce(Option<Vec<u8>>, Option<ResponseMeta>, Option<DeckError>) + Send + 'static,
    {
        self.data_task_with(request.body(body), callback)
    }

    /// Replaces the cassette for all subsequent lookups, keeping the policy.
    pub fn load(&self, cassette: Cassette) {
        self.player().load(cassette);
    }

    /// Number of interactions that can still be served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.player().remaining()
    }

    /// The configured miss behavior.
    #[must_use]
    pub fn no_match_mode(&self) -> NoMatchMode {
        self.shared.no_match
    }

    /// Resumes a task for `request` and waits for its completion.
    ///
    /// The session queue must make progress on its own; a
    /// [`ManualQueue`](crate::queue::ManualQueue) that nobody drains never completes.
    ///
    /// # Errors
    ///
    /// Returns the completion error, [`DeckError::NoMatchFound`] when the miss
    /// went to a non-panicking error handler instead of being delivered, or
    /// [`DeckError::Transport`] when a matched response was never delivered.
    pub async fn fetch(&self, request: Request) -> Result<Reply> {
        let (sender, receiver) = oneshot::channel();
        let unmatched = request.clone();
        let mut task = self.data_task_with(request, move |body, response, error| {
            let _ = sender.send((body, response, error));
        });
        task.resume();
        let matched = task.response().is_some();
        // Releases the callback if the handler consumed the miss.
        drop(task);

        let Ok((body, response, error)) = receiver.await else {
            return Err(if matched {
                DeckError::Transport(format!(
                    "delivery of {} {} stopped before completion",
                    unmatched.method, unmatched.url
                ))
            } else {
                DeckError::NoMatchFound(Box::new(unmatched))
            });
        };
        if let Some(error) = error {
            return Err(error);
        }
        let response = response.ok_or_else(|| DeckError::NoMatchFound(Box::new(unmatched)))?;
        Ok(Reply { response, body })
    }

    fn player(&self) -> std::sync::MutexGuard<'_, Player> {
        self.shared.player.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("cassette", &self.cassette.name)
            .field("interactions", &self.cassette.len())
            .field("playback", &self.playback)
            .field("no_match", &self.no_match)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("no_match", &self.shared.no_match)
            .field("unique", &self.shared.unique)
            .finish_non_exhaustive()
    }
}
