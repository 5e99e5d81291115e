//! A single replayed request and its asynchronous delivery.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};

use crate::cassette::ResponseRecord;
use crate::error::DeckError;
use crate::observer::{TaskInfo, TaskObserver};
use crate::request::{Request, ResponseMeta};
use crate::session::{NoMatchMode, Shared};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Completion callback: `(body, response metadata, error)`.
pub type Completion =
    Box<dyn FnOnce(Option<Vec<u8>>, Option<ResponseMeta>, Option<DeckError>) + Send + 'static>;

/// Lifecycle of a [`PlaybackTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Created, not yet resumed.
    Suspended,
    /// Inside [`PlaybackTask::resume`].
    Running,
    /// Resumed. Delivery may still be pending on the queue.
    Completed,
}

/// One outstanding request served from the cassette.
///
/// The lookup happens synchronously in [`resume`](Self::resume), so tasks
/// resumed back to back consume interactions in call order. Only the delivery
/// of the three phases is deferred to the session queue.
pub struct PlaybackTask {
    info: TaskInfo,
    state: TaskState,
    response: Option<ResponseMeta>,
    callback: Option<Completion>,
    session: Arc<Shared>,
}

impl PlaybackTask {
    pub(crate) fn new(
        session: Arc<Shared>,
        request: Request,
        callback: Option<Completion>,
    ) -> Self {
        let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            info: TaskInfo::new(id, Arc::new(request)),
            state: TaskState::Suspended,
            response: None,
            callback,
            session,
        }
    }

    /// Process-wide unique identifier, increasing in creation order.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.info.id()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// The request the task was created with.
    #[must_use]
    pub fn original_request(&self) -> &Request {
        self.info.request()
    }

    /// The request being served. Requests are never rewritten, so this is the original.
    #[must_use]
    pub fn current_request(&self) -> &Request {
        self.info.request()
    }

    /// Response metadata, available once a resumed task found its interaction.
    #[must_use]
    pub fn response(&self) -> Option<&ResponseMeta> {
        self.response.as_ref()
    }

    /// Does nothing. Playback cannot be interrupted.
    pub fn cancel(&self) {}

    /// Does nothing. Playback cannot be interrupted.
    pub fn suspend(&self) {}

    /// Looks up the response and schedules delivery. Only the first call has an effect.
    pub fn resume(&mut self) {
        if self.state != TaskState::Suspended {
            tracing::trace!(task = self.id(), "resume ignored, task already started");
            return;
        }
        self.state = TaskState::Running;

        let lookup = self
            .session
            .player
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup(self.info.request());

        match lookup {
            Ok(record) => self.deliver(record),
            Err(error) => self.fail(error),
        }
        self.state = TaskState::Completed;
    }

    fn deliver(&mut self, record: ResponseRecord) {
        let meta = record.meta();
        let body = record.decoded_body();
        let error = record.error.map(DeckError::Recorded);
        self.response = Some(meta.clone());

        let queue = &self.session.queue;
        if let Some(observer) = &self.session.observer {
            let (info, observer, meta) = (self.info.clone(), Arc::clone(observer), meta.clone());
            queue.enqueue(Box::new(move || observer.did_receive_response(&info, &meta)));
        }
        if let (Some(observer), Some(data)) = (&self.session.observer, &body) {
            let (info, observer, data) = (self.info.clone(), Arc::clone(observer), data.clone());
            queue.enqueue(Box::new(move || observer.did_receive_data(&info, &data)));
        }
        tracing::trace!(task = self.id(), "delivery scheduled");
        self.enqueue_completion(body, Some(meta), error);
    }

    fn fail(&mut self, error: DeckError) {
        match self.session.no_match {
            NoMatchMode::Deliver => self.enqueue_completion(None, None, Some(error)),
            NoMatchMode::Handler => {
                let handler = &self.session.error_handler;
                match &error {
                    DeckError::NoMatchFound(request) => {
                        handler.on_not_found(request, self.session.unique);
                    }
                    _ => handler.on_unknown_error(),
                }
            }
        }
    }

    fn enqueue_completion(
        &mut self,
        body: Option<Vec<u8>>,
        meta: Option<ResponseMeta>,
        error: Option<DeckError>,
    ) {
        let info = self.info.clone();
        let observer: Option<Arc<dyn TaskObserver>> = self.session.observer.clone();
        let callback = self.callback.take();
        self.session.queue.enqueue(Box::new(move || {
            if let Some(observer) = observer {
                observer.did_complete(&info, error.as_ref());
            }
            if let Some(callback) = callback {
                callback(body, meta, error);
            }
        }));
    }
}

impl std::fmt::Debug for PlaybackTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackTask")
            .field("id", &self.id())
            .field("state", &self.state)
            .field("request", self.info.request())
            .finish_non_exhaustive()
    }
}
