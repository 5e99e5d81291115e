//! Optional callbacks for the three delivery phases of a playback task.

use std::sync::Arc;

use crate::error::DeckError;
use crate::request::{Request, ResponseMeta};

/// Identity of the task an observer event belongs to.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    id: u64,
    request: Arc<Request>,
}

impl TaskInfo {
    pub(crate) fn new(id: u64, request: Arc<Request>) -> Self {
        Self { id, request }
    }

    /// The task identifier.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The request the task was created for.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }
}

/// Receives delivery events. Every method has an empty default, so an
/// observer implements only the phases it cares about.
pub trait TaskObserver: Send + Sync {
    /// Phase one: the response metadata.
    fn did_receive_response(&self, _task: &TaskInfo, _response: &ResponseMeta) {}

    /// Phase two: the body bytes. Skipped when the response has no body.
    fn did_receive_data(&self, _task: &TaskInfo, _data: &[u8]) {}

    /// Phase three: completion, with the error if the task failed.
    fn did_complete(&self, _task: &TaskInfo, _error: Option<&DeckError>) {}
}
