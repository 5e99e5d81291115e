//! Serial queues that playback events are delivered on.
//!
//! Every queue runs one job at a time in submission order, so events of one
//! task never overtake each other and events of different tasks interleave only
//! between jobs.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

/// A unit of delivery work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs `job`, logging a panic instead of unwinding into the queue consumer.
fn run_isolated(job: Job) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        tracing::error!(panic = message, "delivery job panicked");
    }
}

/// A serial executor for delivery jobs.
pub trait DeliveryQueue: Send + Sync {
    /// Schedules `job` after every previously enqueued job.
    fn enqueue(&self, job: Job);
}

/// Runs jobs on a dedicated background thread. A panicking job is logged and
/// the thread moves on to the next one.
pub struct WorkerQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl WorkerQueue {
    /// Spawns the worker thread. It exits once the queue is dropped and drained.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn a thread.
    #[must_use]
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        std::thread::Builder::new()
            .name("tapedeck-delivery".into())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    run_isolated(job);
                }
            })
            .expect("failed to spawn delivery thread");
        Self { sender }
    }
}

impl Default for WorkerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryQueue for WorkerQueue {
    fn enqueue(&self, job: Job) {
        if self.sender.send(job).is_err() {
            tracing::warn!("delivery worker has stopped; dropping event");
        }
    }
}

/// Runs jobs on a single task spawned on a tokio runtime.
pub struct RuntimeQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl RuntimeQueue {
    /// Spawns the consumer task on `handle`.
    #[must_use]
    pub fn new(handle: &tokio::runtime::Handle) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        handle.spawn(async move {
            while let Some(job) = receiver.recv().await {
                run_isolated(job);
            }
        });
        Self { sender }
    }

    /// Spawns the consumer task on the runtime of the calling context, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(|handle| Self::new(&handle))
    }
}

impl DeliveryQueue for RuntimeQueue {
    fn enqueue(&self, job: Job) {
        if self.sender.send(job).is_err() {
            tracing::warn!("runtime delivery task has stopped; dropping event");
        }
    }
}

/// Holds jobs until the owner drains them on its own thread.
#[derive(Default)]
pub struct ManualQueue {
    jobs: Mutex<VecDeque<Job>>,
}

impl ManualQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no job is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Runs waiting jobs in order on the calling thread, including jobs they
    /// enqueue, and returns how many ran.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            // Release the lock before running so jobs may enqueue more.
            let next = self.lock().pop_front();
            let Some(job) = next else { break ran };
            job();
            ran += 1;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DeliveryQueue for ManualQueue {
    fn enqueue(&self, job: Job) {
        self.lock().push_back(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn worker_runs_jobs_in_order_off_thread() {
        let queue = WorkerQueue::new();
        let (tx, rx) = std_mpsc::channel();
        let caller = std::thread::current().id();
        for i in 0..20 {
            let tx = tx.clone();
            queue.enqueue(Box::new(move || {
                tx.send((i, std::thread::current().id())).unwrap();
            }));
        }
        let seen: Vec<_> = (0..20)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        let order: Vec<_> = seen.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, (0..20).collect::<Vec<_>>());
        assert!(seen.iter().all(|(_, thread)| *thread != caller));
    }

    #[test]
    fn worker_survives_panicking_job() {
        let queue = WorkerQueue::new();
        let (tx, rx) = std_mpsc::channel();
        queue.enqueue(Box::new(|| panic!("job failure")));
        queue.enqueue(Box::new(move || tx.send("after").unwrap()));
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "after");
    }

    #[test]
    fn manual_queue_waits_for_drain() {
        let queue = ManualQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let log = Arc::clone(&log);
            queue.enqueue(Box::new(move || log.lock().unwrap().push(i)));
        }
        assert_eq!(queue.len(), 3);
        assert!(log.lock().unwrap().is_empty());

        assert_eq!(queue.drain(), 3);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn manual_queue_runs_jobs_enqueued_during_drain() {
        let queue = Arc::new(ManualQueue::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let (inner_queue, inner_log) = (Arc::clone(&queue), Arc::clone(&log));
        queue.enqueue(Box::new(move || {
            inner_log.lock().unwrap().push("outer");
            let log = Arc::clone(&inner_log);
            inner_queue.enqueue(Box::new(move || log.lock().unwrap().push("inner")));
        }));
        assert_eq!(queue.drain(), 2);
        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[tokio::test]
    async fn runtime_queue_runs_on_current_runtime() {
        let queue = RuntimeQueue::current().expect("inside a runtime");
        let (tx, rx) = tokio::sync::oneshot::channel();
        queue.enqueue(Box::new(move || {
            let _ = tx.send(7);
        }));
        assert_eq!(rx.await.unwrap(), 7);
    }
}
