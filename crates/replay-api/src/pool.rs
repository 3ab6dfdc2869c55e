//! Bounded worker pool for render/encode requests.
//!
//! Rendering and encoding are CPU- and process-heavy; unbounded
//! per-request parallelism would exhaust the host under many simultaneous
//! replay requests. The pool grants at most `workers` concurrent permits
//! and lets at most `max_queue` further requests wait; anything beyond
//! that is rejected immediately so memory never grows with load.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Errors returned by the render pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// All workers are busy and the wait queue is full.
    #[error("render worker pool saturated")]
    Saturated,
}

/// Bounded-concurrency pool with a bounded wait queue.
#[derive(Debug)]
pub struct RenderPool {
    semaphore: Arc<Semaphore>,
    waiting: Arc<AtomicUsize>,
    max_queue: usize,
}

/// Decrements the wait counter when a queued request stops waiting,
/// whether it acquired a permit or was cancelled mid-wait.
struct QueueGuard(Arc<AtomicUsize>);

impl Drop for QueueGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RenderPool {
    /// Create a pool with `workers` concurrent permits and room for
    /// `max_queue` waiting requests.
    #[must_use]
    pub fn new(workers: usize, max_queue: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            waiting: Arc::new(AtomicUsize::new(0)),
            max_queue,
        }
    }

    /// Acquire a worker permit, waiting in the bounded queue if all
    /// workers are busy.
    ///
    /// The permit releases its worker slot on drop. Cancelling a waiting
    /// request (client disconnect) frees its queue slot.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Saturated`] when the workers are busy and the
    /// queue is full.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, PoolError> {
        if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
            return Ok(permit);
        }

        if self.waiting.fetch_add(1, Ordering::SeqCst) >= self.max_queue {
            self.waiting.fetch_sub(1, Ordering::SeqCst);
            return Err(PoolError::Saturated);
        }
        let _guard = QueueGuard(Arc::clone(&self.waiting));

        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Saturated)
    }
}
