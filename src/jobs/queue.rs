//! FIFO hand-off between submission and the worker pool.
//!
//! The queue carries job ids only; records live in the store. Capacity is
//! bounded: when the queue is full, submissions are rejected with
//! [`MarkifyError::QueueFull`] rather than growing without limit under a
//! slow converter. Closing the queue wakes every blocked worker, which
//! then observes the shutdown and exits; ids still queued at close time
//! are intentionally left to the store (they remain `Queued`).

use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::error::{MarkifyError, Result};

pub struct JobQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
    capacity: usize,
}

struct QueueInner {
    ids: VecDeque<Uuid>,
    closed: bool,
}

impl JobQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                ids: VecDeque::new(),
                closed: false,
            }),
            notify: Notify::new(),
            capacity,
        }
    }

    /// Add an id to the back of the queue. Never blocks.
    pub fn enqueue(&self, id: Uuid) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(MarkifyError::ShuttingDown);
            }
            if inner.ids.len() >= self.capacity {
                return Err(MarkifyError::QueueFull(self.capacity));
            }
            inner.ids.push_back(id);
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Wait for the next id in submission order.
    ///
    /// Returns `None` once the queue has been closed; that is the shutdown
    /// signal for the calling worker.
    pub async fn dequeue(&self) -> Option<Uuid> {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        loop {
            // Register interest before checking, so a notify between the
            // check and the await is not lost.
            notified.as_mut().enable();
            {
                let mut inner = self.inner.lock();
                if inner.closed {
                    return None;
                }
                if let Some(id) = inner.ids.pop_front() {
                    return Some(id);
                }
            }
            notified.as_mut().await;
            notified.set(self.notify.notified());
        }
    }

    /// Close the queue and wake every blocked worker.
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().ids.is_empty()
    }
}
