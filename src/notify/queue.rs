// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Bounded notification queue
//!
//! Producers never wait: a full queue drops the incoming notification. The
//! dispatcher is the only consumer and suspends in [`NotificationQueue::dequeue`]
//! while the queue is empty. Closing the queue lets the consumer drain what is
//! left and then stop.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::Notification;

/// Capacity used when the configuration does not override it
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Fixed-capacity, drop-newest-on-full FIFO over a tokio channel
#[derive(Debug)]
pub struct NotificationQueue {
    // the only sender; taking it out closes the channel
    tx: Mutex<Option<mpsc::Sender<Notification>>>,
    rx: tokio::sync::Mutex<mpsc::Receiver<Notification>>,
    capacity: usize,
    pending: AtomicUsize,
    dropped: AtomicU64,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx: Mutex::new(Some(tx)),
            rx: tokio::sync::Mutex::new(rx),
            capacity,
            pending: AtomicUsize::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Queues `n` unless the queue is full or closed. Never blocks.
    ///
    /// Returns whether the notification was accepted; a rejected
    /// notification is counted in [`dropped`](Self::dropped).
    pub fn enqueue(&self, n: Notification) -> bool {
        let sender = self.tx.lock();
        let Some(tx) = sender.as_ref() else {
            debug!("Queue closed, discarding notification: {}", n.caption);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        // counted before the send so a fast consumer never sees it underflow
        self.pending.fetch_add(1, Ordering::SeqCst);
        match tx.try_send(n) {
            Ok(()) => true,
            Err(TrySendError::Full(n)) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(capacity = self.capacity, dropped_total = total, "Notification queue full, dropping: {}", n.caption);
                false
            }
            Err(TrySendError::Closed(n)) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Queue closed, discarding notification: {}", n.caption);
                false
            }
        }
    }

    /// Next notification, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and fully drained.
    pub async fn dequeue(&self) -> Option<Notification> {
        let next = self.rx.lock().await.recv().await;
        if next.is_some() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
        next
    }

    /// Non-waiting variant of [`dequeue`](Self::dequeue). Also `None` while
    /// the consumer is waiting in `dequeue`.
    pub fn try_dequeue(&self) -> Option<Notification> {
        let mut rx = self.rx.try_lock().ok()?;
        let next = rx.try_recv().ok();
        if next.is_some() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
        next
    }

    /// Rejects further enqueues and wakes the consumer once the rest is drained
    pub fn close(&self) {
        if self.tx.lock().take().is_some() {
            debug!(pending = self.len(), "Notification queue closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.lock().is_none()
    }

    pub fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Notifications discarded because the queue was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
