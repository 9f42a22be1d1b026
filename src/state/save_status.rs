//! Tri-state save indicator published to admin clients while documents are written.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use serde::Serialize;
use tokio::{sync::watch, time::sleep};
use utoipa::ToSchema;

/// Progress of the most recent write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveStatus {
    /// No write in progress.
    Idle,
    /// A write is in flight.
    Saving,
    /// The last write succeeded.
    Saved,
    /// The last write failed.
    Error {
        /// Human-readable failure reason.
        message: String,
    },
}

/// Publishes [`SaveStatus`] changes and resets `saved`/`error` back to `idle` after a delay.
#[derive(Clone)]
pub struct SaveStatusTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    sender: watch::Sender<SaveStatus>,
    generation: AtomicU64,
    reset_after: Duration,
}

/// Handle for one write, returned by [`SaveStatusTracker::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket(u64);

impl SaveStatusTracker {
    /// Tracker starting at `idle`; finished writes fall back to `idle` after `reset_after`.
    pub fn new(reset_after: Duration) -> Self {
        let (sender, _receiver) = watch::channel(SaveStatus::Idle);
        Self {
            inner: Arc::new(TrackerInner {
                sender,
                generation: AtomicU64::new(0),
                reset_after,
            }),
        }
    }

    /// Status as of now.
    pub fn current(&self) -> SaveStatus {
        self.inner.sender.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.inner.sender.subscribe()
    }

    /// Mark a write as started.
    pub fn begin(&self) -> SaveTicket {
        let ticket = SaveTicket(self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1);
        self.inner.sender.send_replace(SaveStatus::Saving);
        ticket
    }

    /// Mark the write behind `ticket` as saved.
    pub fn succeed(&self, ticket: SaveTicket) {
        self.finish(ticket, SaveStatus::Saved);
    }

    /// Mark the write behind `ticket` as failed.
    pub fn fail(&self, ticket: SaveTicket, message: impl Into<String>) {
        self.finish(
            ticket,
            SaveStatus::Error {
                message: message.into(),
            },
        );
    }

    /// Publish the terminal status unless a newer write already started, then schedule the reset.
    fn finish(&self, ticket: SaveTicket, status: SaveStatus) {
        if !self.is_latest(ticket) {
            return;
        }
        self.inner.sender.send_replace(status);

        let tracker = self.clone();
        tokio::spawn(async move {
            sleep(tracker.inner.reset_after).await;
            if tracker.is_latest(ticket) {
                tracker.inner.sender.send_if_modified(|status| {
                    if matches!(status, SaveStatus::Saving | SaveStatus::Idle) {
                        return false;
                    }
                    *status = SaveStatus::Idle;
                    true
                });
            }
        });
    }

    fn is_latest(&self, ticket: SaveTicket) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == ticket.0
    }
}
