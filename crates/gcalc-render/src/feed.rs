//! The program feed: the dirty flag between the Edit Protocol and the
//! render loop.
//!
//! [`ProgramFeed::publish`] replaces the latest snapshot and marks the
//! program dirty only if the snapshot's fingerprint differs from the one
//! already published. The render loop's [`tokio::sync::watch::Receiver`]
//! observes the flag with `has_changed` and clears it with
//! `borrow_and_update` at the start of a rebuild.

use tokio::sync::watch;

use crate::program::ProgramSnapshot;

#[derive(Debug, Clone)]
pub struct FeedValue {
    pub snapshot: ProgramSnapshot,
    pub fingerprint: [u8; 32],
}

impl FeedValue {
    fn new(snapshot: ProgramSnapshot) -> Self {
        let fingerprint = snapshot.fingerprint();
        FeedValue {
            snapshot,
            fingerprint,
        }
    }
}

/// Publishing side of the program channel.
#[derive(Debug, Clone)]
pub struct ProgramFeed {
    tx: watch::Sender<FeedValue>,
}

impl ProgramFeed {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(FeedValue::new(ProgramSnapshot::default()));
        ProgramFeed { tx }
    }

    /// Publishes `snapshot`; returns true if it marked the program dirty.
    pub fn publish(&self, snapshot: ProgramSnapshot) -> bool {
        let next = FeedValue::new(snapshot);
        let dirty = self.tx.send_if_modified(|current| {
            if current.fingerprint == next.fingerprint {
                false
            } else {
                *current = next;
                true
            }
        });
        if dirty {
            tracing::debug!("program marked dirty");
        }
        dirty
    }

    /// Latest published snapshot.
    pub fn current(&self) -> ProgramSnapshot {
        self.tx.borrow().snapshot.clone()
    }

    /// A receiver for the render loop. The current snapshot counts as seen.
    pub fn subscribe(&self) -> watch::Receiver<FeedValue> {
        self.tx.subscribe()
    }
}

impl Default for ProgramFeed {
    fn default() -> Self {
        Self::new()
    }
}
