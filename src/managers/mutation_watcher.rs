//! Mutation Watcher.
//!
//! Trailing-edge debounce over DOM additions: every signal pushes the
//! deadline out by the debounce window, and the watcher fires once the window
//! passes without a new signal. This coalesces a burst of mutations into one
//! orchestration cycle. It is a time-window policy, not a lock.

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::page::Document;

#[derive(Debug)]
pub struct MutationWatcher {
    window: Duration,
    deadline: Option<Instant>,
    coalesced: usize,
}

impl MutationWatcher {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            coalesced: 0,
        }
    }

    /// Records a mutation signal at `now`.
    pub fn notify(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
        self.coalesced += 1;
    }

    /// Drains the document's added nodes and signals if any belong to the page.
    ///
    /// Nodes rendered by the extension itself (picker, save prompt) are ignored.
    pub fn observe(&mut self, doc: &mut Document, now: Instant) -> usize {
        let added = doc
            .take_added_nodes()
            .into_iter()
            .filter(|id| !doc.is_owned(*id))
            .count();
        if added > 0 {
            trace!(added, "page nodes added");
            self.notify(now);
        }
        added
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once per burst, when the quiet window has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                trace!(signals = self.coalesced, "mutation burst settled");
                self.deadline = None;
                self.coalesced = 0;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
        self.coalesced = 0;
    }
}
