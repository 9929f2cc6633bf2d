//! Ordered list of videos waiting to play.
//!
//! Indices arrive straight from clients, so every index-taking operation
//! accepts `i64` and treats anything out of range as a no-op rather than an
//! error.

use std::collections::VecDeque;

use videosync_proto::QueuedVideo;

/// Pending videos in play order. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    entries: VecDeque<QueuedVideo>,
}

impl Queue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending videos.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending videos, front first.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedVideo> + '_ {
        self.entries.iter()
    }

    /// Owned copy of the queue, front first.
    pub fn snapshot(&self) -> Vec<QueuedVideo> {
        self.entries.iter().cloned().collect()
    }

    /// Append to the back.
    pub fn push(&mut self, entry: QueuedVideo) {
        self.entries.push_back(entry);
    }

    /// Take the front entry.
    pub fn pop_front(&mut self) -> Option<QueuedVideo> {
        self.entries.pop_front()
    }

    /// Move the entry at `from` so it ends up at `to`.
    ///
    /// `to` is interpreted against the queue *after* the entry has been
    /// removed; a `to` at or past the end of that shorter queue appends.
    /// Returns `false` without touching the queue when `from` is out of range,
    /// `to` is negative or greater than the current length, or `from == to`.
    pub fn reorder(&mut self, from: i64, to: i64) -> bool {
        let len = self.entries.len();
        let (Ok(from), Ok(to)) = (usize::try_from(from), usize::try_from(to)) else {
            return false;
        };
        if from >= len || to > len || from == to {
            return false;
        }

        let Some(entry) = self.entries.remove(from) else {
            return false;
        };
        if to >= self.entries.len() {
            self.entries.push_back(entry);
        } else {
            self.entries.insert(to, entry);
        }
        true
    }

    /// Remove the entry at `index`. `None` when out of range.
    pub fn remove(&mut self, index: i64) -> Option<QueuedVideo> {
        let index = usize::try_from(index).ok()?;
        self.entries.remove(index)
    }
}
