//! Per-(caller, action) timestamp sequence.

use std::collections::VecDeque;

/// Ordered action timestamps for one caller and one action kind.
///
/// Timestamps are non-decreasing. An entry at `t` counts against the window
/// while `t + window_ms > now`, so it stops counting exactly at `t + window_ms`.
#[derive(Debug, Default, Clone)]
pub(crate) struct SlidingWindow {
    timestamps: VecDeque<u64>,
}

impl SlidingWindow {
    /// Drop expired entries from the front. Stops at the first live entry.
    pub(crate) fn prune(&mut self, now: u64, window_ms: u64) -> usize {
        let mut removed = 0;
        while let Some(&oldest) = self.timestamps.front() {
            if oldest.saturating_add(window_ms) > now {
                break;
            }
            self.timestamps.pop_front();
            removed += 1;
        }
        removed
    }

    /// Append an action. A clock that stepped backwards is clamped to the last entry.
    pub(crate) fn record(&mut self, now: u64) {
        let at = self.timestamps.back().map_or(now, |&last| last.max(now));
        self.timestamps.push_back(at);
    }

    pub(crate) fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub(crate) fn oldest(&self) -> Option<u64> {
        self.timestamps.front().copied()
    }

    pub(crate) fn clear(&mut self) {
        self.timestamps.clear();
    }
}
