//! Time ordered, bounded history of timestamped records
//!
//!  Records are kept newest first. Every insert prunes by count and by age
//!  relative to the newest record, so the newest record always survives.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_SITUATIONS: usize = 20;
pub const DEFAULT_MAX_PARTS: usize = 20;
pub const DEFAULT_MAX_AGE_MS: i64 = 30_000;

pub trait Timestamped {
    /// Milliseconds since epoch the record is valid at
    fn timestamp_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferLimits {
    pub max_count: usize,
    pub max_age_ms: i64,
}

impl BufferLimits {
    pub fn new(max_count: usize, max_age_ms: i64) -> Self {
        Self {
            max_count: max_count.max(1),
            max_age_ms: max_age_ms.max(0),
        }
    }

    pub fn situations() -> Self {
        Self::new(DEFAULT_MAX_SITUATIONS, DEFAULT_MAX_AGE_MS)
    }

    pub fn parts() -> Self {
        Self::new(DEFAULT_MAX_PARTS, DEFAULT_MAX_AGE_MS)
    }
}

#[derive(Debug, Clone)]
pub struct TimestampedBuffer<T> {
    entries: VecDeque<T>,
    limits: BufferLimits,
}

impl<T: Timestamped + Clone> TimestampedBuffer<T> {
    pub fn new(limits: BufferLimits) -> Self {
        Self {
            entries: VecDeque::with_capacity(limits.max_count.min(64) + 1),
            limits: BufferLimits::new(limits.max_count, limits.max_age_ms),
        }
    }

    /// Insert in sorted position, then prune
    pub fn push(&mut self, record: T) {
        let ts = record.timestamp_ms();
        let index = self
            .entries
            .iter()
            .position(|e| e.timestamp_ms() <= ts)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, record);
        self.prune();
    }

    fn prune(&mut self) {
        self.entries.truncate(self.limits.max_count);

        let Some(newest) = self.entries.front().map(|e| e.timestamp_ms()) else {
            return;
        };
        let oldest_allowed = newest.saturating_sub(self.limits.max_age_ms);
        // sorted: once one entry is too old, all following are too
        let keep = self
            .entries
            .iter()
            .position(|e| e.timestamp_ms() < oldest_allowed)
            .unwrap_or(self.entries.len())
            .max(1);
        self.entries.truncate(keep);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn limits(&self) -> BufferLimits {
        self.limits
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Copy of all records, newest first
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }

    /// Copy of the records valid at or before `cutoff_ms`, newest first
    pub fn before(&self, cutoff_ms: i64) -> Vec<T> {
        self.entries
            .iter()
            .skip_while(|e| e.timestamp_ms() > cutoff_ms)
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
