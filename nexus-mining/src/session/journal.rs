// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use std::collections::VecDeque;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::warn;

pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Bounded journal of human-readable session events, most recent entry first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for SessionLog {
    fn default() -> Self {
        SessionLog::new(DEFAULT_LOG_CAPACITY)
    }
}

impl SessionLog {
    pub fn new(capacity: usize) -> Self {
        // a zero-capacity journal would silently swallow even the terminal entries
        let capacity = capacity.max(1);
        SessionLog {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild the journal from already-formatted entries (most recent first),
    /// dropping anything beyond the capacity.
    pub fn from_entries<I>(entries: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut log = SessionLog::new(capacity);
        log.entries.extend(entries.into_iter().take(log.capacity));
        log
    }

    /// Prefix the message with the wall-clock time, put it at the front and evict
    /// the oldest entries beyond the capacity.
    pub fn append(&mut self, at: OffsetDateTime, message: &str) {
        self.entries.push_front(format!("[{}] {message}", timestamp(at)));
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear()
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!("[hour]:[minute]:[second]")).unwrap_or_else(|err| {
        warn!("failed to format the log timestamp {at}: {err}");
        "--:--:--".to_string()
    })
}
