// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::session::journal::SessionLog;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;

pub(crate) const IDLE_MESSAGE: &str = "Mining session initialized. Ready to start.";
pub(crate) const RESUMED_MESSAGE: &str = "Resumed previous mining session.";
pub(crate) const STOPPED_MESSAGE: &str = "Mining session stopped.";

/// Cumulative statistics of the current session. This is also the persisted representation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub earnings: f64,
    pub blocks_found: u64,
}

/// State of a single user's reward session.
#[derive(Debug, Clone)]
pub struct RewardSession {
    pub(crate) end_timestamp: Option<OffsetDateTime>,
    pub(crate) is_active: bool,
    pub(crate) time_remaining: Duration,
    pub(crate) stats: SessionStats,
    pub(crate) hash_rate: f64,
    pub(crate) log: SessionLog,
}

impl RewardSession {
    pub fn new_idle(now: OffsetDateTime, log_capacity: usize) -> Self {
        let mut log = SessionLog::new(log_capacity);
        log.append(now, IDLE_MESSAGE);

        RewardSession {
            end_timestamp: None,
            is_active: false,
            time_remaining: Duration::ZERO,
            stats: SessionStats::default(),
            hash_rate: 0.0,
            log,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Whether the session should be considered active at the provided instant,
    /// regardless of when the last tick happened.
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        self.end_timestamp.is_some_and(|end| end > now)
    }

    pub fn end_timestamp(&self) -> Option<OffsetDateTime> {
        self.end_timestamp
    }

    pub fn time_remaining(&self) -> Duration {
        self.time_remaining
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn cumulative_earnings(&self) -> f64 {
        self.stats.earnings
    }

    pub fn blocks_found(&self) -> u64 {
        self.stats.blocks_found
    }

    pub fn hash_rate(&self) -> f64 {
        self.hash_rate
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn append_log(&mut self, now: OffsetDateTime, message: &str) {
        self.log.append(now, message)
    }

    /// Bring back a previously persisted, still running, session.
    pub(crate) fn resume(
        &mut self,
        now: OffsetDateTime,
        end_timestamp: OffsetDateTime,
        stats: Option<SessionStats>,
        log: Option<Vec<String>>,
    ) {
        self.end_timestamp = Some(end_timestamp);
        self.is_active = end_timestamp > now;
        self.time_remaining = remaining_until(end_timestamp, now);
        if let Some(stats) = stats {
            self.stats = stats;
        }
        if let Some(entries) = log {
            self.log = SessionLog::from_entries(entries, self.log.capacity());
        }
        self.log.append(now, RESUMED_MESSAGE);
    }

    /// Explicitly end the session before its natural expiry.
    /// Returns `false` if there was nothing to stop.
    pub(crate) fn stop(&mut self, now: OffsetDateTime) -> bool {
        if self.end_timestamp.is_none() && !self.is_active {
            return false;
        }
        self.deactivate();
        self.log.append(now, STOPPED_MESSAGE);
        true
    }

    pub(crate) fn deactivate(&mut self) {
        self.end_timestamp = None;
        self.is_active = false;
        self.time_remaining = Duration::ZERO;
        self.hash_rate = 0.0;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_active: self.is_active,
            end_timestamp: self.end_timestamp,
            time_remaining: self.time_remaining,
            cumulative_earnings: self.stats.earnings,
            blocks_found: self.stats.blocks_found,
            hash_rate: self.hash_rate,
            log: self.log.to_vec(),
        }
    }
}

pub(crate) fn remaining_until(end: OffsetDateTime, now: OffsetDateTime) -> Duration {
    let remaining = end - now;
    if remaining.is_positive() {
        remaining.unsigned_abs()
    } else {
        Duration::ZERO
    }
}

/// Read-only view of the session published to the subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub is_active: bool,
    pub end_timestamp: Option<OffsetDateTime>,
    pub time_remaining: Duration,
    pub cumulative_earnings: f64,
    pub blocks_found: u64,
    pub hash_rate: f64,
    pub log: Vec<String>,
}
