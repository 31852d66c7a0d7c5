// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::session::state::{remaining_until, RewardSession, SessionStats};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::warn;

/// Source of wall-clock time for the session.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<OffsetDateTime>>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        ManualClock {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    pub fn set(&self, to: OffsetDateTime) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// There is no session to keep track of.
    Idle,

    /// The session is still running.
    Running { remaining: Duration },

    /// This tick has detected the end of the session.
    Expired,
}

/// Human readable length of the session as used in the log, e.g. `24-hour`.
pub(crate) fn session_length_label(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 && secs % 3600 == 0 {
        format!("{}-hour", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}-minute", secs / 60)
    } else {
        format!("{secs}-second")
    }
}

impl RewardSession {
    /// Begin a new session lasting `session_duration`.
    ///
    /// Starting a session while another one is active does nothing and returns `false`.
    /// A session past its end counts as inactive, even if it has not been ticked yet.
    pub fn start(&mut self, now: OffsetDateTime, session_duration: Duration) -> bool {
        if self.is_active_at(now) {
            return false;
        }

        let Some(end) = time::Duration::try_from(session_duration)
            .ok()
            .and_then(|duration| now.checked_add(duration))
        else {
            warn!(
                "a session lasting {session_duration:?} would end beyond the supported time range"
            );
            return false;
        };
        self.end_timestamp = Some(end);
        self.is_active = true;
        self.time_remaining = remaining_until(end, now);
        self.stats = SessionStats::default();
        self.log.clear();
        self.log.append(
            now,
            &format!(
                "{} mining session started... Good luck!",
                session_length_label(session_duration)
            ),
        );
        true
    }

    /// Recompute the remaining time from the stored end timestamp
    /// and detect the expiry of the session.
    pub fn tick(&mut self, now: OffsetDateTime, session_duration: Duration) -> TickOutcome {
        let Some(end) = self.end_timestamp else {
            self.deactivate();
            return TickOutcome::Idle;
        };

        if end <= now {
            self.deactivate();
            self.log.append(
                now,
                &format!(
                    "{} mining session has ended.",
                    session_length_label(session_duration)
                ),
            );
            return TickOutcome::Expired;
        }

        let remaining = remaining_until(end, now);
        self.is_active = true;
        self.time_remaining = remaining;
        TickOutcome::Running { remaining }
    }
}
