// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

pub mod clock;
pub mod display;
pub mod emitter;
pub mod journal;
pub mod manager;
pub mod persistence;
pub mod scheduler;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock, TickOutcome};
pub use display::{format_hash_rate, format_time_left};
pub use emitter::{boost_percent, MintedReward, RewardParameters};
pub use journal::{SessionLog, DEFAULT_LOG_CAPACITY};
pub use manager::{
    RewardOutcome, RewardSessionManager, RewardSessionManagerBuilder, SessionSettings,
};
pub use persistence::{PersistenceBridge, PersistenceError, RestoreOutcome, StoredSession};
pub use scheduler::SessionScheduler;
pub use state::{RewardSession, SessionSnapshot, SessionStats};
