// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

pub mod cancellation;
pub mod spawn;

pub use cancellation::manager::ShutdownManager;
pub use cancellation::token::ShutdownToken;
pub use cancellation::tracker::{Cancelled, ShutdownTracker};
pub use spawn::JoinHandle;
