// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

pub mod cli;
pub mod config;
pub mod error;
pub mod profile;
pub mod session;
pub mod wallet;

pub use error::MiningError;
pub use profile::{SharedProfile, UserProfile};
pub use session::{RewardSessionManager, SessionSettings, SessionSnapshot};
pub use wallet::{BalanceError, BalanceMutator, WalletLedger};
