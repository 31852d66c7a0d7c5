// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::MiningError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

pub const REFERRAL_BASE_URL: &str = "https://nexus.io/join";
pub const REFERRAL_CODE_PREFIX: &str = "NEXUS";

/// Permanent boost granted for every successful referral.
pub const REFERRAL_BOOST: f64 = 0.1;

/// The parts of the user profile the reward session cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub referral_code: String,
    pub referral_count: u32,

    /// Reward multiplier, never below 1.0.
    pub mining_boost: f64,
}

pub fn referral_code_for(username: &str) -> String {
    format!("{REFERRAL_CODE_PREFIX}{}", username.to_uppercase())
}

impl UserProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, username: &str) -> Self {
        UserProfile {
            id: id.into(),
            name: name.into(),
            referral_code: referral_code_for(username),
            referral_count: 0,
            mining_boost: 1.0,
        }
    }

    #[must_use]
    pub fn with_mining_boost(mut self, mining_boost: f64) -> Self {
        self.mining_boost = mining_boost;
        self
    }

    pub fn ensure_is_valid(&self) -> Result<(), MiningError> {
        if !self.mining_boost.is_finite() || self.mining_boost < 1.0 {
            return Err(MiningError::InvalidMiningBoost {
                boost: self.mining_boost,
            });
        }
        Ok(())
    }

    /// Multiplier applied to every minted reward.
    pub fn reward_multiplier(&self) -> f64 {
        self.mining_boost.max(1.0)
    }

    pub fn boost_percent(&self) -> f64 {
        crate::session::boost_percent(self.reward_multiplier())
    }

    pub fn referral_link(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(REFERRAL_BASE_URL)?;
        url.query_pairs_mut().append_pair("ref", &self.referral_code);
        Ok(url)
    }

    /// Account for a newly referred user.
    pub fn record_referral(&mut self) {
        self.referral_count += 1;
        self.mining_boost = self.reward_multiplier() + REFERRAL_BOOST;
    }

    #[must_use]
    pub fn with_referral(mut self) -> Self {
        self.record_referral();
        self
    }
}

/// Profile shared between the session and whoever may update it,
/// so the multiplier is always read at the time a reward is minted.
#[derive(Debug, Clone)]
pub struct SharedProfile(Arc<RwLock<UserProfile>>);

impl From<UserProfile> for SharedProfile {
    fn from(profile: UserProfile) -> Self {
        SharedProfile(Arc::new(RwLock::new(profile)))
    }
}

impl SharedProfile {
    pub async fn reward_multiplier(&self) -> f64 {
        self.0.read().await.reward_multiplier()
    }

    pub async fn name(&self) -> String {
        self.0.read().await.name.clone()
    }

    pub async fn get(&self) -> UserProfile {
        self.0.read().await.clone()
    }

    pub async fn update<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut UserProfile) -> T,
    {
        f(&mut *self.0.write().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_code_is_derived_from_username() {
        let profile = UserProfile::new("u1", "Alice", "alice_01");
        assert_eq!(profile.referral_code, "NEXUSALICE_01");
        assert_eq!(
            profile.referral_link().unwrap().as_str(),
            "https://nexus.io/join?ref=NEXUSALICE_01"
        );
    }

    #[test]
    fn referrals_increase_the_boost() {
        let profile = UserProfile::new("u1", "Alice", "alice")
            .with_referral()
            .with_referral();
        assert_eq!(profile.referral_count, 2);
        assert!((profile.reward_multiplier() - 1.2).abs() < 1e-9);
        assert!((profile.boost_percent() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn boosts_below_one_are_rejected() {
        let profile = UserProfile::new("u1", "Alice", "alice").with_mining_boost(0.5);
        assert!(profile.ensure_is_valid().is_err());
        assert_eq!(profile.reward_multiplier(), 1.0);
    }

    #[tokio::test]
    async fn shared_profile_sees_updates() {
        let shared = SharedProfile::from(UserProfile::new("u1", "Alice", "alice"));
        let other = shared.clone();
        other.update(|profile| profile.mining_boost = 1.5).await;
        assert_eq!(shared.reward_multiplier().await, 1.5);
    }
}
