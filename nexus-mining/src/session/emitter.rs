// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::session::state::RewardSession;
use rand::Rng;
use std::time::Duration;
use time::OffsetDateTime;

/// Tunables of the reward emission and the displayed hash rate.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardParameters {
    /// Minimum delay between two consecutive rewards.
    pub delay_base: Duration,

    /// Upper bound of the random delay added on top of `delay_base`.
    pub delay_jitter: Duration,

    /// Exclusive upper bound of the base (pre-multiplier) reward.
    pub max_base_reward: f64,

    /// Number of decimal places the base reward is truncated to, also used for display.
    pub reward_precision: u32,

    pub hash_rate_base: f64,
    pub hash_rate_spread: f64,

    /// Symbol of the rewarded currency.
    pub currency: String,
}

impl Default for RewardParameters {
    fn default() -> Self {
        RewardParameters {
            delay_base: Duration::from_secs(8),
            delay_jitter: Duration::from_secs(4),
            max_base_reward: 0.1,
            reward_precision: 4,
            hash_rate_base: 2500.0,
            hash_rate_spread: 500.0,
            currency: "NXG".to_string(),
        }
    }
}

impl RewardParameters {
    /// Delay until the next reward, uniformly drawn from `[delay_base, delay_base + delay_jitter)`.
    pub fn next_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.delay_jitter.is_zero() {
            return self.delay_base;
        }
        self.delay_base.saturating_add(self.delay_jitter.mul_f64(rng.gen::<f64>()))
    }

    /// Base reward uniformly drawn from `[0, max_base_reward)`,
    /// truncated to `reward_precision` decimals.
    pub fn draw_base_reward<R: Rng>(&self, rng: &mut R) -> f64 {
        if self.max_base_reward.partial_cmp(&0.0) != Some(std::cmp::Ordering::Greater) {
            return 0.0;
        }
        let raw = rng.gen_range(0.0..self.max_base_reward);
        let scale = 10f64.powi(self.reward_precision as i32);
        (raw * scale).floor() / scale
    }

    /// Purely cosmetic hash rate in `[hash_rate_base, hash_rate_base + hash_rate_spread)`,
    /// scaled by the multiplier.
    pub fn draw_hash_rate<R: Rng>(&self, rng: &mut R, multiplier: f64) -> f64 {
        (self.hash_rate_base + rng.gen::<f64>() * self.hash_rate_spread) * multiplier
    }
}

pub fn boost_percent(multiplier: f64) -> f64 {
    (multiplier - 1.0) * 100.0
}

/// A single reward, before it gets credited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MintedReward {
    pub base: f64,
    pub multiplier: f64,
    pub amount: f64,
}

impl MintedReward {
    pub fn new(base: f64, multiplier: f64) -> Self {
        MintedReward {
            base,
            multiplier,
            amount: base * multiplier,
        }
    }

    pub fn is_boosted(&self) -> bool {
        self.multiplier > 1.0
    }

    pub fn log_message(&self, currency: &str, precision: u32) -> String {
        let message = format!(
            "Block found! +{:.*} {currency} rewarded.",
            precision as usize, self.amount
        );
        if self.is_boosted() {
            format!(
                "{message} (w/ +{:.0}% boost)",
                boost_percent(self.multiplier)
            )
        } else {
            message
        }
    }
}

impl RewardSession {
    /// Account for a reward that has already been credited.
    /// Returns `false`, leaving the session untouched, if the session is not active.
    pub fn record_block(
        &mut self,
        now: OffsetDateTime,
        reward: &MintedReward,
        params: &RewardParameters,
    ) -> bool {
        if !self.is_active {
            return false;
        }

        self.stats.blocks_found += 1;
        self.stats.earnings += reward.amount;
        self.log.append(
            now,
            &reward.log_message(&params.currency, params.reward_precision),
        );
        true
    }

    pub fn set_hash_rate(&mut self, hash_rate: f64) {
        self.hash_rate = if self.is_active { hash_rate } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use time::macros::datetime;

    #[test]
    fn base_reward_is_truncated_to_the_precision() {
        let params = RewardParameters {
            max_base_reward: 1.0,
            reward_precision: 0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..1000 {
            assert_eq!(params.draw_base_reward(&mut rng), 0.0);
        }
    }

    #[test]
    fn huge_delays_saturate() {
        let params = RewardParameters {
            delay_base: Duration::MAX,
            delay_jitter: Duration::from_secs(4),
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(params.next_delay(&mut rng), Duration::MAX);
    }

    #[test]
    fn delays_stay_within_the_jitter_window() {
        let params = RewardParameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..1000 {
            let delay = params.next_delay(&mut rng);
            assert!(delay >= Duration::from_secs(8));
            assert!(delay < Duration::from_secs(12));
        }
    }

    #[test]
    fn base_rewards_are_truncated_and_bounded() {
        let params = RewardParameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..1000 {
            let reward = params.draw_base_reward(&mut rng);
            assert!((0.0..0.1).contains(&reward));
            let scaled = reward * 10_000.0;
            assert!((scaled - scaled.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn hash_rate_is_scaled_by_multiplier() {
        let params = RewardParameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            let rate = params.draw_hash_rate(&mut rng, 2.0);
            assert!((5000.0..6000.0).contains(&rate));
        }
    }

    #[test]
    fn unboosted_message_has_no_suffix() {
        let reward = MintedReward::new(0.0421, 1.0);
        assert_eq!(
            reward.log_message("NXG", 4),
            "Block found! +0.0421 NXG rewarded."
        );
    }

    #[test]
    fn boosted_message_reports_percentage() {
        let reward = MintedReward::new(0.08, 1.5);
        assert_eq!(
            reward.log_message("NXG", 4),
            "Block found! +0.1200 NXG rewarded. (w/ +50% boost)"
        );
    }

    #[test]
    fn rewards_are_not_recorded_for_inactive_session() {
        let now = datetime!(2026-03-01 10:00:00 UTC);
        let mut session = RewardSession::new_idle(now, 100);
        let reward = MintedReward::new(0.05, 1.0);

        assert!(!session.record_block(now, &reward, &RewardParameters::default()));
        assert_eq!(session.blocks_found(), 0);
        assert_eq!(session.log().len(), 1);

        session.set_hash_rate(2750.0);
        assert_eq!(session.hash_rate(), 0.0);
    }
}
