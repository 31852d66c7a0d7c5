// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cli::ConfigOverridableArgs;
use crate::config::Config;

pub trait ConfigOverride {
    fn override_config(self, config: &mut Config);
}

impl ConfigOverride for ConfigOverridableArgs {
    fn override_config(self, config: &mut Config) {
        if let Some(name) = self.name {
            config.user.name = name
        }

        if let Some(mining_boost) = self.mining_boost {
            config.user.mining_boost = mining_boost
        }

        if let Some(session_duration) = self.session_duration {
            config.mining.session_duration = session_duration
        }

        if let Some(reward_delay_base) = self.reward_delay_base {
            config.mining.reward_delay_base = reward_delay_base
        }

        if let Some(reward_delay_jitter) = self.reward_delay_jitter {
            config.mining.reward_delay_jitter = reward_delay_jitter
        }

        if let Some(max_base_reward) = self.max_base_reward {
            config.mining.max_base_reward = max_base_reward
        }

        if let Some(starting_balance) = self.starting_balance {
            config.wallet.starting_balance = starting_balance
        }

        if let Some(session_store) = self.session_store {
            config.storage_paths.session_store = session_store
        }
    }
}
