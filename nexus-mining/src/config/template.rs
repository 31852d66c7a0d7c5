// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

// While using normal toml marshalling would have been way simpler with less overhead,
// it's useful to have comments attached to the saved config file to explain behaviour of
// particular fields.
// Note: any changes to the template must be reflected in the appropriate structs.
pub(crate) const CONFIG_TEMPLATE: &str = r#"
# This is a TOML config file.
# For more information, see https://github.com/toml-lang/toml

[user]
# Identifier of the user. All persisted session keys are namespaced with it.
id = '{{ user.id }}'

# Display name of the user.
name = '{{ user.name }}'

referral_code = '{{ user.referral_code }}'

referral_count = {{ user.referral_count }}

# Multiplier applied to every mined reward. Must be at least 1.0.
# Every successful referral permanently increases it by 0.1.
mining_boost = {{ user.mining_boost }}

[mining]
# Length of a single mining session.
session_duration = '{{ mining.session_duration }}'

# How often the remaining session time gets recomputed.
tick_interval = '{{ mining.tick_interval }}'

# How often the displayed hash rate gets refreshed.
hash_rate_interval = '{{ mining.hash_rate_interval }}'

# Rewards are mined every `reward_delay_base` plus a random delay of up to `reward_delay_jitter`.
reward_delay_base = '{{ mining.reward_delay_base }}'
reward_delay_jitter = '{{ mining.reward_delay_jitter }}'

# Exclusive upper bound of a single base reward, before the boost gets applied.
max_base_reward = {{ mining.max_base_reward }}

# Number of decimal places of the base reward.
reward_precision = {{ mining.reward_precision }}

# The displayed hash rate is drawn from [hash_rate_base, hash_rate_base + hash_rate_spread)
# and scaled by the mining boost.
hash_rate_base = {{ mining.hash_rate_base }}
hash_rate_spread = {{ mining.hash_rate_spread }}

# Maximum number of retained session log entries.
log_capacity = {{ mining.log_capacity }}

currency = '{{ mining.currency }}'

[wallet]
# Balance of a newly created wallet.
starting_balance = {{ wallet.starting_balance }}

[storage_paths]
# Path to the file holding the persisted session state.
session_store = '{{ storage_paths.session_store }}'

[logging]
# Log directive used whenever `RUST_LOG` is not set.
default_directive = '{{ logging.default_directive }}'
"#;
