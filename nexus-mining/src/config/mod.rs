// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::config::r#override::ConfigOverride;
use crate::config::template::CONFIG_TEMPLATE;
use crate::error::MiningError;
use crate::profile::{referral_code_for, UserProfile};
use crate::session::{RewardParameters, SessionSettings, DEFAULT_LOG_CAPACITY};
use crate::wallet::DEFAULT_STARTING_BALANCE;
use nexus_bin_common::logging::LoggingSettings;
use nexus_config::{
    must_get_home, read_config_from_toml_file, save_formatted_config_to_file,
    NexusConfigTemplate, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME, DEFAULT_DATA_DIR, NEXUS_DIR,
};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub mod r#override;
mod template;

const DEFAULT_MINING_DIR: &str = "mining";
const DEFAULT_SESSION_STORE_FILENAME: &str = "session_store.json";

pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_HASH_RATE_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_REWARD_DELAY_BASE: Duration = Duration::from_secs(8);
pub const DEFAULT_REWARD_DELAY_JITTER: Duration = Duration::from_secs(4);
pub const DEFAULT_MAX_BASE_REWARD: f64 = 0.1;
pub const DEFAULT_REWARD_PRECISION: u32 = 4;
pub const DEFAULT_HASH_RATE_BASE: f64 = 2500.0;
pub const DEFAULT_HASH_RATE_SPREAD: f64 = 500.0;
pub const DEFAULT_CURRENCY: &str = "NXG";

// anything beyond this can't be represented by f64 with any meaningful precision anyway
const MAX_REWARD_PRECISION: u32 = 12;
const MAX_SESSION_DURATION: Duration = Duration::from_secs(366 * 24 * 60 * 60);
const MAX_TASK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Get default path to the mining config directory.
/// It should get resolved to `$HOME/.nexus/mining/config`
pub fn default_config_directory() -> PathBuf {
    must_get_home()
        .join(NEXUS_DIR)
        .join(DEFAULT_MINING_DIR)
        .join(DEFAULT_CONFIG_DIR)
}

/// Get default path to the mining config file.
/// It should get resolved to `$HOME/.nexus/mining/config/config.toml`
pub fn default_config_filepath() -> PathBuf {
    default_config_directory().join(DEFAULT_CONFIG_FILENAME)
}

/// Get default path to the mining data directory where the session store is kept.
/// It should get resolved to `$HOME/.nexus/mining/data`
pub fn default_data_directory() -> PathBuf {
    must_get_home()
        .join(NEXUS_DIR)
        .join(DEFAULT_MINING_DIR)
        .join(DEFAULT_DATA_DIR)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    // additional metadata holding on-disk location of this config file
    #[serde(skip)]
    pub(crate) save_path: Option<PathBuf>,

    pub user: UserConfig,

    pub mining: MiningConfig,

    #[serde(default)]
    pub wallet: WalletConfig,

    pub storage_paths: StoragePaths,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl NexusConfigTemplate for Config {
    fn template(&self) -> &'static str {
        CONFIG_TEMPLATE
    }
}

impl Config {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, username: &str) -> Self {
        Config {
            save_path: None,
            user: UserConfig::new(user_id, name, username),
            mining: MiningConfig::default(),
            wallet: WalletConfig::default(),
            storage_paths: StoragePaths::default(),
            logging: LoggingSettings::default(),
        }
    }

    pub fn ensure_is_valid(&self) -> Result<(), MiningError> {
        self.user.ensure_is_valid()?;
        self.mining.ensure_is_valid()?;
        if !self.wallet.starting_balance.is_finite() || self.wallet.starting_balance < 0.0 {
            return Err(MiningError::InvalidMiningSettings {
                reason: format!(
                    "starting balance must be a non-negative number. got: {}",
                    self.wallet.starting_balance
                ),
            });
        }
        Ok(())
    }

    pub fn r#override<O: ConfigOverride>(&mut self, r#override: O) {
        r#override.override_config(self)
    }

    pub fn with_override<O: ConfigOverride>(mut self, r#override: O) -> Self {
        self.r#override(r#override);
        self
    }

    // simple wrapper that reads config file and assigns path location
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, MiningError> {
        let path = path.as_ref();
        let mut loaded: Config = read_config_from_toml_file(path).map_err(|source| {
            MiningError::ConfigLoadFailure {
                path: path.to_path_buf(),
                source,
            }
        })?;
        loaded.ensure_is_valid()?;
        loaded.save_path = Some(path.to_path_buf());
        debug!("loaded config file from {}", path.display());
        Ok(loaded)
    }

    pub fn read_from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, MiningError> {
        Self::read_from_path(path)
    }

    pub fn read_from_toml_file_in_default_location() -> Result<Self, MiningError> {
        Self::read_from_path(Self::default_location())
    }

    pub fn default_location() -> PathBuf {
        default_config_filepath()
    }

    pub fn save_path(&self) -> Option<&Path> {
        self.save_path.as_deref()
    }

    pub fn save_to_default_location(&self) -> io::Result<()> {
        let config_save_location: PathBuf = Self::default_location();
        save_formatted_config_to_file(self, config_save_location)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        save_formatted_config_to_file(self, path)
    }

    pub fn user_profile(&self) -> UserProfile {
        UserProfile {
            id: self.user.id.clone(),
            name: self.user.name.clone(),
            referral_code: self.user.referral_code.clone(),
            referral_count: self.user.referral_count,
            mining_boost: self.user.mining_boost,
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            session_duration: self.mining.session_duration,
            tick_interval: self.mining.tick_interval,
            hash_rate_interval: self.mining.hash_rate_interval,
            log_capacity: self.mining.log_capacity,
            reward: RewardParameters {
                delay_base: self.mining.reward_delay_base,
                delay_jitter: self.mining.reward_delay_jitter,
                max_base_reward: self.mining.max_base_reward,
                reward_precision: self.mining.reward_precision,
                hash_rate_base: self.mining.hash_rate_base,
                hash_rate_spread: self.mining.hash_rate_spread,
                currency: self.mining.currency.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    /// Identifier of the user, used to namespace all persisted session keys.
    pub id: String,

    /// Display name of the user.
    pub name: String,

    pub referral_code: String,

    pub referral_count: u32,

    /// Multiplier applied to every mined reward. Must be at least 1.0.
    pub mining_boost: f64,
}

impl UserConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, username: &str) -> Self {
        UserConfig {
            id: id.into(),
            name: name.into(),
            referral_code: referral_code_for(username),
            referral_count: 0,
            mining_boost: 1.0,
        }
    }

    pub fn ensure_is_valid(&self) -> Result<(), MiningError> {
        if self.id.trim().is_empty() {
            return Err(MiningError::InvalidMiningSettings {
                reason: "the user id must not be empty".to_string(),
            });
        }
        if !self.mining_boost.is_finite() || self.mining_boost < 1.0 {
            return Err(MiningError::InvalidMiningBoost {
                boost: self.mining_boost,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MiningConfig {
    /// Length of a single mining session.
    #[serde(with = "humantime_serde")]
    pub session_duration: Duration,

    /// Cadence of the session clock.
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,

    /// Cadence of the displayed hash rate refresh.
    #[serde(with = "humantime_serde")]
    pub hash_rate_interval: Duration,

    /// Minimum delay between two consecutive rewards.
    #[serde(with = "humantime_serde")]
    pub reward_delay_base: Duration,

    /// Maximum random delay added on top of `reward_delay_base`.
    #[serde(with = "humantime_serde")]
    pub reward_delay_jitter: Duration,

    /// Exclusive upper bound of the base reward, before applying the boost.
    pub max_base_reward: f64,

    /// Number of decimal places of the base reward.
    pub reward_precision: u32,

    pub hash_rate_base: f64,

    pub hash_rate_spread: f64,

    /// Maximum number of retained session log entries.
    pub log_capacity: usize,

    pub currency: String,
}

impl Default for MiningConfig {
    fn default() -> Self {
        MiningConfig {
            session_duration: DEFAULT_SESSION_DURATION,
            tick_interval: DEFAULT_TICK_INTERVAL,
            hash_rate_interval: DEFAULT_HASH_RATE_INTERVAL,
            reward_delay_base: DEFAULT_REWARD_DELAY_BASE,
            reward_delay_jitter: DEFAULT_REWARD_DELAY_JITTER,
            max_base_reward: DEFAULT_MAX_BASE_REWARD,
            reward_precision: DEFAULT_REWARD_PRECISION,
            hash_rate_base: DEFAULT_HASH_RATE_BASE,
            hash_rate_spread: DEFAULT_HASH_RATE_SPREAD,
            log_capacity: DEFAULT_LOG_CAPACITY,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl MiningConfig {
    pub fn ensure_is_valid(&self) -> Result<(), MiningError> {
        let invalid = |reason: &str| {
            Err(MiningError::InvalidMiningSettings {
                reason: reason.to_string(),
            })
        };

        if self.session_duration.is_zero() {
            return invalid("the session duration must be non-zero");
        }
        if self.session_duration > MAX_SESSION_DURATION {
            return invalid("the session duration must not exceed 366 days");
        }
        if self.tick_interval.is_zero() || self.hash_rate_interval.is_zero() {
            return invalid("the tick and hash rate intervals must be non-zero");
        }
        if self.tick_interval > MAX_TASK_INTERVAL || self.hash_rate_interval > MAX_TASK_INTERVAL {
            return invalid("the tick and hash rate intervals must not exceed a day");
        }
        if self.reward_delay_base.is_zero() && self.reward_delay_jitter.is_zero() {
            return invalid("the reward delay must be non-zero");
        }
        if self.reward_delay_base > MAX_TASK_INTERVAL
            || self.reward_delay_jitter > MAX_TASK_INTERVAL
        {
            return invalid("the reward delay base and jitter must not exceed a day");
        }
        if !self.max_base_reward.is_finite() || self.max_base_reward <= 0.0 {
            return invalid("the maximum base reward must be a positive number");
        }
        if self.reward_precision > MAX_REWARD_PRECISION {
            return invalid("the reward precision must not exceed 12 decimal places");
        }
        if !self.hash_rate_base.is_finite()
            || !self.hash_rate_spread.is_finite()
            || self.hash_rate_base < 0.0
            || self.hash_rate_spread < 0.0
        {
            return invalid("the hash rate parameters must be non-negative numbers");
        }
        if self.log_capacity == 0 {
            return invalid("the log capacity must be non-zero");
        }
        if self.currency.trim().is_empty() {
            return invalid("the currency symbol must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalletConfig {
    /// Balance of the reward currency in a newly created wallet.
    pub starting_balance: f64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        WalletConfig {
            starting_balance: DEFAULT_STARTING_BALANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoragePaths {
    /// Path to the file holding the persisted session state.
    pub session_store: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        StoragePaths {
            session_store: default_data_directory().join(DEFAULT_SESSION_STORE_FILENAME),
        }
    }
}
