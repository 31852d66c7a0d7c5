// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::config::Config;
use crate::error::MiningError;
use clap::{Parser, Subcommand};
use nexus_bin_common::logging::{maybe_print_banner, setup_tracing_logger, LoggingSettings};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod init;
mod run;
mod status;
mod stop;

#[derive(Parser, Debug)]
#[clap(author = "Nexus", version, about)]
pub struct Cli {
    /// Specifies custom location for the configuration file of the mining session.
    #[clap(long, global = true, env = "NEXUS_MINING_CONFIG_PATH")]
    pub config_path: Option<PathBuf>,

    /// Flag used for disabling the printed banner in tty.
    #[clap(long, global = true)]
    pub no_banner: bool,

    #[clap(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn execute(self) -> anyhow::Result<()> {
        if !self.no_banner {
            maybe_print_banner(clap::crate_name!(), clap::crate_version!());
        }

        let config_path = self.config_path;
        match self.command {
            Commands::Init(args) => {
                setup_tracing_logger(&LoggingSettings::default());
                init::execute(args, config_path)?
            }
            Commands::Run(args) => {
                let config =
                    load_config(config_path.as_deref())?.with_override(args.config_override);
                config.ensure_is_valid()?;
                setup_tracing_logger(&config.logging);
                run::execute(config).await?
            }
            Commands::Status => {
                let config = load_config(config_path.as_deref())?;
                setup_tracing_logger(&config.logging);
                status::execute(config).await?
            }
            Commands::Stop => {
                let config = load_config(config_path.as_deref())?;
                setup_tracing_logger(&config.logging);
                stop::execute(config).await?
            }
        }
        Ok(())
    }
}

fn load_config(custom_path: Option<&Path>) -> Result<Config, MiningError> {
    match custom_path {
        Some(path) => Config::read_from_toml_file(path),
        None => Config::read_from_toml_file_in_default_location(),
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Initialise the mining configuration of a user
    Init(init::Args),

    /// Start (or resume) the mining session and drive it until it ends or a shutdown signal is received
    Run(run::Args),

    /// Show the state of the persisted mining session
    Status,

    /// End the persisted mining session
    Stop,
}

#[derive(clap::Args, Debug, Default)]
pub struct ConfigOverridableArgs {
    /// Display name of the user.
    #[clap(long)]
    pub name: Option<String>,

    /// Multiplier applied to every mined reward. Must be at least 1.0.
    #[clap(long)]
    pub mining_boost: Option<f64>,

    /// Length of a single mining session, for example `24h`.
    #[clap(long, value_parser = humantime::parse_duration)]
    pub session_duration: Option<Duration>,

    /// Minimum delay between two consecutive rewards.
    #[clap(long, value_parser = humantime::parse_duration)]
    pub reward_delay_base: Option<Duration>,

    /// Maximum random delay added on top of the base reward delay.
    #[clap(long, value_parser = humantime::parse_duration)]
    pub reward_delay_jitter: Option<Duration>,

    /// Exclusive upper bound of a single base reward.
    #[clap(long)]
    pub max_base_reward: Option<f64>,

    /// Balance of a newly created wallet.
    #[clap(long)]
    pub starting_balance: Option<f64>,

    /// Path to the file holding the persisted session state.
    #[clap(long)]
    pub session_store: Option<PathBuf>,
}
