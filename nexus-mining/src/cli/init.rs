// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cli::ConfigOverridableArgs;
use crate::config::{default_config_directory, default_data_directory, Config};
use crate::error::MiningError;
use std::path::PathBuf;
use std::{fs, io};
use tracing::info;

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    config_override: ConfigOverridableArgs,

    /// Identifier of the user owning the mining session.
    #[clap(long)]
    id: String,

    /// Username of the user, used for deriving the referral code.
    #[clap(long)]
    username: String,

    /// Overwrite existing configuration file.
    #[clap(long, short)]
    force: bool,
}

fn init_paths() -> io::Result<()> {
    fs::create_dir_all(default_data_directory())?;
    fs::create_dir_all(default_config_directory())
}

pub(crate) fn execute(args: Args, custom_config_path: Option<PathBuf>) -> Result<(), MiningError> {
    let path = custom_config_path.unwrap_or_else(Config::default_location);

    if path.exists() && !args.force {
        return Err(MiningError::ExistingConfig { path });
    }

    init_paths().map_err(|source| MiningError::PathInitialisationFailure { source })?;

    let config = Config::new(args.id, args.username.clone(), &args.username)
        .with_override(args.config_override);
    config.ensure_is_valid()?;

    config
        .save_to_path(&path)
        .map_err(|source| MiningError::ConfigSaveFailure {
            path: path.clone(),
            source,
        })?;

    info!("saved the mining configuration to {}", path.display());
    Ok(())
}
