// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::session::PersistenceError;
use nexus_kv_store::FileStoreError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MiningError {
    #[error(
    "failed to load config file using path '{}'. detailed message: {source}", path.display()
    )]
    ConfigLoadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
    "failed to save config file using path '{}'. detailed message: {source}", path.display()
    )]
    ConfigSaveFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to initialise paths")]
    PathInitialisationFailure {
        #[source]
        source: io::Error,
    },

    #[error("there already exists a config file at: {}. if you want to overwrite its content, use --force flag", path.display())]
    ExistingConfig { path: PathBuf },

    #[error("the mining boost must be a finite value of at least 1.0. got: {boost}")]
    InvalidMiningBoost { boost: f64 },

    #[error("invalid mining settings: {reason}")]
    InvalidMiningSettings { reason: String },

    #[error("failed to set up the shutdown signal handlers: {source}")]
    ShutdownSetupFailure {
        #[source]
        source: io::Error,
    },

    #[error("session storage failure: {source}")]
    StorageFailure {
        #[from]
        source: FileStoreError,
    },

    #[error("failed to access the persisted session: {source}")]
    SessionPersistenceFailure {
        #[from]
        source: PersistenceError,
    },
}
