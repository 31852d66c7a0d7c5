// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::config::Config;
use crate::error::MiningError;
use crate::session::PersistenceBridge;
use nexus_kv_store::FileStore;
use tracing::info;

pub(crate) async fn execute(config: Config) -> Result<(), MiningError> {
    let store = FileStore::init(&config.storage_paths.session_store).await?;
    PersistenceBridge::new(store, config.user.id.clone())
        .purge()
        .await;

    info!("cleared the mining session of {}", config.user.name);
    Ok(())
}
