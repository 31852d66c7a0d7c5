// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::config::Config;
use crate::error::MiningError;
use crate::session::{format_time_left, PersistenceBridge, StoredSession};
use nexus_kv_store::FileStore;
use time::OffsetDateTime;

const DISPLAYED_LOG_ENTRIES: usize = 10;

pub(crate) async fn execute(config: Config) -> Result<(), MiningError> {
    let store = FileStore::init(&config.storage_paths.session_store).await?;
    let persistence = PersistenceBridge::new(store, config.user.id.clone());

    let now = OffsetDateTime::now_utc();
    match persistence.load(now).await? {
        StoredSession::Missing => println!("there is no mining session of {}", config.user.name),
        StoredSession::Expired { end_timestamp } => {
            println!("the last mining session has ended at {end_timestamp}")
        }
        StoredSession::Running {
            end_timestamp,
            stats,
            log,
        } => {
            let stats = stats.unwrap_or_default();
            println!("mining session is active until {end_timestamp}");
            println!("time left: {}", format_time_left((end_timestamp - now).unsigned_abs()));
            println!(
                "mined: {:.4} {} in {} blocks",
                stats.earnings, config.mining.currency, stats.blocks_found
            );
            for entry in log.unwrap_or_default().iter().take(DISPLAYED_LOG_ENTRIES) {
                println!("  {entry}");
            }
        }
    }
    Ok(())
}
