// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cli::ConfigOverridableArgs;
use crate::config::Config;
use crate::error::MiningError;
use crate::profile::SharedProfile;
use crate::session::{format_hash_rate, format_time_left, RewardSessionManager, SessionSnapshot};
use crate::wallet::WalletLedger;
use nexus_kv_store::FileStore;
use nexus_task::ShutdownManager;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub(crate) config_override: ConfigOverridableArgs,
}

// resolves once the observed session is no longer active
async fn wait_for_session_end(mut updates: watch::Receiver<SessionSnapshot>) {
    loop {
        if !updates.borrow_and_update().is_active {
            return;
        }
        if updates.changed().await.is_err() {
            return;
        }
    }
}

// prints every new log entry of the session as it appears
async fn report_progress(mut updates: watch::Receiver<SessionSnapshot>) {
    let mut last_seen = updates.borrow_and_update().log.first().cloned();
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        let fresh = snapshot
            .log
            .iter()
            .take_while(|entry| Some(*entry) != last_seen.as_ref())
            .collect::<Vec<_>>();
        for entry in fresh.iter().rev() {
            println!(
                "{entry}    [{} left | {} | {:.4} mined in {} blocks]",
                format_time_left(snapshot.time_remaining),
                format_hash_rate(snapshot.hash_rate),
                snapshot.cumulative_earnings,
                snapshot.blocks_found
            );
        }
        if let Some(latest) = snapshot.log.first() {
            last_seen = Some(latest.clone());
        }
    }
}

pub(crate) async fn execute(config: Config) -> Result<(), MiningError> {
    let mut shutdown_manager = ShutdownManager::build_new_default()
        .map_err(|source| MiningError::ShutdownSetupFailure { source })?;

    let store = FileStore::init(&config.storage_paths.session_store).await?;

    let user = config.user_profile();
    let currency = config.mining.currency.clone();
    let ledger = WalletLedger::new(&currency);
    let wallet = ledger
        .create_wallet(
            format!("{}-wallet", user.id),
            "Main Wallet",
            &user.id,
            config.wallet.starting_balance,
        )
        .await;

    let manager = RewardSessionManager::builder(
        user.id.clone(),
        store,
        ledger.clone(),
        SharedProfile::from(user.clone()),
    )
    .with_settings(config.session_settings())
    .with_parent_tracker(shutdown_manager.shutdown_tracker_owned())
    .establish()
    .await;

    if manager.snapshot().await.is_active {
        info!("resumed the previous mining session of {}", user.name);
    } else {
        manager.start().await;
    }
    if user.mining_boost > 1.0 {
        info!("mining with a +{:.0}% boost", user.boost_percent());
    }

    shutdown_manager.spawn_with_shutdown(report_progress(manager.subscribe()));

    tokio::select! {
        _ = shutdown_manager.wait_for_shutdown_signal() => {
            info!("received shutdown signal - the session will resume on the next run");
        }
        _ = wait_for_session_end(manager.subscribe()) => {
            info!("the mining session is over");
        }
    }

    manager.shutdown().await;
    shutdown_manager.perform_shutdown().await;

    let snapshot = manager.snapshot().await;
    match ledger.balance(&wallet.id, &currency).await {
        Ok(balance) => println!(
            "mined {:.4} {currency} in {} blocks, wallet balance: {balance:.4} {currency}",
            snapshot.cumulative_earnings, snapshot.blocks_found
        ),
        Err(err) => warn!("could not read the final wallet balance: {err}"),
    }
    Ok(())
}
