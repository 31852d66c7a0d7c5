// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cancellation::tracker::{Cancelled, ShutdownTracker};
use crate::spawn::JoinHandle;
use crate::ShutdownToken;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{error, info, warn};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Process-level owner of the root [ShutdownToken].
///
/// It listens for the registered shutdown triggers and, once any of them fires, cancels
/// every task spawned through its [ShutdownTracker] (and all trackers derived from it).
pub struct ShutdownManager {
    /// Named futures, the first one to complete starts the shutdown.
    triggers: JoinSet<&'static str>,

    tracker: ShutdownTracker,

    /// How long the tracked tasks are given to exit once cancelled.
    grace_period: Duration,
}

impl ShutdownManager {
    /// Manager reacting to SIGINT, SIGTERM and SIGQUIT (only SIGINT on non-unix targets)
    /// as well as to any panic.
    pub fn build_new_default() -> std::io::Result<Self> {
        let manager = ShutdownManager::new_without_signals()
            .with_shutdown("SIGINT", async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    error!("failed to listen for SIGINT: {err}");
                    std::future::pending::<()>().await
                }
            })
            .with_cancel_on_panic();

        cfg_if::cfg_if! {
            if #[cfg(unix)] {
                manager
                    .with_unix_signal("SIGTERM", SignalKind::terminate())?
                    .with_unix_signal("SIGQUIT", SignalKind::quit())
            } else {
                Ok(manager)
            }
        }
    }

    /// Manager whose shutdown can only be triggered by cancelling its root token.
    pub fn new_without_signals() -> Self {
        Self::new_from_external_shutdown_token(ShutdownToken::new())
    }

    pub fn new_from_external_shutdown_token(shutdown_token: ShutdownToken) -> Self {
        let root = shutdown_token.clone();
        ShutdownManager {
            triggers: JoinSet::new(),
            tracker: ShutdownTracker::new_from_external_shutdown_token(shutdown_token),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
        .with_shutdown("root cancellation", async move { root.cancelled().await })
    }

    /// Register an additional future that triggers the shutdown once it completes.
    #[must_use]
    pub fn with_shutdown<F>(mut self, name: &'static str, trigger: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown_token = self.tracker.clone_shutdown_token();
        self.triggers.spawn(async move {
            trigger.await;
            shutdown_token.cancel();
            name
        });
        self
    }

    #[cfg(unix)]
    pub fn with_unix_signal(self, name: &'static str, kind: SignalKind) -> std::io::Result<Self> {
        let mut stream = signal(kind)?;
        Ok(self.with_shutdown(name, async move {
            stream.recv().await;
        }))
    }

    /// Cancel the root token whenever any thread panics, after running the previous hook.
    #[must_use]
    pub fn with_cancel_on_panic(self) -> Self {
        let previous_hook = std::panic::take_hook();
        let shutdown_token = self.tracker.clone_shutdown_token();

        std::panic::set_hook(Box::new(move |panic_info| {
            previous_hook(panic_info);
            let location = panic_info
                .location()
                .map(ToString::to_string)
                .unwrap_or_else(|| "<unknown>".to_string());
            error!("panicked at {location}. cancelling all tasks");
            shutdown_token.cancel();
        }));
        self
    }

    #[must_use]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Spawn a tracked task that gets dropped at its next await point once the shutdown begins.
    #[track_caller]
    pub fn spawn_with_shutdown<F>(&self, task: F) -> JoinHandle<Result<F::Output, Cancelled>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn_with_shutdown(task)
    }

    pub fn is_cancelled(&self) -> bool {
        self.tracker.is_cancelled()
    }

    pub fn shutdown_tracker(&self) -> &ShutdownTracker {
        &self.tracker
    }

    pub fn shutdown_tracker_owned(&self) -> ShutdownTracker {
        self.tracker.clone()
    }

    pub fn clone_shutdown_token(&self) -> ShutdownToken {
        self.tracker.clone_shutdown_token()
    }

    /// Resolves once any of the registered triggers fires. Cancellation safe.
    pub async fn wait_for_shutdown_signal(&mut self) {
        match self.triggers.join_next().await {
            Some(Ok(name)) => info!("received {name} - shutting down"),
            Some(Err(err)) => warn!("shutdown trigger has failed: {err}"),
            // no triggers means nothing could ever start the shutdown
            None => std::future::pending().await,
        }
    }

    /// Cancel all tracked tasks and wait for them for at most the grace period.
    /// Another SIGINT cuts the wait short.
    pub async fn perform_shutdown(&mut self) {
        self.tracker.cancel();
        self.tracker.close_tracker();
        info!("waiting for tasks to finish... (press ctrl-c to force)");

        tokio::select! {
            _ = self.tracker.wait_for_tracker() => {
                info!("all tracked tasks have finished");
            }
            _ = sleep(self.grace_period) => {
                warn!("tasks did not finish within {:?} - forcing shutdown", self.grace_period);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received another interrupt - forcing shutdown");
            }
        }
    }

    pub async fn run_until_shutdown(&mut self) {
        self.tracker.close_tracker();
        self.wait_for_shutdown_signal().await;
        self.perform_shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn nothing_happens_without_a_trigger() {
        let mut manager = ShutdownManager::new_without_signals();
        let res = timeout(Duration::from_secs(60), manager.run_until_shutdown()).await;
        assert!(res.is_err());
        assert!(!manager.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_cancels_tracked_tasks() {
        let mut manager = ShutdownManager::new_without_signals()
            .with_shutdown("timer", sleep(Duration::from_secs(5)));

        let finished = Arc::new(AtomicBool::new(false));
        let finished_clone = Arc::clone(&finished);
        let task = manager.spawn_with_shutdown(async move {
            sleep(Duration::from_secs(3600)).await;
            finished_clone.store(true, Ordering::SeqCst);
        });

        manager.run_until_shutdown().await;
        assert!(manager.is_cancelled());
        assert!(matches!(task.await, Ok(Err(Cancelled))));
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_the_root_token_starts_the_shutdown() {
        let mut manager = ShutdownManager::new_without_signals();
        let token = manager.clone_shutdown_token();
        manager.spawn_with_shutdown(async move {
            sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let res = timeout(Duration::from_secs(1), manager.run_until_shutdown()).await;
        assert!(res.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn stubborn_tasks_are_abandoned_after_the_grace_period() {
        let mut manager = ShutdownManager::new_without_signals()
            .with_shutdown("timer", sleep(Duration::from_millis(50)))
            .with_grace_period(Duration::from_secs(2));

        // not cancellable
        manager
            .shutdown_tracker()
            .spawn(sleep(Duration::from_secs(3600)));

        let res = timeout(Duration::from_secs(5), manager.run_until_shutdown()).await;
        assert!(res.is_ok());
        assert!(!manager.shutdown_tracker().is_tracker_empty());
    }
}
