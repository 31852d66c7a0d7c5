// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use nexus_task::ShutdownTracker;
use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Runs all periodic tasks of a single session on one child tracker,
/// so that they can be torn down together.
///
/// Task bodies are never interrupted: cancellation is only observed
/// while a task is waiting for its next firing.
pub struct SessionScheduler {
    tracker: ShutdownTracker,
}

impl SessionScheduler {
    pub fn new(parent: &ShutdownTracker) -> Self {
        SessionScheduler {
            tracker: parent.child_tracker(),
        }
    }

    /// Run `task` every `period`, starting one period from now, until it breaks
    /// or the scheduler is cancelled.
    pub fn spawn_periodic<F, Fut>(&self, name: &'static str, period: Duration, mut task: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        if period.is_zero() {
            warn!("refusing to schedule '{name}' with a zero period");
            return;
        }

        let shutdown_token = self.tracker.clone_shutdown_token();
        self.tracker.try_spawn_named(
            async move {
                let Some(first_tick) = Instant::now().checked_add(period) else {
                    warn!("'{name}' has a period of {period:?} which is out of range");
                    return;
                };
                let mut interval = interval_at(first_tick, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    if shutdown_token
                        .run_until_cancelled(interval.tick())
                        .await
                        .is_none()
                    {
                        debug!("{name}: received shutdown");
                        break;
                    }
                    if task().await.is_break() {
                        debug!("{name}: finished");
                        break;
                    }
                }
            },
            name,
        );
    }

    /// Run `task` after `first_delay`. Every run decides the delay until the next one.
    pub fn spawn_rearming<F, Fut>(&self, name: &'static str, first_delay: Duration, mut task: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<(), Duration>> + Send + 'static,
    {
        let shutdown_token = self.tracker.clone_shutdown_token();
        self.tracker.try_spawn_named(
            async move {
                let mut delay = first_delay;
                loop {
                    if shutdown_token
                        .run_until_cancelled(sleep(delay))
                        .await
                        .is_none()
                    {
                        debug!("{name}: received shutdown");
                        break;
                    }
                    match task().await {
                        ControlFlow::Continue(next) => delay = next,
                        ControlFlow::Break(()) => {
                            debug!("{name}: finished");
                            break;
                        }
                    }
                }
            },
            name,
        );
    }

    /// Cancel every task of the session. Does not wait for them to exit.
    pub fn cancel_all(&self) {
        self.tracker.cancel();
        self.tracker.close_tracker();
    }

    pub fn is_cancelled(&self) -> bool {
        self.tracker.is_cancelled()
    }

    pub fn tracked_tasks(&self) -> usize {
        self.tracker.tracked_tasks()
    }

    pub fn is_running(&self) -> bool {
        !self.tracker.is_cancelled() && !self.tracker.is_tracker_empty()
    }

    /// Wait for all the tasks to exit. Must not be called from within one of them.
    pub async fn wait_until_stopped(&self) {
        self.tracker.close_tracker();
        self.tracker.wait_for_tracker().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_periodic(
        counter: &Arc<AtomicUsize>,
    ) -> impl FnMut() -> std::future::Ready<ControlFlow<()>> {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(ControlFlow::Continue(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_task_fires_once_per_period() {
        let scheduler = SessionScheduler::new(&ShutdownTracker::new());
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.spawn_periodic("counter", Duration::from_secs(1), counting_periodic(&counter));

        sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(3)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_period_ends_the_task() {
        let scheduler = SessionScheduler::new(&ShutdownTracker::new());
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.spawn_periodic("forever", Duration::MAX, counting_periodic(&counter));

        scheduler.wait_until_stopped().await;
        assert_eq!(scheduler.tracked_tasks(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_task_uses_returned_delay() {
        let scheduler = SessionScheduler::new(&ShutdownTracker::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let task_counter = Arc::clone(&counter);
        scheduler.spawn_rearming("rearming", Duration::from_secs(2), move || {
            let fired = task_counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(if fired == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(Duration::from_secs(5))
            })
        });

        sleep(Duration::from_millis(2500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        scheduler.wait_until_stopped().await;
        assert_eq!(scheduler.tracked_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_stops_every_task() {
        let scheduler = SessionScheduler::new(&ShutdownTracker::new());
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.spawn_periodic("first", Duration::from_secs(1), counting_periodic(&counter));
        scheduler.spawn_periodic("second", Duration::from_secs(1), counting_periodic(&counter));
        assert!(scheduler.is_running());
        assert_eq!(scheduler.tracked_tasks(), 2);

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        scheduler.cancel_all();
        scheduler.wait_until_stopped().await;
        assert!(!scheduler.is_running());

        sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_parent_cancels_the_scheduler() {
        let parent = ShutdownTracker::new();
        let scheduler = SessionScheduler::new(&parent);
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.spawn_periodic("child", Duration::from_secs(1), counting_periodic(&counter));

        parent.cancel();
        scheduler.wait_until_stopped().await;
        assert!(scheduler.is_cancelled());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
