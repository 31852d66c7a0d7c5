// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::spawn::JoinHandle;
use crate::ShutdownToken;
use std::future::Future;
use thiserror::Error;
use tokio_util::task::TaskTracker;
use tracing::trace;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("the task got cancelled before it has finished its execution")]
pub struct Cancelled;

/// Combined [TaskTracker] and [ShutdownToken] for spawning and tracking tasks
/// that should exit once the token gets cancelled.
#[derive(Debug, Clone, Default)]
pub struct ShutdownTracker {
    pub(crate) root_cancellation_token: ShutdownToken,

    pub(crate) tracker: TaskTracker,
}

impl ShutdownTracker {
    pub fn new() -> Self {
        ShutdownTracker::default()
    }

    pub fn new_from_external_shutdown_token(shutdown_token: ShutdownToken) -> Self {
        ShutdownTracker {
            root_cancellation_token: shutdown_token,
            tracker: TaskTracker::new(),
        }
    }

    /// Create a new tracker with its own [TaskTracker] and a token that is a child of this tracker's token.
    /// Cancelling the child does not affect this tracker, but cancelling this tracker cancels the child.
    pub fn child_tracker(&self) -> ShutdownTracker {
        ShutdownTracker {
            root_cancellation_token: self.root_cancellation_token.child_token(),
            tracker: TaskTracker::new(),
        }
    }

    /// Spawn the provided future on the current Tokio runtime and track it.
    #[track_caller]
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }

    /// Spawn the provided future and track it. The name is only used for diagnostics.
    #[track_caller]
    pub fn try_spawn_named<F>(&self, task: F, name: &str) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        trace!("spawning tracked task '{name}'");
        self.tracker.spawn(task)
    }

    /// Spawn the provided future that will get cancelled once the shutdown token is cancelled
    /// and track it.
    #[track_caller]
    pub fn spawn_with_shutdown<F>(&self, task: F) -> JoinHandle<Result<F::Output, Cancelled>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let shutdown_token = self.clone_shutdown_token();
        self.tracker.spawn(async move {
            shutdown_token
                .run_until_cancelled(task)
                .await
                .ok_or(Cancelled)
        })
    }

    /// Waits until the underlying [TaskTracker] is both closed and empty.
    pub async fn wait_for_tracker(&self) {
        self.tracker.wait().await
    }

    /// Close the underlying [TaskTracker]. It does not prevent spawning new tasks.
    pub fn close_tracker(&self) -> bool {
        self.tracker.close()
    }

    pub fn tracked_tasks(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_tracker_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Cancel the token associated with this tracker (and all of its children).
    pub fn cancel(&self) {
        self.root_cancellation_token.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.root_cancellation_token.is_cancelled()
    }

    pub fn clone_shutdown_token(&self) -> ShutdownToken {
        self.root_cancellation_token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn tasks_spawned_with_shutdown_get_cancelled() {
        let tracker = ShutdownTracker::new();
        let handle = tracker.spawn_with_shutdown(async {
            sleep(Duration::from_secs(1000)).await;
        });
        assert_eq!(tracker.tracked_tasks(), 1);

        tracker.cancel();
        let res = handle.await.unwrap();
        assert_eq!(res, Err(Cancelled));

        tracker.close_tracker();
        tracker.wait_for_tracker().await;
        assert!(tracker.is_tracker_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn child_tracker_does_not_cancel_parent() {
        let parent = ShutdownTracker::new();
        let child = parent.child_tracker();

        let parent_task = parent.spawn_with_shutdown(sleep(Duration::from_secs(5)));
        let child_task = child.spawn_with_shutdown(sleep(Duration::from_secs(1000)));

        child.cancel();
        assert_eq!(child_task.await.unwrap(), Err(Cancelled));
        assert!(!parent.is_cancelled());
        assert_eq!(parent_task.await.unwrap(), Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_propagates_to_child() {
        let parent = ShutdownTracker::new();
        let child = parent.child_tracker();

        let child_task = child.spawn_with_shutdown(sleep(Duration::from_secs(1000)));
        parent.cancel();

        assert!(child.is_cancelled());
        assert_eq!(child_task.await.unwrap(), Err(Cancelled));
    }
}
