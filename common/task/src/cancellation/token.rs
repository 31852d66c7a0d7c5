// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use std::future::Future;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// A hierarchical cancellation token.
/// Cancelling a token also cancels every token derived from it via [child_token](Self::child_token),
/// but never its parent.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    inner: CancellationToken,
}

impl ShutdownToken {
    pub fn new() -> Self {
        ShutdownToken::default()
    }

    /// Create a token that gets cancelled whenever this token is cancelled.
    pub fn child_token(&self) -> ShutdownToken {
        ShutdownToken {
            inner: self.inner.child_token(),
        }
    }

    /// Cancel this token and all of its children.
    pub fn cancel(&self) {
        self.inner.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Returns a future that completes once this token has been cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.cancelled()
    }

    /// Run the provided future until completion or until the token gets cancelled,
    /// whichever happens first.
    pub async fn run_until_cancelled<F>(&self, fut: F) -> Option<F::Output>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            res = fut => Some(res),
        }
    }
}
