// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

pub type JoinHandle<F> = tokio::task::JoinHandle<F>;
