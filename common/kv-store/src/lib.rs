// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;

pub mod backend;

pub use backend::fs_backend::{FileStore, FileStoreError};
pub use backend::mem_backend::{InMemoryStore, InMemStorageError};

/// Flat string key-value storage.
/// Any operation is allowed to fail and callers are expected to handle it.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    type StorageError: Error + Send + Sync + 'static;

    async fn get(&self, key: &str) -> Result<Option<String>, Self::StorageError>;

    async fn set(&self, key: &str, value: String) -> Result<(), Self::StorageError>;

    async fn remove(&self, key: &str) -> Result<(), Self::StorageError>;
}

#[async_trait]
impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    type StorageError = S::StorageError;

    async fn get(&self, key: &str) -> Result<Option<String>, Self::StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), Self::StorageError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), Self::StorageError> {
        (**self).remove(key).await
    }
}
