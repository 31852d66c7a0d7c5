// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::KeyValueStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("the provided store path '{}' doesn't have a filename defined", provided_path.display())]
    PathWithoutFilename { provided_path: PathBuf },

    #[error("unable to create the directory for the store at {}: {source}", provided_path.display())]
    UnableToCreateParentDirectory {
        provided_path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read the store file at {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write the store file at {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("the store file at {} is malformed: {source}", path.display())]
    MalformedStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Store persisted as a single JSON object on disk.
/// Every mutation rewrites the whole file through a temporary file and a rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,

    // serialises read-modify-write cycles of this instance
    write_lock: Mutex<()>,
}

impl FileStore {
    pub async fn init<P: AsRef<Path>>(path: P) -> Result<Self, FileStoreError> {
        let path = path.as_ref().to_path_buf();
        if path.file_name().is_none() {
            return Err(FileStoreError::PathWithoutFilename {
                provided_path: path,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|source| {
                FileStoreError::UnableToCreateParentDirectory {
                    provided_path: path.clone(),
                    source,
                }
            })?;
        }

        debug!("using key-value store at {}", path.display());
        Ok(FileStore {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, FileStoreError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                trace!("{} does not exist yet", self.path.display());
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(FileStoreError::ReadFailure {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if raw.is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_slice(&raw).map_err(|source| FileStoreError::MalformedStore {
            path: self.path.clone(),
            source,
        })
    }

    async fn persist(&self, content: &BTreeMap<String, String>) -> Result<(), FileStoreError> {
        let write_err = |source| FileStoreError::WriteFailure {
            path: self.path.clone(),
            source,
        };

        let serialised = serde_json::to_vec_pretty(content)
            .map_err(io::Error::from)
            .map_err(write_err)?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, serialised).await.map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).await.map_err(write_err)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    type StorageError = FileStoreError;

    async fn get(&self, key: &str) -> Result<Option<String>, Self::StorageError> {
        let mut content = self.load().await?;
        Ok(content.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), Self::StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut content = self.load().await?;
        content.insert(key.to_string(), value);
        self.persist(&content).await
    }

    async fn remove(&self, key: &str) -> Result<(), Self::StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut content = self.load().await?;
        if content.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&content).await
    }
}
