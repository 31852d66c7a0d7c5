// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::session::state::{RewardSession, SessionStats};
use nexus_kv_store::KeyValueStore;
use std::error::Error;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, error, instrument, trace};

const END_TIME_KEY_PREFIX: &str = "nexus-mining-endTime";
const STATS_KEY_PREFIX: &str = "nexus-mining-stats";
const LOG_KEY_PREFIX: &str = "nexus-mining-log";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("the underlying storage has failed: {source}")]
    Storage {
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    #[error("the stored session end time '{raw}' is not a valid unix timestamp")]
    MalformedEndTime { raw: String },

    #[error("the stored session end time is out of range: {source}")]
    EndTimeOutOfRange {
        #[from]
        source: time::error::ComponentRange,
    },

    #[error("failed to (de)serialize the stored {field}: {source}")]
    Serialization {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    fn storage<E: Error + Send + Sync + 'static>(source: E) -> Self {
        PersistenceError::Storage {
            source: Box::new(source),
        }
    }
}

/// Session state as found in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredSession {
    /// There is no end time persisted.
    Missing,

    /// The persisted session has already finished.
    Expired { end_timestamp: OffsetDateTime },

    /// The persisted session is still running.
    Running {
        end_timestamp: OffsetDateTime,
        stats: Option<SessionStats>,
        log: Option<Vec<String>>,
    },
}

/// Result of restoring the session when the user context gets established.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    /// Nothing to restore, any leftover keys were removed.
    NoSession,

    /// The stored session had already ended, all of its keys were removed.
    Expired,

    /// The stored session is still running and should be resumed.
    Resumed {
        end_timestamp: OffsetDateTime,
        stats: Option<SessionStats>,
        log: Option<Vec<String>>,
    },

    /// The store could not be read, the session falls back to idle.
    Failed,
}

/// Writes the session state of a single user through to the store and reads it back.
/// None of its public operations fail: errors are reported and swallowed.
pub struct PersistenceBridge<S> {
    store: S,
    user_id: String,
}

impl<S> PersistenceBridge<S>
where
    S: KeyValueStore,
{
    pub fn new(store: S, user_id: impl Into<String>) -> Self {
        PersistenceBridge {
            store,
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn end_time_key(&self) -> String {
        format!("{END_TIME_KEY_PREFIX}-{}", self.user_id)
    }

    pub fn stats_key(&self) -> String {
        format!("{STATS_KEY_PREFIX}-{}", self.user_id)
    }

    pub fn log_key(&self) -> String {
        format!("{LOG_KEY_PREFIX}-{}", self.user_id)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.store.get(key).await.map_err(PersistenceError::storage)
    }

    /// Read the stored session without modifying the store.
    pub async fn load(&self, now: OffsetDateTime) -> Result<StoredSession, PersistenceError> {
        let Some(raw_end) = self.get(&self.end_time_key()).await? else {
            return Ok(StoredSession::Missing);
        };
        let end_timestamp = decode_end_time(&raw_end)?;
        if end_timestamp <= now {
            return Ok(StoredSession::Expired { end_timestamp });
        }

        let stats: Option<SessionStats> = self
            .get(&self.stats_key())
            .await?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|source| PersistenceError::Serialization {
                field: "session stats",
                source,
            })?;

        let log: Option<Vec<String>> = self
            .get(&self.log_key())
            .await?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|source| PersistenceError::Serialization {
                field: "session log",
                source,
            })?;

        Ok(StoredSession::Running {
            end_timestamp,
            stats,
            log,
        })
    }

    async fn try_restore(&self, now: OffsetDateTime) -> Result<RestoreOutcome, PersistenceError> {
        match self.load(now).await? {
            StoredSession::Running {
                end_timestamp,
                stats,
                log,
            } => Ok(RestoreOutcome::Resumed {
                end_timestamp,
                stats,
                log,
            }),
            StoredSession::Expired { end_timestamp } => {
                debug!("the stored session has ended at {end_timestamp}");
                self.try_purge().await?;
                Ok(RestoreOutcome::Expired)
            }
            StoredSession::Missing => {
                self.try_purge().await?;
                Ok(RestoreOutcome::NoSession)
            }
        }
    }

    /// Read back the persisted session, removing any leftovers of a finished one.
    #[instrument(skip(self), fields(user = %self.user_id))]
    pub async fn restore(&self, now: OffsetDateTime) -> RestoreOutcome {
        match self.try_restore(now).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("failed to load the mining state: {err}");
                RestoreOutcome::Failed
            }
        }
    }

    async fn try_write_through(&self, session: &RewardSession) -> Result<(), PersistenceError> {
        let stats = serde_json::to_string(&session.stats()).map_err(|source| {
            PersistenceError::Serialization {
                field: "session stats",
                source,
            }
        })?;
        let log = serde_json::to_string(&session.log().to_vec()).map_err(|source| {
            PersistenceError::Serialization {
                field: "session log",
                source,
            }
        })?;

        self.store
            .set(&self.stats_key(), stats)
            .await
            .map_err(PersistenceError::storage)?;
        self.store
            .set(&self.log_key(), log)
            .await
            .map_err(PersistenceError::storage)?;
        if let Some(end) = session.end_timestamp() {
            self.store
                .set(&self.end_time_key(), encode_end_time(end))
                .await
                .map_err(PersistenceError::storage)?;
        }
        Ok(())
    }

    /// Persist the session if it's active. Inactive sessions are never written.
    #[instrument(skip_all, fields(user = %self.user_id))]
    pub async fn write_through(&self, session: &RewardSession) {
        if !session.is_active() {
            trace!("session is not active - not persisting it");
            return;
        }
        if let Err(err) = self.try_write_through(session).await {
            error!("failed to save the mining state: {err}");
        }
    }

    async fn try_purge(&self) -> Result<(), PersistenceError> {
        for key in [self.end_time_key(), self.stats_key(), self.log_key()] {
            self.store
                .remove(&key)
                .await
                .map_err(PersistenceError::storage)?;
        }
        Ok(())
    }

    /// Remove every persisted key of the session.
    #[instrument(skip(self), fields(user = %self.user_id))]
    pub async fn purge(&self) {
        if let Err(err) = self.try_purge().await {
            error!("failed to clear the mining state: {err}");
        }
    }
}

// the end time is kept as unix milliseconds
fn encode_end_time(end: OffsetDateTime) -> String {
    (end.unix_timestamp_nanos() / 1_000_000).to_string()
}

fn decode_end_time(raw: &str) -> Result<OffsetDateTime, PersistenceError> {
    let malformed = || PersistenceError::MalformedEndTime {
        raw: raw.to_string(),
    };
    let millis: i128 = raw.trim().parse().map_err(|_| malformed())?;
    let nanos = millis.checked_mul(1_000_000).ok_or_else(malformed)?;
    Ok(OffsetDateTime::from_unix_timestamp_nanos(nanos)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_kv_store::InMemoryStore;
    use std::time::Duration;
    use time::macros::datetime;

    fn bridge() -> (InMemoryStore, PersistenceBridge<InMemoryStore>) {
        let store = InMemoryStore::new();
        (store.clone(), PersistenceBridge::new(store, "u1"))
    }

    #[test]
    fn keys_are_namespaced_by_user() {
        let (_, bridge) = bridge();
        assert_eq!(bridge.end_time_key(), "nexus-mining-endTime-u1");
        assert_eq!(bridge.stats_key(), "nexus-mining-stats-u1");
        assert_eq!(bridge.log_key(), "nexus-mining-log-u1");
    }

    #[test]
    fn end_time_is_stored_as_unix_millis() {
        let end = datetime!(2026-03-01 10:00:00.123 UTC);
        let encoded = encode_end_time(end);
        assert_eq!(encoded, "1772359200123");
        assert_eq!(decode_end_time(&encoded).unwrap(), end);
        assert!(matches!(
            decode_end_time("yesterday"),
            Err(PersistenceError::MalformedEndTime { .. })
        ));
    }

    #[tokio::test]
    async fn inactive_sessions_are_not_written() {
        let (store, bridge) = bridge();
        let session = RewardSession::new_idle(datetime!(2026-03-01 10:00:00 UTC), 100);

        bridge.write_through(&session).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn active_session_round_trips_through_the_store() {
        let (_, bridge) = bridge();
        let now = datetime!(2026-03-01 10:00:00 UTC);
        let mut session = RewardSession::new_idle(now, 100);
        session.start(now, Duration::from_secs(3600));

        bridge.write_through(&session).await;

        let later = now + Duration::from_secs(60);
        assert_eq!(
            bridge.restore(later).await,
            RestoreOutcome::Resumed {
                end_timestamp: now + Duration::from_secs(3600),
                stats: Some(SessionStats::default()),
                log: Some(session.log().to_vec()),
            }
        );
    }

    #[tokio::test]
    async fn leftover_stats_without_end_time_are_purged() {
        let (store, bridge) = bridge();
        store
            .set(&bridge.stats_key(), r#"{"earnings":1.0,"blocksFound":2}"#.to_string())
            .await
            .unwrap();

        let outcome = bridge.restore(datetime!(2026-03-01 10:00:00 UTC)).await;
        assert_eq!(outcome, RestoreOutcome::NoSession);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn corrupt_stats_fail_the_restore() {
        let (store, bridge) = bridge();
        let now = datetime!(2026-03-01 10:00:00 UTC);
        store
            .set(
                &bridge.end_time_key(),
                encode_end_time(now + Duration::from_secs(60)),
            )
            .await
            .unwrap();
        store
            .set(&bridge.stats_key(), "{not json".to_string())
            .await
            .unwrap();

        assert_eq!(bridge.restore(now).await, RestoreOutcome::Failed);
    }
}
