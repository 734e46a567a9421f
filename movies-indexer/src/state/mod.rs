//! Watermark store for the movies indexer.
//!
//! Keeps the per-entity watermarks in memory and persists them through a
//! [`StateStorage`] on every advance.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::errors::IngestError;
use movies_indexer_repository::StateStorage;
use movies_indexer_shared::{EntityType, Watermarks};

/// In-memory watermarks backed by durable storage.
///
/// The store is the only writer of the underlying storage. The in-memory
/// mapping always matches the last successful save.
pub struct WatermarkStore {
    storage: Box<dyn StateStorage>,
    watermarks: Watermarks,
}

impl WatermarkStore {
    /// Load the persisted watermarks.
    pub async fn load(storage: Box<dyn StateStorage>) -> Result<Self, IngestError> {
        let watermarks = storage.load().await?;
        info!(entries = watermarks.len(), "Loaded watermarks");
        Ok(Self {
            storage,
            watermarks,
        })
    }

    /// The watermark for `entity`, if one has been stored.
    pub fn get(&self, entity: EntityType) -> Option<DateTime<Utc>> {
        self.watermarks.get(entity)
    }

    /// The lower bound for the next change detection of `entity`.
    pub fn since(&self, entity: EntityType) -> DateTime<Utc> {
        self.watermarks.get_or_epoch(entity)
    }

    pub fn watermarks(&self) -> &Watermarks {
        &self.watermarks
    }

    /// Move the watermark of `entity` to `timestamp` and persist it.
    ///
    /// A timestamp older than the current watermark is ignored. If saving
    /// fails the previous value is restored and the error is returned.
    ///
    /// Returns the watermark stored for `entity` afterwards.
    pub async fn advance(
        &mut self,
        entity: EntityType,
        timestamp: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, IngestError> {
        if let Some(current) = self.watermarks.get(entity) {
            if timestamp < current {
                warn!(
                    entity = %entity,
                    current = %current,
                    requested = %timestamp,
                    "Ignoring watermark older than the stored one"
                );
                return Ok(current);
            }
        }

        let previous = self.watermarks.set(entity, timestamp);
        if let Err(e) = self.storage.save(&self.watermarks).await {
            self.watermarks.restore(entity, previous);
            return Err(e.into());
        }

        debug!(entity = %entity, watermark = %timestamp, "Advanced watermark");
        Ok(timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use movies_indexer_repository::{JsonFileStorage, StateError};
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    /// Storage that records saves and can be switched to fail.
    #[derive(Clone, Default)]
    struct MockStorage {
        saved: Arc<Mutex<Option<Watermarks>>>,
        fail: Arc<AtomicBool>,
    }

    #[async_trait]
    impl StateStorage for MockStorage {
        async fn load(&self) -> Result<Watermarks, StateError> {
            Ok(self.saved.lock().unwrap().clone().unwrap_or_default())
        }

        async fn save(&self, watermarks: &Watermarks) -> Result<(), StateError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StateError::Io(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "read-only file system",
                )));
            }
            *self.saved.lock().unwrap() = Some(watermarks.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_advance_persists() {
        let storage = MockStorage::default();
        let mut store = WatermarkStore::load(Box::new(storage.clone())).await.unwrap();

        store.advance(EntityType::Film, at(1)).await.unwrap();

        assert_eq!(store.get(EntityType::Film), Some(at(1)));
        let saved = storage.saved.lock().unwrap().clone().unwrap();
        assert_eq!(saved.get(EntityType::Film), Some(at(1)));
    }

    #[tokio::test]
    async fn test_advance_never_moves_backwards() {
        let storage = MockStorage::default();
        let mut store = WatermarkStore::load(Box::new(storage.clone())).await.unwrap();

        assert_eq!(store.advance(EntityType::Genre, at(5)).await.unwrap(), at(5));
        assert_eq!(store.advance(EntityType::Genre, at(3)).await.unwrap(), at(5));

        assert_eq!(store.get(EntityType::Genre), Some(at(5)));
        let saved = storage.saved.lock().unwrap().clone().unwrap();
        assert_eq!(saved.get(EntityType::Genre), Some(at(5)));
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let storage = MockStorage::default();
        let mut store = WatermarkStore::load(Box::new(storage.clone())).await.unwrap();
        store.advance(EntityType::Person, at(1)).await.unwrap();

        storage.fail.store(true, Ordering::SeqCst);
        let result = store.advance(EntityType::Person, at(2)).await;
        let first_film = store.advance(EntityType::Film, at(2)).await;

        assert!(matches!(result, Err(IngestError::WatermarkError(_))));
        assert!(first_film.is_err());
        assert_eq!(store.get(EntityType::Person), Some(at(1)));
        assert_eq!(store.get(EntityType::Film), None);
    }

    #[tokio::test]
    async fn test_since_defaults_to_epoch() {
        let store = WatermarkStore::load(Box::new(MockStorage::default())).await.unwrap();
        assert_eq!(store.since(EntityType::Film), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn test_survives_restart_with_file_storage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = WatermarkStore::load(Box::new(JsonFileStorage::new(&path)))
            .await
            .unwrap();
        store.advance(EntityType::Film, at(4)).await.unwrap();
        drop(store);

        let reloaded = WatermarkStore::load(Box::new(JsonFileStorage::new(&path)))
            .await
            .unwrap();
        assert_eq!(reloaded.get(EntityType::Film), Some(at(4)));
        assert_eq!(reloaded.get(EntityType::Person), None);
    }
}
