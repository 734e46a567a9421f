use movies_indexer_shared::Watermarks;

use crate::errors::StateError;

/// Trait for durable watermark persistence.
///
/// The whole mapping is read and written as one record, so a save either
/// replaces every entity's watermark or none of them.
#[async_trait::async_trait]
pub trait StateStorage: Send + Sync {
    /// Load the persisted mapping. Missing or unreadable state yields an empty mapping.
    async fn load(&self) -> Result<Watermarks, StateError>;

    /// Persist the full mapping before returning.
    async fn save(&self, watermarks: &Watermarks) -> Result<(), StateError>;
}
