use chrono::{DateTime, Utc};
use movies_indexer_shared::{ChangedRow, EntityType, JoinedRow};
use uuid::Uuid;

use crate::errors::SourceError;

/// Trait for reading changes and film details from the relational store.
///
/// Each method issues one query. Pagination and retries live with the caller, which
/// keeps every call small enough to retry as a unit.
#[async_trait::async_trait]
pub trait SourceReader: Send + Sync {
    /// One page of rows of `entity` modified strictly after `since`.
    ///
    /// Rows are ordered by `(modified, id)` ascending. When `after` is set, only rows
    /// strictly after that `(modified, id)` position are returned, which continues a
    /// previous page.
    async fn changed_page(
        &self,
        entity: EntityType,
        since: DateTime<Utc>,
        after: Option<ChangedRow>,
        limit: usize,
    ) -> Result<Vec<ChangedRow>, SourceError>;

    /// Film ids referencing any of the given person or genre ids.
    ///
    /// Each film appears once, with the latest modification time seen. Empty input
    /// returns an empty result.
    async fn root_ids_related_to(
        &self,
        entity: EntityType,
        ids: &[Uuid],
    ) -> Result<Vec<ChangedRow>, SourceError>;

    /// Joined detail rows for the given films. Empty input returns no rows.
    async fn details_for(&self, film_ids: &[Uuid]) -> Result<Vec<JoinedRow>, SourceError>;
}
