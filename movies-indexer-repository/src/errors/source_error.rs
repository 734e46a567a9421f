use movies_indexer_shared::EntityType;
use thiserror::Error;

#[derive(Debug, Error)]
/// Represents errors that can occur while reading the relational store.
///
/// Database errors cover both connectivity and query failures; callers
/// retry them as a whole.
pub enum SourceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Entity type '{0}' has no relation to resolve to films")]
    NotDependent(EntityType),
}
