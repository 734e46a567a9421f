//! Error types for the movies indexer pipeline.

use movies_indexer_repository::{SearchIndexError, SourceError, StateError};
use movies_indexer_shared::EntityType;
use std::fmt;
use thiserror::Error;

/// Errors that can occur in the sync pipeline.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Error reading from the relational store.
    #[error("Source error: {0}")]
    SourceError(#[from] SourceError),

    /// Error from the loader component.
    #[error("Loader error: {0}")]
    LoaderError(#[from] SearchIndexError),

    /// Error persisting watermarks.
    #[error("Watermark error: {0}")]
    WatermarkError(#[from] StateError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl IngestError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Phases of one entity type's sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Detecting,
    Resolving,
    Fetching,
    Transforming,
    Writing,
    Advancing,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Detecting => "detecting",
            SyncPhase::Resolving => "resolving",
            SyncPhase::Fetching => "fetching",
            SyncPhase::Transforming => "transforming",
            SyncPhase::Writing => "writing",
            SyncPhase::Advancing => "advancing",
        };
        f.write_str(name)
    }
}

/// A fatal failure of one entity type's cycle, attributed to the phase it happened in.
#[derive(Error, Debug)]
#[error("Sync of '{entity}' failed while {phase}: {source}")]
pub struct CycleError {
    pub entity: EntityType,
    pub phase: SyncPhase,
    #[source]
    pub source: IngestError,
}

impl CycleError {
    pub fn new(entity: EntityType, phase: SyncPhase, source: impl Into<IngestError>) -> Self {
        Self {
            entity,
            phase,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_message_names_entity_and_phase() {
        let err = CycleError::new(
            EntityType::Person,
            SyncPhase::Writing,
            SearchIndexError::connection("connection refused"),
        );

        let message = err.to_string();
        assert!(message.contains("'person'"));
        assert!(message.contains("writing"));
        assert!(message.contains("connection refused"));
    }
}
