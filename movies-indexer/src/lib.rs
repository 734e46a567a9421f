//! # Movies Indexer
//!
//! Incrementally syncs films, persons and genres from PostgreSQL into an
//! OpenSearch index of film documents.
//!
//! ## Architecture
//!
//! The indexer follows the Extractor-Processor-Loader pattern:
//!
//! 1. **Extractor**: Detects changed rows and reads film details
//! 2. **Processor**: Groups joined rows into film documents
//! 3. **Loader**: Upserts documents into OpenSearch
//! 4. **Orchestrator**: Runs one cycle per entity type and advances watermarks
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`backoff`]: Retry policy shared by every I/O call
//! - [`extractor`]: Paginated, retried reads from the relational store
//! - [`processor`]: Transforms joined rows into documents
//! - [`loader`]: Writes documents into the search index
//! - [`state`]: Persisted per-entity watermarks
//! - [`orchestrator`]: Coordinates the sync passes
//! - [`errors`]: Error types for the indexer

pub mod backoff;
pub mod config;
pub mod errors;
pub mod extractor;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod state;

pub use config::{Dependencies, Settings};
pub use errors::IngestError;

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
