//! # Movies Indexer Repository
//!
//! This crate provides the I/O seams of the movies indexer and their
//! implementations:
//!
//! - [`SourceReader`]: change detection and detail queries against the
//!   relational store, implemented for PostgreSQL.
//! - [`SearchIndexProvider`]: index creation and bulk upserts, implemented
//!   for OpenSearch.
//! - [`StateStorage`]: durable watermark persistence, implemented as a JSON
//!   file.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod postgres;
pub mod state;
pub mod types;

pub use config::PostgresConfig;
pub use errors::{SearchIndexError, SourceError, StateError};
pub use interfaces::{SearchIndexProvider, SourceReader, StateStorage};
pub use opensearch::OpenSearchProvider;
pub use postgres::PostgresSourceReader;
pub use state::JsonFileStorage;
pub use types::{BatchOperationResult, BatchOperationSummary};
