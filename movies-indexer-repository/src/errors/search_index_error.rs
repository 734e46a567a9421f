//! Search index error types.
//!
//! This module defines the unified error type for all search index
//! operations, from transport failures to rejected documents.

use thiserror::Error;

/// Unified errors from search index operations.
///
/// Used by the `SearchIndexProvider` trait for every backend call. A whole
/// request failing (transport error, non-2xx status) is reported through
/// `Err`; a single document rejected inside an otherwise successful bulk
/// request is reported in the batch summary with `DocumentRejected`.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Failed to reach the search index backend or it answered unexpectedly.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// The bulk request as a whole failed.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// A single document was rejected within a bulk request.
    #[error("Document rejected: {0}")]
    DocumentRejected(String),

    /// Failed to parse response from search index backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search index backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SearchIndexError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create a rejected document error.
    pub fn document_rejected(msg: impl Into<String>) -> Self {
        Self::DocumentRejected(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }
}
