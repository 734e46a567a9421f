//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use movies_indexer_shared::FilmDocument;

use crate::errors::SearchIndexError;
use crate::types::BatchOperationSummary;

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are injected into the loader to enable dependency injection and easy
/// testing with mock implementations.
///
/// # Note on Document Creation
///
/// There is no separate create operation. Documents are keyed by film id and every write
/// replaces the whole document, so writing the same documents twice leaves the index in
/// the same state.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the search index exists, creating it with the film mappings if necessary.
    ///
    /// Idempotent. An index created concurrently by another caller counts as success.
    /// Schema drift of an existing index is not detected.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError)` - If the check or the creation fails
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError>;

    /// Upsert documents with a single bulk request.
    ///
    /// Callers are responsible for bounding the number of documents per call.
    ///
    /// # Arguments
    ///
    /// * `documents` - Documents to write, keyed by their film id
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - The request was accepted; individual documents
    ///   may still have been rejected and are reported in the summary
    /// * `Err(SearchIndexError)` - If the request as a whole failed
    async fn bulk_upsert_documents(
        &self,
        documents: &[FilmDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;
}
