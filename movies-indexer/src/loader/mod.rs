//! Loader module for the movies indexer.
//!
//! Writes film documents into the search index in bounded bulk chunks.

use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::backoff::BackoffPolicy;
use crate::errors::IngestError;
use movies_indexer_repository::SearchIndexProvider;
use movies_indexer_shared::FilmDocument;

/// Default number of documents per bulk request.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Configuration for the search loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of documents sent in one bulk request.
    pub chunk_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Outcome of one `bulk_upsert` call across all of its chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Number of bulk requests sent.
    pub chunks: usize,
    /// Documents accepted by the index.
    pub written: usize,
    /// Ids of documents the index rejected.
    pub failed_ids: Vec<String>,
}

impl LoadSummary {
    pub fn failed(&self) -> usize {
        self.failed_ids.len()
    }

    fn merge(&mut self, other: LoadSummary) {
        self.chunks += other.chunks;
        self.written += other.written;
        self.failed_ids.extend(other.failed_ids);
    }
}

/// Loader that indexes documents into the search engine.
///
/// The loader is responsible for:
/// - Splitting documents into bulk requests of bounded size
/// - Retrying failed requests per the backoff policy
/// - Logging documents rejected inside an accepted request
pub struct SearchLoader {
    provider: Arc<dyn SearchIndexProvider>,
    config: LoaderConfig,
    backoff: BackoffPolicy,
}

impl SearchLoader {
    /// Create a new search loader with the given provider.
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self {
            provider,
            config: LoaderConfig::default(),
            backoff: BackoffPolicy::default(),
        }
    }

    /// Create a new search loader with custom configuration.
    pub fn with_config(
        provider: Arc<dyn SearchIndexProvider>,
        config: LoaderConfig,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            provider,
            config: LoaderConfig {
                chunk_size: config.chunk_size.max(1),
            },
            backoff,
        }
    }

    /// Make sure the target index exists, creating it if needed.
    #[instrument(skip(self))]
    pub async fn ensure_index(&self) -> Result<(), IngestError> {
        self.backoff
            .retry("ensure_index", || self.provider.ensure_index_exists())
            .await?;
        debug!("Search index is ready");
        Ok(())
    }

    /// Upsert documents, one bulk request per chunk.
    ///
    /// A request that keeps failing after all retries fails the call. Documents
    /// rejected inside an accepted request are logged and reported in the
    /// returned summary without failing the call.
    #[instrument(skip(self, documents), fields(document_count = documents.len()))]
    pub async fn bulk_upsert(&self, documents: &[FilmDocument]) -> Result<LoadSummary, IngestError> {
        let mut summary = LoadSummary::default();
        if documents.is_empty() {
            return Ok(summary);
        }

        for chunk in documents.chunks(self.config.chunk_size) {
            summary.merge(self.upsert_chunk(chunk).await?);
        }

        if summary.failed() > 0 {
            warn!(
                written = summary.written,
                failed = summary.failed(),
                "Bulk upsert completed with some failures"
            );
        } else {
            debug!(written = summary.written, "Successfully upserted all documents");
        }

        Ok(summary)
    }

    async fn upsert_chunk(&self, chunk: &[FilmDocument]) -> Result<LoadSummary, IngestError> {
        let count = chunk.len();
        let result = self
            .backoff
            .retry("bulk_upsert", || self.provider.bulk_upsert_documents(chunk))
            .await;

        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                error!(error = %e, count, "Failed to bulk upsert documents");
                return Err(e.into());
            }
        };

        let failed_ids: Vec<String> = batch
            .failures()
            .map(|result| {
                if let Some(ref err) = result.error {
                    error!(
                        document_id = %result.document_id,
                        error = %err,
                        "Failed to upsert document"
                    );
                }
                result.document_id.clone()
            })
            .collect();

        Ok(LoadSummary {
            chunks: 1,
            written: batch.succeeded,
            failed_ids,
        })
    }
}
