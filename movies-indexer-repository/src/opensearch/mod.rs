//! OpenSearch implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using OpenSearch as the backend. The same wire protocol is understood by
//! Elasticsearch.

mod bulk;
mod index_config;
mod provider;

pub use bulk::{build_bulk_lines, is_already_exists, summarize_bulk_response};
pub use index_config::{get_index_settings, IndexConfig, INDEX_NAME};
pub use provider::{OpenSearchCredentials, OpenSearchProvider};
