//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use movies_indexer_shared::FilmDocument;
use opensearch::{
    auth::Credentials,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::bulk::{build_bulk_lines, is_already_exists, summarize_bulk_response};
use crate::opensearch::index_config::{get_index_settings, IndexConfig};
use crate::types::BatchOperationSummary;

/// Basic-auth credentials for the search cluster.
#[derive(Clone)]
pub struct OpenSearchCredentials {
    pub username: String,
    pub password: String,
}

/// OpenSearch provider implementation.
///
/// Holds one long-lived client that is reused for every request.
///
/// # Example
///
/// ```ignore
/// use movies_indexer_repository::opensearch::{IndexConfig, OpenSearchProvider};
///
/// let provider = OpenSearchProvider::new("http://localhost:9200", None, IndexConfig::default())?;
/// provider.ensure_index_exists().await?;
/// let summary = provider.bulk_upsert_documents(&documents).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// No request is sent here; connectivity problems surface on the first call.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `credentials` - Optional basic-auth credentials
    /// * `index_config` - The index configuration
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or the transport cannot be built
    pub fn new(
        url: &str,
        credentials: Option<OpenSearchCredentials>,
        index_config: IndexConfig,
    ) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        let authenticated = credentials.is_some();
        if let Some(credentials) = credentials {
            builder = builder.auth(Credentials::Basic(
                credentials.username,
                credentials.password,
            ));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.name,
            authenticated,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// The name of the index all documents are written to.
    pub fn index_name(&self) -> &str {
        &self.index_config.name
    }

    async fn index_exists(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index_config.name.as_str()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(SearchIndexError::connection(format!(
                "Index existence check returned status {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        let index = self.index_config.name.as_str();

        if self.index_exists().await? {
            info!(index = %index, "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(get_index_settings())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.is_success() {
            info!(index = %index, "Index created");
            return Ok(());
        }

        let error_body = response.text().await.unwrap_or_default();
        if is_already_exists(&error_body) {
            info!(index = %index, "Index was created concurrently");
            return Ok(());
        }

        error!(status = %status, body = %error_body, "Index creation failed");
        Err(SearchIndexError::index_creation(format!(
            "Index creation failed with status {}: {}",
            status, error_body
        )))
    }

    async fn bulk_upsert_documents(
        &self,
        documents: &[FilmDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        let body: Vec<JsonBody<Value>> = build_bulk_lines(&self.index_config.name, documents)?
            .into_iter()
            .map(JsonBody::from)
            .collect();

        let response = self
            .client
            .bulk(BulkParts::None)
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::bulk_index(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = summarize_bulk_response(documents, &response_body);
        if summary.failed > 0 {
            warn!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Bulk request completed with rejected documents"
            );
        } else {
            debug!(count = summary.succeeded, "Bulk request completed");
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = OpenSearchProvider::new("not a url", None, IndexConfig::default());
        assert!(matches!(result, Err(SearchIndexError::ConnectionError(_))));
    }

    #[test]
    fn test_new_with_credentials() {
        let credentials = OpenSearchCredentials {
            username: "elastic".to_string(),
            password: "secret".to_string(),
        };
        let provider = OpenSearchProvider::new(
            "http://localhost:9200",
            Some(credentials),
            IndexConfig::new("films"),
        )
        .unwrap();
        assert_eq!(provider.index_name(), "films");
    }
}
