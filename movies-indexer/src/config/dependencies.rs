//! Dependency initialization and wiring for the movies indexer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::settings::{ConnectionMode, Settings};
use crate::extractor::SourceExtractor;
use crate::loader::{LoaderConfig, SearchLoader};
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::processor::DocumentTransformer;
use crate::state::WatermarkStore;
use crate::IndexingError;
use movies_indexer_repository::opensearch::{IndexConfig, OpenSearchCredentials};
use movies_indexer_repository::{JsonFileStorage, OpenSearchProvider, PostgresSourceReader};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from the given settings.
    ///
    /// Connects to PostgreSQL, makes sure the search index exists and loads
    /// the persisted watermarks.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails (only in fail-fast mode
    ///   for connection problems)
    pub async fn new(settings: Settings) -> Result<Self, IndexingError> {
        let mode = settings.opensearch.connection_mode;
        let retry_interval = settings.opensearch.retry_interval;

        info!(
            postgres_host = %settings.postgres.host,
            postgres_db = %settings.postgres.database,
            opensearch_url = %settings.opensearch.url,
            index = %settings.opensearch.index_name,
            connection_mode = ?mode,
            retry_interval_secs = retry_interval.as_secs(),
            state_file = %settings.sync.state_file.display(),
            "Initializing dependencies"
        );

        let reader = Self::establish("PostgreSQL", mode, retry_interval, || async {
            PostgresSourceReader::connect(&settings.postgres)
                .await
                .map_err(|e| IndexingError::config(e.to_string()))
        })
        .await?;

        let credentials = match (&settings.opensearch.username, &settings.opensearch.password) {
            (Some(username), Some(password)) => Some(OpenSearchCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            (None, None) => None,
            _ => {
                return Err(IndexingError::config(
                    "OPENSEARCH_USER and OPENSEARCH_PASSWORD must be set together",
                ))
            }
        };

        let search_provider = OpenSearchProvider::new(
            &settings.opensearch.url,
            credentials,
            IndexConfig::new(settings.opensearch.index_name.clone()),
        )
        .map_err(|e| {
            IndexingError::config(format!("Failed to create OpenSearch provider: {}", e))
        })?;

        let loader = SearchLoader::with_config(
            Arc::new(search_provider),
            LoaderConfig {
                chunk_size: settings.sync.chunk_size,
            },
            settings.backoff.clone(),
        );

        // Exits if the index cannot be created
        Self::establish("OpenSearch", mode, retry_interval, || async {
            loader
                .ensure_index()
                .await
                .map_err(|e| IndexingError::config(format!("Failed to ensure index exists: {}", e)))
        })
        .await?;

        info!("OpenSearch index ready");

        let watermarks =
            WatermarkStore::load(Box::new(JsonFileStorage::new(&settings.sync.state_file))).await?;

        let extractor = SourceExtractor::new(
            Arc::new(reader),
            settings.backoff.clone(),
            settings.sync.batch_size,
        );

        let orchestrator = Orchestrator::with_config(
            extractor,
            DocumentTransformer::new(),
            loader,
            watermarks,
            OrchestratorConfig {
                poll_interval: settings.sync.poll_interval,
                run_once: settings.sync.run_once,
            },
        );

        Ok(Self { orchestrator })
    }

    /// Run `connect` until it succeeds, honoring the connection mode.
    async fn establish<T, F, Fut>(
        service: &str,
        mode: ConnectionMode,
        retry_interval: Duration,
        mut connect: F,
    ) -> Result<T, IndexingError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, IndexingError>>,
    {
        loop {
            match connect().await {
                Ok(value) => return Ok(value),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to {}: {}",
                            service, e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            service,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}
