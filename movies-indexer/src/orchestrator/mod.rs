//! Orchestrator module for the movies indexer.
//!
//! Coordinates the extractor, transformer, loader and watermark store: one
//! sync cycle per entity type, one pass over all types, then a pause.

use chrono::{DateTime, Utc};
use futures::{pin_mut, TryStreamExt};
use tokio::sync::broadcast;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, instrument};

use crate::errors::{CycleError, IngestError, SyncPhase};
use crate::extractor::{RootSet, SourceExtractor};
use crate::loader::SearchLoader;
use crate::processor::DocumentTransformer;
use crate::state::WatermarkStore;
use movies_indexer_shared::{EntityType, Watermarks};

/// Default pause between two passes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Pause between the end of one pass and the start of the next.
    pub poll_interval: Duration,
    /// Stop after a single pass.
    pub run_once: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            run_once: false,
        }
    }
}

/// Outcome of one successful sync cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub entity: EntityType,
    /// Changed rows of the entity's own table.
    pub changed: usize,
    /// Distinct films selected for re-indexing.
    pub resolved_films: usize,
    pub documents_written: usize,
    pub failed_documents: usize,
    /// Watermark stored at the end of the cycle.
    pub watermark: DateTime<Utc>,
}

impl CycleReport {
    fn new(entity: EntityType, watermark: DateTime<Utc>) -> Self {
        Self {
            entity,
            changed: 0,
            resolved_films: 0,
            documents_written: 0,
            failed_documents: 0,
            watermark,
        }
    }
}

/// Outcome of one pass over every entity type.
#[derive(Debug, Default)]
pub struct PassReport {
    pub cycles: Vec<CycleReport>,
    pub failures: Vec<CycleError>,
}

impl PassReport {
    pub fn cycle(&self, entity: EntityType) -> Option<&CycleReport> {
        self.cycles.iter().find(|c| c.entity == entity)
    }

    pub fn failure(&self, entity: EntityType) -> Option<&CycleError> {
        self.failures.iter().find(|f| f.entity == entity)
    }

    pub fn documents_written(&self) -> usize {
        self.cycles.iter().map(|c| c.documents_written).sum()
    }

    pub fn failed_documents(&self) -> usize {
        self.cycles.iter().map(|c| c.failed_documents).sum()
    }
}

/// Orchestrator that coordinates the sync components.
///
/// The orchestrator:
/// - Runs the entity types in a fixed order, one at a time
/// - Advances a type's watermark only after its writes succeeded
/// - Isolates a failing type from the others within a pass
/// - Handles shutdown signals between passes
pub struct Orchestrator {
    extractor: SourceExtractor,
    transformer: DocumentTransformer,
    loader: SearchLoader,
    watermarks: WatermarkStore,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
    phase: SyncPhase,
    /// Passes completed since startup.
    total_passes: u64,
    /// Documents written since startup.
    total_documents_written: u64,
    /// Documents rejected by the index since startup.
    total_documents_failed: u64,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        extractor: SourceExtractor,
        transformer: DocumentTransformer,
        loader: SearchLoader,
        watermarks: WatermarkStore,
    ) -> Self {
        Self::with_config(
            extractor,
            transformer,
            loader,
            watermarks,
            OrchestratorConfig::default(),
        )
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        extractor: SourceExtractor,
        transformer: DocumentTransformer,
        loader: SearchLoader,
        watermarks: WatermarkStore,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            extractor,
            transformer,
            loader,
            watermarks,
            config,
            shutdown_tx,
            phase: SyncPhase::Idle,
            total_passes: 0,
            total_documents_written: 0,
            total_documents_failed: 0,
        }
    }

    /// Current phase of the running cycle, `Idle` between cycles.
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Watermarks as of the last successful advance.
    pub fn watermarks(&self) -> &Watermarks {
        self.watermarks.watermarks()
    }

    /// A sender that stops [`Orchestrator::run`] once the current pass ends.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run the orchestrator.
    ///
    /// Runs passes until a shutdown signal is received, or once when
    /// `run_once` is set. A pass in progress is always completed.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<(), IngestError> {
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            run_once = self.config.run_once,
            "Starting movies indexer orchestrator"
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let signal_tx = self.shutdown_tx.clone();
        let signal_handle = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
                let _ = signal_tx.send(());
            }
        });

        loop {
            let report = self.run_pass().await;
            self.record_pass(&report);

            if self.config.run_once {
                break;
            }

            tokio::select! {
                _ = sleep(self.config.poll_interval) => {}
                _ = shutdown_rx.recv() => {
                    info!("Stopping after shutdown request");
                    break;
                }
            }
        }

        signal_handle.abort();

        info!(
            total_passes = self.total_passes,
            total_documents_written = self.total_documents_written,
            total_documents_failed = self.total_documents_failed,
            "Orchestrator shutdown complete"
        );
        Ok(())
    }

    /// Run one cycle for every entity type, in order.
    ///
    /// A failing cycle is logged and reported; the remaining types still run.
    pub async fn run_pass(&mut self) -> PassReport {
        let mut report = PassReport::default();

        for entity in EntityType::ALL {
            match self.run_cycle(entity).await {
                Ok(cycle) => report.cycles.push(cycle),
                Err(e) => {
                    error!(
                        entity = %e.entity,
                        phase = %e.phase,
                        error = %e.source,
                        "Sync cycle failed"
                    );
                    report.failures.push(e);
                }
            }
        }

        report
    }

    /// Run the sync cycle of a single entity type.
    ///
    /// On success the watermark of `entity` has moved to the time the cycle
    /// started detecting changes, unless a later one was already stored. On
    /// failure it is left untouched.
    #[instrument(skip(self), fields(entity = %entity))]
    pub async fn run_cycle(&mut self, entity: EntityType) -> Result<CycleReport, CycleError> {
        let result = self.sync(entity).await;
        self.phase = SyncPhase::Idle;
        result
    }

    async fn sync(&mut self, entity: EntityType) -> Result<CycleReport, CycleError> {
        self.phase = SyncPhase::Detecting;
        let started_at = Utc::now();
        let since = self.watermarks.since(entity);
        let mut report = CycleReport::new(entity, started_at);

        debug!(since = %since, "Detecting changes");
        let roots = self.collect_roots(entity, since, &mut report).await?;
        report.resolved_films = roots.len();

        if roots.is_empty() {
            debug!(changed = report.changed, "No films to refresh");
        } else {
            self.phase = SyncPhase::Fetching;
            let film_ids = roots.ids();
            let chunks = self.extractor.details_for(&film_ids);
            pin_mut!(chunks);

            while let Some(rows) = chunks
                .try_next()
                .await
                .map_err(|e| CycleError::new(entity, SyncPhase::Fetching, e))?
            {
                self.phase = SyncPhase::Transforming;
                let documents = self.transformer.transform(rows);

                self.phase = SyncPhase::Writing;
                let summary = self
                    .loader
                    .bulk_upsert(&documents)
                    .await
                    .map_err(|e| CycleError::new(entity, SyncPhase::Writing, e))?;
                report.documents_written += summary.written;
                report.failed_documents += summary.failed();

                self.phase = SyncPhase::Fetching;
            }
        }

        self.phase = SyncPhase::Advancing;
        report.watermark = self
            .watermarks
            .advance(entity, started_at)
            .await
            .map_err(|e| CycleError::new(entity, SyncPhase::Advancing, e))?;

        info!(
            changed = report.changed,
            resolved_films = report.resolved_films,
            documents_written = report.documents_written,
            failed_documents = report.failed_documents,
            watermark = %report.watermark,
            "Sync cycle complete"
        );
        Ok(report)
    }

    /// Detect changed rows of `entity` and map them to the films to re-index.
    async fn collect_roots(
        &mut self,
        entity: EntityType,
        since: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> Result<RootSet, CycleError> {
        let mut roots = RootSet::new();
        let pages = self.extractor.changed_since(entity, since);
        pin_mut!(pages);

        while let Some(page) = pages
            .try_next()
            .await
            .map_err(|e| CycleError::new(entity, SyncPhase::Detecting, e))?
        {
            report.changed += page.len();

            if entity.is_root() {
                roots.extend(page);
                continue;
            }

            self.phase = SyncPhase::Resolving;
            let ids: Vec<_> = page.iter().map(|row| row.id).collect();
            let films = self
                .extractor
                .root_ids_related_to(entity, &ids)
                .await
                .map_err(|e| CycleError::new(entity, SyncPhase::Resolving, e))?;
            debug!(changed = ids.len(), films = films.len(), "Resolved changed rows to films");
            roots.extend(films);
            self.phase = SyncPhase::Detecting;
        }

        Ok(roots)
    }

    fn record_pass(&mut self, report: &PassReport) {
        self.total_passes += 1;
        self.total_documents_written += report.documents_written() as u64;
        self.total_documents_failed += report.failed_documents() as u64;

        info!(
            pass = self.total_passes,
            succeeded_cycles = report.cycles.len(),
            failed_cycles = report.failures.len(),
            documents_written = report.documents_written(),
            failed_documents = report.failed_documents(),
            total_documents_written = self.total_documents_written,
            total_documents_failed = self.total_documents_failed,
            "Sync pass complete"
        );
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
