//! Extractor module for the movies indexer.
//!
//! Wraps a [`SourceReader`] with pagination and retry. Reads are lazy: a
//! page is only requested when the previous one has been consumed.

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::backoff::BackoffPolicy;
use crate::errors::IngestError;
use movies_indexer_repository::SourceReader;
use movies_indexer_shared::{ChangedRow, EntityType, JoinedRow};

/// Default number of rows or film ids requested per query.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Cursor state between changed-row pages.
///
/// `None` means the previous page was the last one.
type PageCursor = Option<Option<ChangedRow>>;

/// Film ids collected during resolution, keyed by id.
///
/// Each id keeps the latest `modified` seen for it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RootSet {
    films: BTreeMap<Uuid, DateTime<Utc>>,
}

impl RootSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rows, keeping the latest modification time per id.
    pub fn extend<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = ChangedRow>,
    {
        for row in rows {
            self.films
                .entry(row.id)
                .and_modify(|modified| {
                    if row.modified > *modified {
                        *modified = row.modified;
                    }
                })
                .or_insert(row.modified);
        }
    }

    pub fn len(&self) -> usize {
        self.films.len()
    }

    pub fn is_empty(&self) -> bool {
        self.films.is_empty()
    }

    pub fn modified(&self, id: &Uuid) -> Option<DateTime<Utc>> {
        self.films.get(id).copied()
    }

    /// Film ids in ascending order.
    pub fn ids(&self) -> Vec<Uuid> {
        self.films.keys().copied().collect()
    }
}

/// Extractor that reads changes and details from the relational store.
pub struct SourceExtractor {
    reader: Arc<dyn SourceReader>,
    backoff: BackoffPolicy,
    batch_size: usize,
}

impl SourceExtractor {
    /// Create a new extractor.
    ///
    /// A `batch_size` of zero is treated as one.
    pub fn new(reader: Arc<dyn SourceReader>, backoff: BackoffPolicy, batch_size: usize) -> Self {
        Self {
            reader,
            backoff,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Stream the rows of `entity` modified after `since`, one page at a time.
    ///
    /// Pages follow `(modified, id)` order; the next page starts strictly
    /// after the last row of the previous one. Each page fetch is retried on
    /// its own.
    pub fn changed_since(
        &self,
        entity: EntityType,
        since: DateTime<Utc>,
    ) -> impl Stream<Item = Result<Vec<ChangedRow>, IngestError>> + '_ {
        let start: PageCursor = Some(None);
        stream::try_unfold(start, move |cursor| async move {
            match cursor {
                None => Ok(None),
                Some(after) => self.next_changed_page(entity, since, after).await,
            }
        })
    }

    async fn next_changed_page(
        &self,
        entity: EntityType,
        since: DateTime<Utc>,
        after: Option<ChangedRow>,
    ) -> Result<Option<(Vec<ChangedRow>, PageCursor)>, IngestError> {
        let operation = format!("changed_page({})", entity);
        let page = self
            .backoff
            .retry(&operation, || {
                self.reader
                    .changed_page(entity, since, after, self.batch_size)
            })
            .await?;

        if page.is_empty() {
            return Ok(None);
        }

        debug!(entity = %entity, rows = page.len(), "Read page of changed rows");

        let next = if page.len() < self.batch_size {
            None
        } else {
            page.last().copied().map(Some)
        };
        Ok(Some((page, next)))
    }

    /// Resolve changed person or genre ids to the films they appear in.
    #[instrument(skip(self, ids), fields(entity = %entity, id_count = ids.len()))]
    pub async fn root_ids_related_to(
        &self,
        entity: EntityType,
        ids: &[Uuid],
    ) -> Result<Vec<ChangedRow>, IngestError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let operation = format!("root_ids_related_to({})", entity);
        let films = self
            .backoff
            .retry(&operation, || self.reader.root_ids_related_to(entity, ids))
            .await?;
        Ok(films)
    }

    /// Stream the joined detail rows of `film_ids`, one chunk of films at a time.
    ///
    /// Chunks partition the film ids, so every row of a film arrives in the
    /// same item.
    pub fn details_for<'a>(
        &'a self,
        film_ids: &'a [Uuid],
    ) -> impl Stream<Item = Result<Vec<JoinedRow>, IngestError>> + 'a {
        stream::iter(film_ids.chunks(self.batch_size)).then(move |chunk| async move {
            let rows = self
                .backoff
                .retry("details_for", || self.reader.details_for(chunk))
                .await?;
            debug!(films = chunk.len(), rows = rows.len(), "Read film details");
            Ok::<_, IngestError>(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use futures::TryStreamExt;
    use movies_indexer_repository::SourceError;
    use std::sync::Mutex;
    use std::time::Duration;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + ChronoDuration::minutes(minutes)
    }

    /// In-memory reader over a fixed list of rows, honoring keyset pagination.
    struct MockReader {
        rows: Vec<ChangedRow>,
        page_calls: Mutex<Vec<Option<ChangedRow>>>,
        detail_calls: Mutex<Vec<Vec<Uuid>>>,
        failures_left: Mutex<u32>,
    }

    impl MockReader {
        fn new(mut rows: Vec<ChangedRow>) -> Self {
            rows.sort_by_key(|r| (r.modified, r.id));
            Self {
                rows,
                page_calls: Mutex::new(Vec::new()),
                detail_calls: Mutex::new(Vec::new()),
                failures_left: Mutex::new(0),
            }
        }

        fn failing_first(self, failures: u32) -> Self {
            *self.failures_left.lock().unwrap() = failures;
            self
        }

        fn take_failure(&self) -> Result<(), SourceError> {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(SourceError::DatabaseError(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl SourceReader for MockReader {
        async fn changed_page(
            &self,
            _entity: EntityType,
            since: DateTime<Utc>,
            after: Option<ChangedRow>,
            limit: usize,
        ) -> Result<Vec<ChangedRow>, SourceError> {
            self.take_failure()?;
            self.page_calls.lock().unwrap().push(after);
            Ok(self
                .rows
                .iter()
                .filter(|r| match after {
                    None => r.modified > since,
                    Some(c) => (r.modified, r.id) > (c.modified, c.id),
                })
                .take(limit)
                .copied()
                .collect())
        }

        async fn root_ids_related_to(
            &self,
            entity: EntityType,
            ids: &[Uuid],
        ) -> Result<Vec<ChangedRow>, SourceError> {
            if entity.is_root() {
                return Err(SourceError::NotDependent(entity));
            }
            self.take_failure()?;
            Ok(ids.iter().map(|i| ChangedRow::new(*i, at(0))).collect())
        }

        async fn details_for(&self, film_ids: &[Uuid]) -> Result<Vec<JoinedRow>, SourceError> {
            self.take_failure()?;
            self.detail_calls.lock().unwrap().push(film_ids.to_vec());
            Ok(film_ids
                .iter()
                .map(|f| JoinedRow::film(*f, "Title", None, None))
                .collect())
        }
    }

    fn policy() -> BackoffPolicy {
        BackoffPolicy {
            initial_delay: Duration::from_millis(10),
            factor: 2.0,
            max_delay: Duration::from_millis(100),
            max_attempts: 3,
        }
    }

    #[tokio::test]
    async fn test_changed_since_paginates_with_keyset_cursor() {
        // Two rows share a timestamp across the page boundary.
        let rows = vec![
            ChangedRow::new(id(1), at(1)),
            ChangedRow::new(id(2), at(2)),
            ChangedRow::new(id(3), at(2)),
            ChangedRow::new(id(4), at(3)),
            ChangedRow::new(id(5), at(4)),
        ];
        let reader = Arc::new(MockReader::new(rows.clone()));
        let extractor = SourceExtractor::new(reader.clone(), policy(), 2);

        let pages: Vec<Vec<ChangedRow>> = extractor
            .changed_since(EntityType::Film, at(0))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages.concat(), rows);
        let calls = reader.page_calls.lock().unwrap();
        assert_eq!(calls[0], None);
        assert_eq!(calls[1], Some(ChangedRow::new(id(2), at(2))));
        assert_eq!(calls[2], Some(ChangedRow::new(id(4), at(3))));
    }

    #[tokio::test]
    async fn test_changed_since_respects_watermark() {
        let rows = vec![ChangedRow::new(id(1), at(1)), ChangedRow::new(id(2), at(5))];
        let extractor = SourceExtractor::new(Arc::new(MockReader::new(rows)), policy(), 10);

        let pages: Vec<Vec<ChangedRow>> = extractor
            .changed_since(EntityType::Person, at(1))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(pages, vec![vec![ChangedRow::new(id(2), at(5))]]);
    }

    #[tokio::test]
    async fn test_exact_page_multiple_ends_with_empty_page() {
        let rows = vec![ChangedRow::new(id(1), at(1)), ChangedRow::new(id(2), at(2))];
        let reader = Arc::new(MockReader::new(rows));
        let extractor = SourceExtractor::new(reader.clone(), policy(), 2);

        let pages: Vec<Vec<ChangedRow>> = extractor
            .changed_since(EntityType::Genre, at(0))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(reader.page_calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_changed_since_is_lazy() {
        let rows = (1..=6).map(|n| ChangedRow::new(id(n), at(n as i64))).collect();
        let reader = Arc::new(MockReader::new(rows));
        let extractor = SourceExtractor::new(reader.clone(), policy(), 2);

        let pages = extractor.changed_since(EntityType::Film, at(0));
        futures::pin_mut!(pages);
        let first = pages.try_next().await.unwrap().unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(reader.page_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_fetch_is_retried() {
        let rows = vec![ChangedRow::new(id(1), at(1))];
        let reader = Arc::new(MockReader::new(rows).failing_first(2));
        let extractor = SourceExtractor::new(reader, policy(), 10);

        let pages: Vec<Vec<ChangedRow>> = extractor
            .changed_since(EntityType::Film, at(0))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(pages.concat().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_error() {
        let reader = Arc::new(MockReader::new(Vec::new()).failing_first(5));
        let extractor = SourceExtractor::new(reader, policy(), 10);

        let result: Result<Vec<Vec<ChangedRow>>, _> = extractor
            .changed_since(EntityType::Film, at(0))
            .try_collect()
            .await;

        assert!(matches!(result, Err(IngestError::SourceError(_))));
    }

    #[tokio::test]
    async fn test_details_for_chunks_film_ids() {
        let reader = Arc::new(MockReader::new(Vec::new()));
        let extractor = SourceExtractor::new(reader.clone(), policy(), 2);
        let film_ids: Vec<Uuid> = (1..=5).map(id).collect();

        let chunks: Vec<Vec<JoinedRow>> = extractor
            .details_for(&film_ids)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(chunks.len(), 3);
        let calls = reader.detail_calls.lock().unwrap();
        assert_eq!(calls[0], vec![id(1), id(2)]);
        assert_eq!(calls[2], vec![id(5)]);
    }

    #[tokio::test]
    async fn test_empty_inputs_issue_no_queries() {
        let reader = Arc::new(MockReader::new(Vec::new()));
        let extractor = SourceExtractor::new(reader.clone(), policy(), 2);

        let chunks: Vec<Vec<JoinedRow>> = extractor.details_for(&[]).try_collect().await.unwrap();
        let films = extractor
            .root_ids_related_to(EntityType::Person, &[])
            .await
            .unwrap();

        assert!(chunks.is_empty());
        assert!(films.is_empty());
        assert!(reader.detail_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_root_set_keeps_latest_modified() {
        let mut roots = RootSet::new();
        roots.extend(vec![
            ChangedRow::new(id(2), at(1)),
            ChangedRow::new(id(1), at(3)),
            ChangedRow::new(id(2), at(5)),
            ChangedRow::new(id(2), at(2)),
        ]);

        assert_eq!(roots.len(), 2);
        assert_eq!(roots.ids(), vec![id(1), id(2)]);
        assert_eq!(roots.modified(&id(2)), Some(at(5)));
    }
}
