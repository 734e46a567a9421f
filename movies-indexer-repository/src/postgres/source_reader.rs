//! PostgreSQL implementation of the source reader.
//!
//! Reads the `content` schema: `film_work`, `person`, `genre` and the
//! `person_film_work` / `genre_film_work` junction tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use movies_indexer_shared::{ChangedRow, EntityType, JoinedRow};
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::PostgresConfig;
use crate::errors::SourceError;
use crate::interfaces::SourceReader;
use crate::postgres::queries;

#[derive(sqlx::FromRow)]
struct ChangedRecord {
    id: Uuid,
    modified: DateTime<Utc>,
}

impl From<ChangedRecord> for ChangedRow {
    fn from(record: ChangedRecord) -> Self {
        ChangedRow::new(record.id, record.modified)
    }
}

#[derive(sqlx::FromRow)]
struct FilmDetailRecord {
    film_id: Uuid,
    title: String,
    description: Option<String>,
    rating: Option<f64>,
    role: Option<String>,
    person_id: Option<Uuid>,
    person_name: Option<String>,
    genre_id: Option<Uuid>,
    genre_name: Option<String>,
}

impl From<FilmDetailRecord> for JoinedRow {
    fn from(record: FilmDetailRecord) -> Self {
        JoinedRow {
            film_id: record.film_id,
            title: record.title,
            description: record.description,
            rating: record.rating,
            role: record.role,
            person_id: record.person_id,
            person_name: record.person_name,
            genre_id: record.genre_id,
            genre_name: record.genre_name,
        }
    }
}

/// PostgreSQL-backed source reader.
///
/// Every query is parameterized; table names are only ever taken from the
/// closed `EntityType` set.
pub struct PostgresSourceReader {
    /// PostgreSQL connection pool
    pool: sqlx::PgPool,
}

impl PostgresSourceReader {
    /// Creates a reader over an existing pool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool with the given settings.
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresSourceReader)` - Ready-to-use reader
    /// * `Err(SourceError)` - If the first connection cannot be established
    pub async fn connect(config: &PostgresConfig) -> Result<Self, SourceError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options())
            .await?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connected to PostgreSQL"
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl SourceReader for PostgresSourceReader {
    #[instrument(skip(self), fields(entity = %entity))]
    async fn changed_page(
        &self,
        entity: EntityType,
        since: DateTime<Utc>,
        after: Option<ChangedRow>,
        limit: usize,
    ) -> Result<Vec<ChangedRow>, SourceError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let sql = match after {
            None => queries::changed_first_page(entity),
            Some(_) => queries::changed_next_page(entity),
        };

        let query = sqlx::query_as::<_, ChangedRecord>(&sql);
        let query = match after {
            None => query.bind(since),
            Some(cursor) => query.bind(cursor.modified).bind(cursor.id),
        };
        let records = query.bind(limit).fetch_all(&self.pool).await?;

        debug!(rows = records.len(), "Fetched changed rows");
        Ok(records.into_iter().map(ChangedRow::from).collect())
    }

    #[instrument(skip(self, ids), fields(entity = %entity, id_count = ids.len()))]
    async fn root_ids_related_to(
        &self,
        entity: EntityType,
        ids: &[Uuid],
    ) -> Result<Vec<ChangedRow>, SourceError> {
        let query = queries::films_related_to(entity).ok_or(SourceError::NotDependent(entity))?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<ChangedRecord> = sqlx::query_as(query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        debug!(films = records.len(), "Resolved related films");
        Ok(records.into_iter().map(ChangedRow::from).collect())
    }

    #[instrument(skip(self, film_ids), fields(film_count = film_ids.len()))]
    async fn details_for(&self, film_ids: &[Uuid]) -> Result<Vec<JoinedRow>, SourceError> {
        if film_ids.is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<FilmDetailRecord> = sqlx::query_as(queries::FILM_DETAILS)
            .bind(film_ids)
            .fetch_all(&self.pool)
            .await?;

        debug!(rows = records.len(), "Fetched film detail rows");
        Ok(records.into_iter().map(JoinedRow::from).collect())
    }
}
