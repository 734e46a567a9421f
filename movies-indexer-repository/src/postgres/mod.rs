//! PostgreSQL implementation of the source reader.
//!
//! Provides change detection with keyset pagination over `(modified, id)`,
//! dependency resolution through the junction tables and the film detail
//! join, all on a shared `sqlx::PgPool`.

mod queries;
mod source_reader;

pub use source_reader::PostgresSourceReader;
