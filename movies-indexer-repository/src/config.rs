//! Configuration types for the PostgreSQL source.

use sqlx::postgres::PgConnectOptions;

/// Connection settings for the relational store.
///
/// Kept separate from a connection URL so that credentials never need to be
/// percent-encoded or logged as part of a string.
#[derive(Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Maximum number of pooled connections.
    ///
    /// The indexer issues one query at a time, so a small pool is enough.
    pub max_connections: u32,
}

impl PostgresConfig {
    /// Connection options for `sqlx`.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

impl std::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}
