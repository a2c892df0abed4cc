//! Test utilities for database operations.
//!
//! [`TestDatabase::in_memory`] gives every test its own migrated SQLite
//! database; [`TestDatabase::postgres`] connects to a running `PostgreSQL`
//! instance for the ignored integration tests. With the `test-utils` feature,
//! [`TestDatabase::sqlite_file`] backs a multi-connection pool with a
//! temporary file, so transactions actually contend.

use std::sync::Arc;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    Statement,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "inkwell_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "inkwell_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "inkwell_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated database for tests.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
    #[cfg(feature = "test-utils")]
    _dir: Option<tempfile::TempDir>,
}

impl TestDatabase {
    /// A fresh in-memory SQLite database with all migrations applied.
    ///
    /// The pool holds exactly one connection: every pooled connection to
    /// `sqlite::memory:` would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .idle_timeout(std::time::Duration::from_secs(3600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        Ok(Self {
            conn: Arc::new(conn),
            #[cfg(feature = "test-utils")]
            _dir: None,
        })
    }

    /// A migrated SQLite database in a temporary file behind a pool of
    /// `max_connections` connections. The file is removed on drop.
    #[cfg(feature = "test-utils")]
    pub async fn sqlite_file(max_connections: u32) -> Result<Self, DbErr> {
        let dir = tempfile::tempdir().map_err(|e| DbErr::Custom(e.to_string()))?;
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("inkwell.db").display());

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(max_connections)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        Ok(Self {
            conn: Arc::new(conn),
            _dir: Some(dir),
        })
    }

    /// Connect to the configured `PostgreSQL` test database and migrate it.
    pub async fn postgres(config: &TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self {
            conn: Arc::new(conn),
            #[cfg(feature = "test-utils")]
            _dir: None,
        })
    }

    /// Get a shared handle to the connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Remove all rows from every application table.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let backend = self.conn.get_database_backend();
        for table in ["likes", "comments", "posts", "users"] {
            let sql = match backend {
                DatabaseBackend::Postgres => format!("TRUNCATE TABLE \"{table}\" CASCADE"),
                _ => format!("DELETE FROM \"{table}\""),
            };
            self.conn
                .execute(Statement::from_string(backend, sql))
                .await?;
        }

        info!("Cleaned up test database");
        Ok(())
    }
}
