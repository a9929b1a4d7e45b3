//! Garden database access crate.
//!
//! Provides the storage plumbing shared by the garden modules: typed
//! connection options built from [`DbConnConfig`], one pooled [`DbHandle`]
//! per process, and short-lived [`Session`]s handed out by a lazily
//! initialised [`SessionFactory`].
//!
//! # Features
//! - `sqlite` (default), `pg`: enable SQLx/SeaORM backends
//!
//! # Example
//! ```rust,no_run
//! # async fn demo() -> garden_db::Result<()> {
//! use garden_db::{DbConnConfig, SessionFactory};
//! use sea_orm::TransactionTrait;
//!
//! let factory = SessionFactory::new(DbConnConfig::from_dsn("sqlite://garden.db"));
//! let session = factory.get_session().await?;
//! let txn = session.begin().await?;
//! // ... insert / update through `&txn` ...
//! txn.commit().await?;
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(feature = "sqlite", feature = "pg")))]
compile_error!("garden-db needs at least one backend feature: `sqlite` or `pg`");

pub mod config;
pub mod options;
pub mod session;

pub use config::{DbConnConfig, PoolCfg};
pub use options::{build_db_handle, redact_credentials_in_dsn, DbConnectOptions};
pub use session::{Session, SessionFactory};

#[cfg(feature = "pg")]
use sqlx::PgPool;
#[cfg(feature = "sqlite")]
use sqlx::SqlitePool;

use sea_orm::DatabaseConnection;
use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle and session factory.
#[derive(Debug, Error)]
pub enum DbError {
    /// Storage could not be initialised. Sticky for the factory that produced it.
    #[error("Database configuration error: {0}")]
    Configuration(String),

    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error("Invalid connection parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration conflict: {0}")]
    ConfigConflict(String),

    #[error("Unknown SQLite PRAGMA parameter: {0}")]
    UnknownSqlitePragma(String),

    #[error("Invalid SQLite PRAGMA parameter '{key}': {message}")]
    InvalidSqlitePragma { key: String, message: String },

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),
}

impl DbError {
    /// True for failures caused by config/initialisation rather than by a
    /// statement or transaction against a live database.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, DbError::Sqlx(_) | DbError::Sea(_))
    }
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

/// One concrete sqlx pool.
#[derive(Clone, Debug)]
pub enum DbPool {
    #[cfg(feature = "pg")]
    Postgres(PgPool),
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

/// Process-wide pooled connection handle.
#[derive(Debug)]
pub struct DbHandle {
    engine: DbEngine,
    pool: DbPool,
    dsn: String,
    sea: DatabaseConnection,
}

impl DbHandle {
    pub(crate) fn new(engine: DbEngine, pool: DbPool, dsn: String) -> Self {
        let sea = match &pool {
            #[cfg(feature = "pg")]
            DbPool::Postgres(p) => sea_orm::SqlxPostgresConnector::from_sqlx_postgres_pool(p.clone()),
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(p) => sea_orm::SqlxSqliteConnector::from_sqlx_sqlite_pool(p.clone()),
        };
        Self {
            engine,
            pool,
            dsn,
            sea,
        }
    }

    /// Detect engine by DSN.
    ///
    /// Note: we only check scheme prefixes and don't mutate the tail (credentials etc.).
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        // Trim only leading spaces/newlines to be forgiving with env files.
        let s = dsn.trim_start();

        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(dsn.to_string()))
        }
    }

    /// Connect using a DSN and default pool settings.
    pub async fn connect(dsn: &str) -> Result<Self> {
        build_db_handle(DbConnConfig::from_dsn(dsn)).await
    }

    /// Graceful pool close. (Dropping the pool also closes it; this just makes it explicit.)
    pub async fn close(&self) {
        match &self.pool {
            #[cfg(feature = "pg")]
            DbPool::Postgres(p) => p.close().await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(p) => p.close().await,
        }
    }

    /// Get the backend.
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// DSN used for this connection, credentials redacted.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// SeaORM connection over the pool.
    pub fn seaorm(&self) -> &DatabaseConnection {
        &self.sea
    }
}
