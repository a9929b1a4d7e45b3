//! Database configuration types.
//!
//! These are deserialized straight from the `database` section of the
//! application configuration.
//!
//! ## Precedence
//!
//! 1. `params` map entries win over the same PRAGMA in the DSN query string.
//! 2. Individual fields (`host`, `port`, `user`, `password`, `dbname`) override
//!    the matching parts of a server DSN.
//! 3. For SQLite, `dsn` wins over `path`.
//!
//! ## Conflict Detection
//!
//! [`crate::options::build_db_handle`] rejects with [`crate::DbError::ConfigConflict`]:
//! - a SQLite DSN combined with `host`/`port`
//! - a non-SQLite DSN combined with `path`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Connection config for the garden database.
/// DSN must be a full, valid DSN if provided.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DbConnConfig {
    // DSN-style (full, valid). Optional: can be absent and rely on fields.
    pub dsn: Option<String>,

    // Field-based style; any of these override DSN parts when present:
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>, // literal password or ${VAR} for env expansion
    pub dbname: Option<String>,
    #[serde(default)]
    pub params: Option<HashMap<String, String>>,

    // SQLite file path (absolute, or relative to the app home dir).
    pub path: Option<PathBuf>,

    // Connection pool overrides:
    #[serde(default)]
    pub pool: Option<PoolCfg>,
}

impl DbConnConfig {
    /// Config for a DSN with everything else defaulted.
    pub fn from_dsn(dsn: impl Into<String>) -> Self {
        Self {
            dsn: Some(dsn.into()),
            ..Default::default()
        }
    }

    /// True when this config resolves to a SQLite database.
    pub fn is_sqlite(&self) -> bool {
        match &self.dsn {
            Some(dsn) => dsn.trim_start().starts_with("sqlite"),
            None => self.path.is_some() || self.host.is_none(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PoolCfg {
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    #[serde(with = "humantime_serde", default)]
    pub acquire_timeout: Option<Duration>,
    #[serde(with = "humantime_serde", default)]
    pub idle_timeout: Option<Duration>,
    #[serde(with = "humantime_serde", default)]
    pub max_lifetime: Option<Duration>,
    pub test_before_acquire: Option<bool>,
}

impl PoolCfg {
    /// Apply pool configuration to any sqlx pool builder.
    pub fn apply<DB: sqlx::Database>(
        &self,
        mut opts: sqlx::pool::PoolOptions<DB>,
    ) -> sqlx::pool::PoolOptions<DB> {
        if let Some(max_conns) = self.max_conns {
            opts = opts.max_connections(max_conns);
        }
        if let Some(min_conns) = self.min_conns {
            opts = opts.min_connections(min_conns);
        }
        if let Some(acquire_timeout) = self.acquire_timeout {
            opts = opts.acquire_timeout(acquire_timeout);
        }
        if let Some(idle_timeout) = self.idle_timeout {
            opts = opts.idle_timeout(Some(idle_timeout));
        }
        if let Some(max_lifetime) = self.max_lifetime {
            opts = opts.max_lifetime(Some(max_lifetime));
        }
        if let Some(test_before_acquire) = self.test_before_acquire {
            opts = opts.test_before_acquire(test_before_acquire);
        }
        opts
    }
}
