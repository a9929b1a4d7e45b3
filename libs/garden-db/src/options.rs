//! Typed connection options and the handle builder.

use crate::config::{DbConnConfig, PoolCfg};
use crate::{DbEngine, DbError, DbHandle, DbPool, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Busy timeout applied to file-backed SQLite databases unless overridden.
pub const DEFAULT_SQLITE_BUSY_TIMEOUT: i64 = 5000;

/// Database connection options using typed sqlx ConnectOptions.
#[derive(Debug, Clone)]
pub enum DbConnectOptions {
    #[cfg(feature = "sqlite")]
    Sqlite(sqlx::sqlite::SqliteConnectOptions),
    #[cfg(feature = "pg")]
    Postgres(sqlx::postgres::PgConnectOptions),
}

impl std::fmt::Display for DbConnectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "sqlite")]
            DbConnectOptions::Sqlite(opts) => {
                let filename = opts.get_filename().display().to_string();
                if filename.is_empty() || filename.contains("in-memory") {
                    write!(f, "sqlite://memory")
                } else {
                    write!(f, "sqlite://{}", filename)
                }
            }
            #[cfg(feature = "pg")]
            DbConnectOptions::Postgres(opts) => write!(
                f,
                "postgresql://<redacted>@{}:{}/{}",
                opts.get_host(),
                opts.get_port(),
                opts.get_database().unwrap_or("")
            ),
        }
    }
}

impl DbConnectOptions {
    /// Open a pool with these options and wrap it in a [`DbHandle`].
    pub async fn connect(&self, pool: &PoolCfg) -> Result<DbHandle> {
        let dsn = self.to_string();
        match self {
            #[cfg(feature = "sqlite")]
            DbConnectOptions::Sqlite(opts) => {
                let pool_opts = pool.apply(sqlx::sqlite::SqlitePoolOptions::new());
                let sqlx_pool = pool_opts.connect_with(opts.clone()).await?;
                Ok(DbHandle::new(
                    DbEngine::Sqlite,
                    DbPool::Sqlite(sqlx_pool),
                    dsn,
                ))
            }
            #[cfg(feature = "pg")]
            DbConnectOptions::Postgres(opts) => {
                let pool_opts = pool.apply(sqlx::postgres::PgPoolOptions::new());
                let sqlx_pool = pool_opts.connect_with(opts.clone()).await?;
                Ok(DbHandle::new(
                    DbEngine::Postgres,
                    DbPool::Postgres(sqlx_pool),
                    dsn,
                ))
            }
        }
    }
}

/// SQLite PRAGMA whitelist and validation.
pub mod sqlite_pragma {
    use crate::DbError;
    use std::collections::HashMap;

    /// Whitelisted SQLite PRAGMA parameters.
    pub const ALLOWED_PRAGMAS: &[&str] = &["wal", "synchronous", "busy_timeout", "journal_mode"];

    pub fn is_pragma(key: &str) -> bool {
        ALLOWED_PRAGMAS.contains(&key.to_lowercase().as_str())
    }

    /// Validate and apply SQLite PRAGMA parameters to connection options.
    #[cfg(feature = "sqlite")]
    pub fn apply_pragmas(
        mut opts: sqlx::sqlite::SqliteConnectOptions,
        params: &HashMap<String, String>,
    ) -> crate::Result<sqlx::sqlite::SqliteConnectOptions> {
        for (key, value) in params {
            match key.to_lowercase().as_str() {
                "wal" => {
                    opts = opts.pragma("journal_mode", validate_wal(value)?);
                }
                "journal_mode" => {
                    opts = opts.pragma("journal_mode", validate_journal_mode(value)?);
                }
                "synchronous" => {
                    opts = opts.pragma("synchronous", validate_synchronous(value)?);
                }
                "busy_timeout" => {
                    opts = opts.pragma("busy_timeout", validate_busy_timeout(value)?.to_string());
                }
                _ => return Err(DbError::UnknownSqlitePragma(key.clone())),
            }
        }

        Ok(opts)
    }

    /// Validate every entry without building options.
    pub fn validate(params: &HashMap<String, String>) -> crate::Result<()> {
        for (key, value) in params {
            match key.to_lowercase().as_str() {
                "wal" => validate_wal(value).map(|_| ())?,
                "journal_mode" => validate_journal_mode(value).map(|_| ())?,
                "synchronous" => validate_synchronous(value).map(|_| ())?,
                "busy_timeout" => validate_busy_timeout(value).map(|_| ())?,
                _ => return Err(DbError::UnknownSqlitePragma(key.clone())),
            }
        }
        Ok(())
    }

    fn validate_wal(value: &str) -> crate::Result<&'static str> {
        match value.to_lowercase().as_str() {
            "true" | "1" => Ok("WAL"),
            "false" | "0" => Ok("DELETE"),
            _ => Err(DbError::InvalidSqlitePragma {
                key: "wal".to_string(),
                message: format!("must be true/false/1/0, got '{}'", value),
            }),
        }
    }

    fn validate_synchronous(value: &str) -> crate::Result<String> {
        match value.to_uppercase().as_str() {
            "OFF" | "NORMAL" | "FULL" | "EXTRA" => Ok(value.to_uppercase()),
            _ => Err(DbError::InvalidSqlitePragma {
                key: "synchronous".to_string(),
                message: format!("must be OFF/NORMAL/FULL/EXTRA, got '{}'", value),
            }),
        }
    }

    fn validate_busy_timeout(value: &str) -> crate::Result<i64> {
        let timeout = value
            .parse::<i64>()
            .map_err(|_| DbError::InvalidSqlitePragma {
                key: "busy_timeout".to_string(),
                message: format!("must be a non-negative integer, got '{}'", value),
            })?;

        if timeout < 0 {
            return Err(DbError::InvalidSqlitePragma {
                key: "busy_timeout".to_string(),
                message: format!("must be non-negative, got '{}'", timeout),
            });
        }

        Ok(timeout)
    }

    fn validate_journal_mode(value: &str) -> crate::Result<String> {
        match value.to_uppercase().as_str() {
            "DELETE" | "WAL" | "MEMORY" | "TRUNCATE" | "PERSIST" | "OFF" => {
                Ok(value.to_uppercase())
            }
            _ => Err(DbError::InvalidSqlitePragma {
                key: "journal_mode".to_string(),
                message: format!(
                    "must be DELETE/WAL/MEMORY/TRUNCATE/PERSIST/OFF, got '{}'",
                    value
                ),
            }),
        }
    }
}

/// Build a database handle from configuration.
///
/// Expands `${VAR}` references, validates the config, builds typed connect
/// options and opens the pool.
pub async fn build_db_handle(mut cfg: DbConnConfig) -> Result<DbHandle> {
    if let Some(dsn) = &cfg.dsn {
        cfg.dsn = Some(expand_env_vars(dsn)?);
    }
    if let Some(password) = &cfg.password {
        cfg.password = Some(resolve_password(password)?);
    }
    if let Some(ref mut params) = cfg.params {
        for value in params.values_mut() {
            if value.contains("${") {
                *value = expand_env_vars(value)?;
            }
        }
    }

    validate_config_consistency(&cfg)?;

    let is_sqlite = cfg.is_sqlite();
    let connect_options = if is_sqlite {
        build_sqlite_options(&cfg)?
    } else {
        build_server_options(&cfg)?
    };

    tracing::debug!(
        dsn = %redact_credentials_in_dsn(cfg.dsn.as_deref()),
        target = %connect_options,
        is_sqlite,
        "Building database connection"
    );

    connect_options
        .connect(&cfg.pool.clone().unwrap_or_default())
        .await
}

/// Split a SQLite DSN into its location and query parameters.
fn split_sqlite_dsn(dsn: &str) -> Result<(String, HashMap<String, String>)> {
    let rest = dsn
        .trim()
        .strip_prefix("sqlite:")
        .ok_or_else(|| DbError::InvalidParameter(format!("Invalid SQLite DSN: {}", dsn)))?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);

    let (location, query) = match rest.split_once('?') {
        Some((location, query)) => (location, Some(query)),
        None => (rest, None),
    };

    let mut params = HashMap::new();
    for pair in query.unwrap_or("").split('&').filter(|p| !p.is_empty()) {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(k.to_string(), v.to_string());
    }

    Ok((location.to_string(), params))
}

/// True for DSNs that name an in-memory SQLite database.
pub fn is_memory_dsn(dsn: &str) -> bool {
    let dsn = dsn.trim();
    dsn.starts_with("sqlite::memory:")
        || dsn.starts_with("sqlite://:memory:")
        || dsn.contains("mode=memory")
}

/// Build SQLite connection options from configuration.
fn build_sqlite_options(cfg: &DbConnConfig) -> Result<DbConnectOptions> {
    #[cfg(feature = "sqlite")]
    {
        use std::str::FromStr;

        let (location, dsn_params) = match &cfg.dsn {
            Some(dsn) => split_sqlite_dsn(dsn)?,
            None => match &cfg.path {
                Some(path) => (path.display().to_string(), HashMap::new()),
                None => {
                    return Err(DbError::InvalidParameter(
                        "SQLite connection requires either DSN or path".to_string(),
                    ))
                }
            },
        };

        // DSN pragmas first, then `params` on top.
        let mut pragmas: HashMap<String, String> = HashMap::new();
        let mut passthrough: Vec<(String, String)> = Vec::new();
        for (k, v) in dsn_params {
            if sqlite_pragma::is_pragma(&k) {
                pragmas.insert(k.to_lowercase(), v);
            } else {
                passthrough.push((k, v));
            }
        }
        if let Some(params) = &cfg.params {
            for (k, v) in params {
                pragmas.insert(k.to_lowercase(), v.clone());
            }
        }

        let memory = cfg.dsn.as_deref().is_some_and(is_memory_dsn);
        let opts = if memory {
            let mut dsn = format!("sqlite:{}", location);
            if !passthrough.is_empty() {
                let query: Vec<String> =
                    passthrough.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                dsn = format!("{}?{}", dsn, query.join("&"));
            }
            sqlx::sqlite::SqliteConnectOptions::from_str(&dsn)?
        } else {
            if let Some((key, _)) = passthrough.first() {
                return Err(DbError::UnknownSqlitePragma(key.clone()));
            }
            let db_path = PathBuf::from(&location);
            if db_path.as_os_str().is_empty() {
                return Err(DbError::InvalidParameter(
                    "SQLite DSN has an empty path".to_string(),
                ));
            }
            if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            sqlx::sqlite::SqliteConnectOptions::new()
                .filename(&db_path)
                .create_if_missing(true)
                .pragma("busy_timeout", DEFAULT_SQLITE_BUSY_TIMEOUT.to_string())
        };

        let opts = sqlite_pragma::apply_pragmas(opts, &pragmas)?;
        Ok(DbConnectOptions::Sqlite(opts))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = cfg;
        Err(DbError::FeatureDisabled("SQLite feature not enabled"))
    }
}

/// Build server-based connection options from configuration.
fn build_server_options(cfg: &DbConnConfig) -> Result<DbConnectOptions> {
    let scheme = match &cfg.dsn {
        Some(dsn) => url::Url::parse(dsn)?.scheme().to_string(),
        None => "postgresql".to_string(),
    };

    match scheme.as_str() {
        "postgresql" | "postgres" => {
            #[cfg(feature = "pg")]
            {
                let mut opts = match &cfg.dsn {
                    Some(dsn) => dsn
                        .parse::<sqlx::postgres::PgConnectOptions>()
                        .map_err(|e| DbError::InvalidParameter(e.to_string()))?,
                    None => sqlx::postgres::PgConnectOptions::new(),
                };

                if let Some(host) = &cfg.host {
                    opts = opts.host(host);
                }
                if let Some(port) = cfg.port {
                    opts = opts.port(port);
                }
                if let Some(user) = &cfg.user {
                    opts = opts.username(user);
                }
                if let Some(password) = &cfg.password {
                    opts = opts.password(password);
                }
                if let Some(dbname) = &cfg.dbname {
                    opts = opts.database(dbname);
                } else if cfg.dsn.is_none() {
                    return Err(DbError::InvalidParameter(
                        "dbname is required for PostgreSQL connections".to_string(),
                    ));
                }
                if let Some(params) = &cfg.params {
                    for (key, value) in params {
                        opts = opts.options([(key.as_str(), value.as_str())]);
                    }
                }

                Ok(DbConnectOptions::Postgres(opts))
            }
            #[cfg(not(feature = "pg"))]
            {
                Err(DbError::FeatureDisabled("PostgreSQL feature not enabled"))
            }
        }
        _ => Err(DbError::InvalidParameter(format!(
            "Unsupported database scheme: {}",
            scheme
        ))),
    }
}

/// Expand `${VAR}` references from the process environment.
pub fn expand_env_vars(input: &str) -> Result<String> {
    let re = regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| DbError::InvalidParameter(e.to_string()))?;
    let mut result = input.to_string();
    for caps in re.captures_iter(input) {
        let value = std::env::var(&caps[1])?;
        result = result.replace(&caps[0], &value);
    }
    Ok(result)
}

/// Resolve password from environment variable if it is exactly `${VAR}`.
fn resolve_password(password: &str) -> Result<String> {
    match password
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        Some(var_name) => Ok(std::env::var(var_name)?),
        None => Ok(password.to_string()),
    }
}

/// Detect contradictory connection settings.
pub fn validate_config_consistency(cfg: &DbConnConfig) -> Result<()> {
    let has_server_fields = cfg.host.is_some() || cfg.port.is_some();

    if let Some(dsn) = &cfg.dsn {
        let is_sqlite_dsn = dsn.trim_start().starts_with("sqlite");

        if is_sqlite_dsn && has_server_fields {
            return Err(DbError::ConfigConflict(
                "SQLite DSN cannot be used with host/port fields".to_string(),
            ));
        }
        if !is_sqlite_dsn && cfg.path.is_some() {
            return Err(DbError::ConfigConflict(
                "Non-SQLite DSN cannot be used with path field".to_string(),
            ));
        }
    }

    if cfg.path.is_some() && has_server_fields {
        return Err(DbError::ConfigConflict(
            "SQLite path field cannot be used with host/port fields".to_string(),
        ));
    }

    if cfg.is_sqlite() {
        if let Some(params) = &cfg.params {
            sqlite_pragma::validate(params)?;
        }
    }

    Ok(())
}

/// Redact credentials from DSN for logging.
pub fn redact_credentials_in_dsn(dsn: Option<&str>) -> String {
    match dsn {
        Some(dsn) if dsn.contains('@') => match url::Url::parse(dsn) {
            Ok(mut parsed) => {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("***"));
                }
                parsed.to_string()
            }
            Err(_) => "***".to_string(),
        },
        Some(dsn) => dsn.to_string(),
        None => "none".to_string(),
    }
}
