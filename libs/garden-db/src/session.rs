//! Lazily initialised session factory.
//!
//! The factory owns the connection config and builds the pooled
//! [`DbHandle`] on the first [`SessionFactory::get_session`] call. The
//! outcome of that first build is kept for the life of the factory: a
//! failure is reported as [`DbError::Configuration`] to every caller and is
//! never retried.

use crate::config::DbConnConfig;
use crate::options::{build_db_handle, redact_credentials_in_dsn};
use crate::{DbError, DbHandle, Result};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

type InitOutcome = std::result::Result<Arc<DbHandle>, String>;

pub struct SessionFactory {
    config: DbConnConfig,
    handle: OnceCell<InitOutcome>,
    init_attempts: AtomicUsize,
    open_sessions: Arc<AtomicUsize>,
}

impl fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionFactory")
            .field("dsn", &redact_credentials_in_dsn(self.config.dsn.as_deref()))
            .field("initialized", &self.is_initialized())
            .field("open_sessions", &self.open_sessions())
            .finish()
    }
}

impl SessionFactory {
    /// Create a factory. No I/O happens until the first session is requested.
    pub fn new(config: DbConnConfig) -> Self {
        Self {
            config,
            handle: OnceCell::new(),
            init_attempts: AtomicUsize::new(0),
            open_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Factory around an already connected handle.
    pub fn from_handle(handle: DbHandle) -> Self {
        Self {
            config: DbConnConfig::from_dsn(handle.dsn()),
            handle: OnceCell::new_with(Some(Ok(Arc::new(handle)))),
            init_attempts: AtomicUsize::new(0),
            open_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle, building it on first use.
    pub async fn handle(&self) -> Result<Arc<DbHandle>> {
        let outcome = self
            .handle
            .get_or_init(|| async {
                self.init_attempts.fetch_add(1, Ordering::SeqCst);
                let dsn = redact_credentials_in_dsn(self.config.dsn.as_deref());
                match build_db_handle(self.config.clone()).await {
                    Ok(handle) => {
                        tracing::info!(dsn = %handle.dsn(), "Session factory initialized");
                        Ok(Arc::new(handle))
                    }
                    Err(e) => {
                        tracing::error!(dsn = %dsn, error = %e, "Session factory initialization failed");
                        Err(e.to_string())
                    }
                }
            })
            .await;

        match outcome {
            Ok(handle) => Ok(Arc::clone(handle)),
            Err(message) => Err(DbError::Configuration(message.clone())),
        }
    }

    /// Open a new session bound to the shared handle.
    pub async fn get_session(&self) -> Result<Session> {
        let handle = self.handle().await?;
        let open = self.open_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(open_sessions = open, "Session opened");
        Ok(Session {
            handle,
            lease: SessionLease(Arc::clone(&self.open_sessions)),
        })
    }

    /// Number of sessions currently alive.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// True once the first initialization has run, whatever its outcome.
    pub fn is_initialized(&self) -> bool {
        self.handle.initialized()
    }

    /// How many times the heavyweight setup actually ran.
    pub fn init_attempts(&self) -> usize {
        self.init_attempts.load(Ordering::SeqCst)
    }

    /// Close the pool if it was ever opened.
    pub async fn close(&self) {
        if let Some(Ok(handle)) = self.handle.get() {
            handle.close().await;
            tracing::debug!("Session factory closed");
        }
    }
}

struct SessionLease(Arc<AtomicUsize>);

impl Drop for SessionLease {
    fn drop(&mut self) {
        let left = self.0.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::trace!(open_sessions = left, "Session released");
    }
}

/// One unit-of-work scope. Released when dropped.
pub struct Session {
    handle: Arc<DbHandle>,
    #[allow(dead_code)]
    lease: SessionLease,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("dsn", &self.handle.dsn())
            .finish()
    }
}

impl Session {
    /// Begin a transaction. Dropping it without `commit` rolls it back.
    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        Ok(self.handle.seaorm().begin().await?)
    }

    /// Connection for reads outside an explicit transaction.
    pub fn connection(&self) -> &DatabaseConnection {
        self.handle.seaorm()
    }

    pub fn handle(&self) -> &DbHandle {
        &self.handle
    }
}
