//! SQLite connection handle shared by modules.
//!
//! `DbHandle` owns one sqlx pool and the SeaORM connection built on top of it.
//! File databases run in WAL mode with `synchronous = NORMAL` and a busy timeout,
//! so concurrent writers queue instead of failing. In-memory databases are pinned
//! to a single long-lived connection so every query sees the same database.
//!
//! ```rust,no_run
//! # async fn demo() -> modkit_db::Result<()> {
//! use modkit_db::{ConnectOpts, DbHandle};
//!
//! let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//! let conn = db.sea();
//! # drop(conn);
//! db.close().await;
//! # Ok(())
//! # }
//! ```

pub mod sqlite;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use thiserror::Error;

pub use sqlite::{absolutize_dsn, is_memory_dsn};

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("unsupported DSN (only sqlite is available): {0}")]
    UnsupportedDsn(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Pool knobs; each applies to file databases only.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    pub acquire_timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
    pub busy_timeout: Duration,
    /// Create parent directories of a file DSN when missing.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            busy_timeout: Duration::from_millis(5000),
            create_sqlite_dirs: true,
        }
    }
}

#[derive(Debug)]
pub struct DbHandle {
    pool: SqlitePool,
    dsn: String,
    in_memory: bool,
    sea: DatabaseConnection,
}

impl DbHandle {
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let dsn = dsn.trim();
        if !dsn.starts_with("sqlite:") {
            return Err(DbError::UnsupportedDsn(dsn.to_string()));
        }
        let in_memory = is_memory_dsn(dsn);

        if !in_memory && opts.create_sqlite_dirs {
            if let Some(parent) = sqlite::file_path(dsn).as_deref().and_then(Path::parent) {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let mut connect = SqliteConnectOptions::from_str(dsn)?
            .create_if_missing(true)
            .foreign_keys(true);
        let mut pool = SqlitePoolOptions::new();

        if in_memory {
            connect = connect.journal_mode(SqliteJournalMode::Memory);
            pool = pool
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            connect = connect
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .busy_timeout(opts.busy_timeout);
            if let Some(n) = opts.max_conns {
                pool = pool.max_connections(n.max(1));
            }
            if let Some(n) = opts.min_conns {
                pool = pool.min_connections(n);
            }
            if let Some(t) = opts.idle_timeout {
                pool = pool.idle_timeout(t);
            }
        }
        if let Some(t) = opts.acquire_timeout {
            pool = pool.acquire_timeout(t);
        }

        let pool = pool.connect_with(connect).await?;
        let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());
        tracing::debug!(dsn, in_memory, "sqlite pool ready");

        Ok(Self {
            pool,
            dsn: dsn.to_string(),
            in_memory,
            sea,
        })
    }

    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn is_memory(&self) -> bool {
        self.in_memory
    }

    /// SeaORM connection (cheap clone of the pooled handle).
    pub fn sea(&self) -> DatabaseConnection {
        self.sea.clone()
    }

    pub fn seaorm(&self) -> &DatabaseConnection {
        &self.sea
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
