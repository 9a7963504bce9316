//! Postgres implementation of the connection seam.

use std::str::FromStr;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{PgConnection, Postgres};

use crate::config::DbConfig;
use crate::error::DbError;
use crate::pool_opts::ApplyPoolOpts;
use crate::router::{ConnectionSource, SourceError, TenantLease};

pub type PgLease = TenantLease<PoolConnection<Postgres>>;

impl PgLease {
    /// Executor for `sqlx` queries on this lease.
    pub fn executor(&mut self) -> &mut PgConnection {
        self
    }
}

/// Build the shared pool. Connects eagerly so misconfiguration fails at startup.
///
/// # Errors
/// [`DbError::InvalidUrl`] if the url cannot be parsed, [`DbError::Sqlx`] if
/// the first connection cannot be established.
pub async fn connect_pool(cfg: &DbConfig) -> Result<PgPool, DbError> {
    let opts = PgConnectOptions::from_str(cfg.url.expose_secret()).map_err(DbError::InvalidUrl)?;
    tracing::info!(dsn = %cfg.redacted_dsn(), max_conns = cfg.pool.max_conns, "connecting database pool");
    let pool = PgPoolOptions::new()
        .apply(&cfg.pool)
        .connect_with(opts)
        .await?;
    Ok(pool)
}

/// [`ConnectionSource`] over a `sqlx` Postgres pool.
pub struct PgSource {
    pool: PgPool,
}

impl PgSource {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Close the pool, waiting for leased connections to come back.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn classify(e: sqlx::Error) -> SourceError {
    match e {
        sqlx::Error::PoolTimedOut => SourceError::Exhausted,
        other => SourceError::Other(Box::new(other)),
    }
}

#[async_trait]
impl ConnectionSource for PgSource {
    type Conn = PoolConnection<Postgres>;

    async fn checkout(&self) -> Result<Self::Conn, SourceError> {
        self.pool.acquire().await.map_err(classify)
    }

    async fn execute_directive(
        &self,
        conn: &mut Self::Conn,
        directive: &str,
    ) -> Result<(), SourceError> {
        sqlx::Executor::execute(&mut **conn, sqlx::raw_sql(directive))
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn discard(&self, conn: Self::Conn) {
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "error while closing discarded connection");
        }
    }
}
