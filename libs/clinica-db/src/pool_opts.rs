//! Pool options application trait.

use sqlx::postgres::PgPoolOptions;

use crate::config::PoolCfg;

/// Applies [`PoolCfg`] to a pool builder.
pub trait ApplyPoolOpts {
    #[must_use]
    fn apply(self, cfg: &PoolCfg) -> Self;
}

impl ApplyPoolOpts for PgPoolOptions {
    fn apply(mut self, cfg: &PoolCfg) -> Self {
        self = self
            .max_connections(cfg.max_conns)
            .acquire_timeout(cfg.acquire_timeout)
            .idle_timeout(cfg.idle_timeout)
            .max_lifetime(cfg.max_lifetime)
            .test_before_acquire(cfg.test_before_acquire);
        if let Some(n) = cfg.min_conns {
            self = self.min_connections(n);
        }
        self
    }
}
