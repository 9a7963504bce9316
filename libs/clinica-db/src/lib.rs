//! Database access for tenant-scoped work.
//!
//! [`ConnectionRouter`] is the only way application code obtains a
//! connection. Every checkout is configured for the identity it serves by a
//! session-level `search_path`, so queries stay unqualified.

pub mod config;
pub mod error;
pub mod pg;
pub mod pool_opts;
pub mod router;

pub use config::{DbConfig, PoolCfg};
pub use error::{DbError, RoutingError};
pub use pg::{PgLease, PgSource, connect_pool};
pub use pool_opts::ApplyPoolOpts;
pub use router::{ConnectionRouter, ConnectionSource, SourceError, TenantLease};

pub type Result<T> = std::result::Result<T, DbError>;
