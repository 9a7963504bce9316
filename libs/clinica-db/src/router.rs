use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use clinica_security::{Identity, SchemaName, TenantContext};

use crate::error::{BoxError, RoutingError};

/// Failure reported by a [`ConnectionSource`].
#[derive(Debug)]
pub enum SourceError {
    /// Every connection is checked out and the bounded wait elapsed.
    Exhausted,
    Other(BoxError),
}

/// Pool seam behind [`ConnectionRouter`].
#[async_trait]
pub trait ConnectionSource: Send + Sync + 'static {
    type Conn: Send;

    async fn checkout(&self) -> Result<Self::Conn, SourceError>;

    /// Execute a session-level statement on `conn`.
    async fn execute_directive(
        &self,
        conn: &mut Self::Conn,
        directive: &str,
    ) -> Result<(), SourceError>;

    /// Close `conn` instead of returning it to the pool.
    async fn discard(&self, conn: Self::Conn);
}

/// A checked-out connection already routed to `schema`.
///
/// Dropping the lease returns the connection to the pool as-is. It is not
/// reset because the next checkout reapplies the directive anyway.
pub struct TenantLease<C> {
    conn: C,
    schema: SchemaName,
}

impl<C> TenantLease<C> {
    #[must_use]
    pub fn schema(&self) -> &SchemaName {
        &self.schema
    }
}

impl<C> Deref for TenantLease<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.conn
    }
}

impl<C> DerefMut for TenantLease<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.conn
    }
}

/// Hands out connections whose `search_path` matches the identity they serve.
///
/// The directive runs on every checkout. Nothing is remembered per physical
/// connection, so a connection last used by another tenant is always
/// reconfigured before the caller sees it.
pub struct ConnectionRouter<S> {
    source: Arc<S>,
}

impl<S> Clone for ConnectionRouter<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: ConnectionSource> ConnectionRouter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Checkout for the identity bound to the current task.
    ///
    /// # Errors
    /// [`RoutingError::Unbound`] when [`TenantContext`] is unset (for example
    /// in a spawned task), otherwise as [`ConnectionRouter::acquire_for`].
    pub async fn acquire(&self) -> Result<TenantLease<S::Conn>, RoutingError> {
        let Some(identity) = TenantContext::get().into_identity() else {
            tracing::warn!("connection requested without a bound tenant context");
            return Err(RoutingError::Unbound);
        };
        self.acquire_for(&identity).await
    }

    /// Checkout for an explicitly supplied identity.
    ///
    /// # Errors
    /// [`RoutingError::ResourceUnavailable`] on pool exhaustion,
    /// [`RoutingError::Directive`] if the schema could not be applied,
    /// [`RoutingError::Checkout`] for any other pool failure.
    pub async fn acquire_for(
        &self,
        identity: &Identity,
    ) -> Result<TenantLease<S::Conn>, RoutingError> {
        self.acquire_schema(identity.schema()).await
    }

    async fn acquire_schema(
        &self,
        schema: SchemaName,
    ) -> Result<TenantLease<S::Conn>, RoutingError> {
        let mut conn = self.source.checkout().await.map_err(|e| match e {
            SourceError::Exhausted => {
                tracing::warn!(schema = %schema, "connection pool exhausted");
                RoutingError::ResourceUnavailable
            }
            SourceError::Other(source) => RoutingError::Checkout(source),
        })?;

        let directive = schema.search_path_directive();
        if let Err(e) = self.source.execute_directive(&mut conn, &directive).await {
            tracing::error!(schema = %schema, error = ?e, "search_path directive failed, discarding connection");
            self.source.discard(conn).await;
            let source = match e {
                SourceError::Exhausted => "connection exhausted while routing".into(),
                SourceError::Other(source) => source,
            };
            return Err(RoutingError::Directive {
                schema: schema.to_string(),
                source,
            });
        }

        tracing::trace!(schema = %schema, "connection routed");
        Ok(TenantLease { conn, schema })
    }
}
