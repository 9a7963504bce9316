use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building the pool.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid database url: {0}")]
    InvalidUrl(#[source] sqlx::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Errors raised while handing a connection to tenant-scoped work.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The pool had no free connection within its acquire timeout.
    #[error("no database connection became available in time")]
    ResourceUnavailable,

    /// Ambient checkout was requested with no identity bound to the task.
    #[error("no tenant identity is bound to the current task")]
    Unbound,

    /// The session directive could not be applied. The connection was discarded.
    #[error("failed to route connection to schema {schema}")]
    Directive {
        schema: String,
        #[source]
        source: BoxError,
    },

    #[error("connection checkout failed")]
    Checkout(#[source] BoxError),
}

impl RoutingError {
    /// Retrying the same unit of work may succeed. `Unbound` is a programming error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Unbound)
    }
}

impl From<RoutingError> for clinica_errors::Problem {
    fn from(e: RoutingError) -> Self {
        use http::StatusCode;
        let problem = match &e {
            RoutingError::ResourceUnavailable => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Service Unavailable",
                "no database connection available, retry later",
            )
            .with_code("RESOURCE_UNAVAILABLE"),
            RoutingError::Unbound => {
                tracing::error!("tenant-scoped query issued outside a bound context");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "request context is not bound",
                )
                .with_code("CONTEXT_UNBOUND")
            }
            RoutingError::Directive { schema, source } => {
                tracing::error!(schema = %schema, error = %source, "connection routing failed");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service Unavailable",
                    "could not route the connection for this request",
                )
                .with_code("CONNECTION_ROUTING")
            }
            RoutingError::Checkout(source) => {
                tracing::error!(error = %source, "connection checkout failed");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service Unavailable",
                    "database is unavailable",
                )
                .with_code("CONNECTION_ROUTING")
            }
        };
        let problem = if e.is_retryable() {
            problem.retryable()
        } else {
            problem
        };
        problem.with_current_span()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use clinica_errors::Problem;

    #[test]
    fn routing_failures_are_retryable_service_unavailable() {
        let p = Problem::from(RoutingError::ResourceUnavailable);
        assert_eq!(p.status, http::StatusCode::SERVICE_UNAVAILABLE);
        assert!(p.retryable);

        let p = Problem::from(RoutingError::Directive {
            schema: "schema_clinica_1".to_owned(),
            source: "boom".into(),
        });
        assert_eq!(p.code, "CONNECTION_ROUTING");
        assert!(!p.detail.contains("schema_clinica_1"));
    }

    #[test]
    fn unbound_is_not_retryable() {
        let p = Problem::from(RoutingError::Unbound);
        assert_eq!(p.status, http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!p.retryable);
    }
}
