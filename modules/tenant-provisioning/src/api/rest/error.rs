use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use clinica_errors::Problem;

use crate::domain::error::DomainError;

/// Map a domain error to an RFC 9457 Problem.
pub fn domain_error_to_problem(e: &DomainError) -> Problem {
    let problem = match e {
        DomainError::Validation { field, message } => Problem::new(
            StatusCode::BAD_REQUEST,
            "Bad Request",
            format!("Validation error on '{field}': {message}"),
        )
        .with_code("VALIDATION"),
        DomainError::Tenant(err) => Problem::new(
            StatusCode::BAD_REQUEST,
            "Bad Request",
            format!("Invalid tenant id: {err}"),
        )
        .with_code("TENANT_RESOLUTION"),
        DomainError::Provisioning(err) => {
            tracing::error!(
                step = %err.step,
                tenant_id = err.tenant.as_deref(),
                error = ?err.source,
                "provisioning failed"
            );
            // Step and tenant only; the source may carry connection details.
            Problem::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Provisioning Failed",
                err.to_string(),
            )
            .with_code("PROVISIONING_FAILED")
            .retryable()
        }
    };
    problem.with_current_span()
}

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        domain_error_to_problem(&e)
    }
}

pub fn json_rejection_to_problem(rejection: &JsonRejection) -> Problem {
    Problem::new(rejection.status(), "Bad Request", rejection.body_text())
        .with_code("INVALID_BODY")
        .with_current_span()
}
