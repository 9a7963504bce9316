use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use clinica_db::RoutingError;
use clinica_errors::Problem;

use crate::domain::error::DomainError;

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidCredentials => Self::new(
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "invalid credentials",
            )
            .with_code("INVALID_CREDENTIALS")
            .with_current_span(),
            DomainError::AccountWithoutTenant { .. } => Self::new(
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "account is not assigned to a clinic",
            )
            .with_code("MISSING_TENANT")
            .with_current_span(),
            DomainError::Auth(err) => err.into(),
            DomainError::Storage(err) => match err.downcast::<RoutingError>() {
                Ok(routing) => routing.into(),
                Err(other) => {
                    tracing::error!(error = ?other, "portal storage failure");
                    Self::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal Server Error",
                        "an internal database error occurred",
                    )
                    .with_code("STORAGE")
                    .with_current_span()
                }
            },
        }
    }
}

pub fn json_rejection_to_problem(rejection: &JsonRejection) -> Problem {
    Problem::new(rejection.status(), "Bad Request", rejection.body_text())
        .with_code("INVALID_BODY")
        .with_current_span()
}
