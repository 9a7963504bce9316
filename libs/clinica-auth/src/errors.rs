use std::fmt;

use clinica_security::{AuthorizationError, TenantResolutionError};
use thiserror::Error;

use crate::claims::TokenKind;

/// Why a token was refused. Never carries token material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Malformed,
    Signature,
    Issuer,
    Expired,
    IssuedInFuture,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Malformed => "malformed token",
            Self::Signature => "signature mismatch",
            Self::Issuer => "unexpected issuer",
            Self::Expired => "token expired",
            Self::IssuedInFuture => "token issued in the future",
        })
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required: missing bearer token")]
    Unauthenticated,

    #[error("Malformed authorization header")]
    MalformedHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(TokenRejection),

    #[error("Expected a {expected} token")]
    WrongTokenType { expected: TokenKind },

    #[error("Token carries no tenant")]
    MissingTenant,

    #[error("Tenant could not be resolved: {0}")]
    TenantResolution(#[from] TenantResolutionError),

    #[error("Forbidden: {0}")]
    Forbidden(#[from] AuthorizationError),

    #[error("Token could not be issued")]
    Issue,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Self::Unauthenticated
            | Self::MalformedHeader
            | Self::InvalidToken(_)
            | Self::WrongTokenType { .. }
            | Self::MissingTenant => StatusCode::UNAUTHORIZED,
            Self::TenantResolution(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Issue | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::MalformedHeader => "MALFORMED_AUTHORIZATION",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::WrongTokenType { .. } => "WRONG_TOKEN_TYPE",
            Self::MissingTenant => "MISSING_TENANT",
            Self::TenantResolution(_) => "TENANT_RESOLUTION",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Issue | Self::Internal(_) => "AUTH_INTERNAL",
        }
    }
}

impl From<AuthError> for clinica_errors::Problem {
    fn from(e: AuthError) -> Self {
        let status = e.status();
        let title = status.canonical_reason().unwrap_or("Error");
        // Internal details stay in the logs.
        let detail = match &e {
            AuthError::Issue | AuthError::Internal(_) => {
                "authentication subsystem error".to_owned()
            }
            other => other.to_string(),
        };
        Self::new(status, title, detail)
            .with_code(e.code())
            .with_current_span()
    }
}

#[cfg(feature = "axum-ext")]
impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        clinica_errors::Problem::from(self).into_response()
    }
}
