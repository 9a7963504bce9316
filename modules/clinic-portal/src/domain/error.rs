use clinica_auth::AuthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Unknown nickname or wrong password. Callers cannot tell which.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but is not attached to a usable clinic.
    #[error("account {nickname} has no valid tenant")]
    AccountWithoutTenant { nickname: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("storage failure")]
    Storage(#[source] anyhow::Error),
}
