use std::sync::Arc;
use std::time::Duration;

use clinica_auth::{TokenClaims, TokenCodec};
use clinica_security::TenantId;

use crate::domain::error::DomainError;
use crate::domain::model::{LoginOutcome, Professional};
use crate::domain::password::PasswordVerifier;
use crate::domain::repo::{AccountRepo, StaffRepo};

/// Verified when the account is unknown, so both failure paths cost one bcrypt check.
const DUMMY_HASH: &str = "$2b$12$i4KLHFvjqcWCJ5kiIapVHuLPiXWftj/ZXIlDStUCRwzkS3bi0mfOO";

/// Exchanges portal credentials for a user token.
pub struct LoginService<A: AccountRepo> {
    accounts: Arc<A>,
    verifier: Arc<dyn PasswordVerifier>,
    codec: Arc<TokenCodec>,
    token_ttl: Duration,
}

impl<A: AccountRepo> LoginService<A> {
    #[must_use]
    pub fn new(
        accounts: Arc<A>,
        verifier: Arc<dyn PasswordVerifier>,
        codec: Arc<TokenCodec>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            accounts,
            verifier,
            codec,
            token_ttl,
        }
    }

    /// Authenticate `nickname` and issue a token naming its clinic and role.
    ///
    /// # Errors
    /// [`DomainError::InvalidCredentials`] for an unknown nickname or a wrong
    /// password, [`DomainError::AccountWithoutTenant`] when the account has no
    /// usable clinic, [`DomainError::Storage`] if the lookup fails.
    pub async fn login(&self, nickname: &str, password: &str) -> Result<LoginOutcome, DomainError> {
        let account = self
            .accounts
            .find_by_nickname(nickname)
            .await
            .map_err(DomainError::Storage)?;

        let Some((account, hash)) =
            account.and_then(|a| a.password_hash.clone().map(|h| (a, h)))
        else {
            self.check_password(password, DUMMY_HASH.to_owned()).await?;
            tracing::warn!(target: "security", nickname, "login for unknown account");
            return Err(DomainError::InvalidCredentials);
        };

        if !self.check_password(password, hash).await? {
            tracing::warn!(target: "security", nickname, "login with wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        let Some(Ok(tenant)) = account.tenant_id.as_deref().map(TenantId::parse) else {
            tracing::warn!(target: "security", nickname, "account has no valid tenant");
            return Err(DomainError::AccountWithoutTenant {
                nickname: account.nickname,
            });
        };

        let role = account.effective_role();
        let token = self.codec.issue(
            &account.nickname,
            TokenClaims::User {
                tenant_id: Some(tenant.to_string()),
                role: Some(role.clone()),
            },
            self.token_ttl,
        )?;

        tracing::info!(tenant_id = %tenant, role = %role, "login succeeded");
        Ok(LoginOutcome {
            token,
            role,
            tenant_id: tenant.into(),
        })
    }

    /// bcrypt is CPU-bound, so it runs off the async workers.
    async fn check_password(&self, password: &str, hash: String) -> Result<bool, DomainError> {
        let verifier = Arc::clone(&self.verifier);
        let password = password.to_owned();
        let outcome = tokio::task::spawn_blocking(move || verifier.verify(&password, &hash))
            .await
            .map_err(|e| DomainError::Storage(e.into()))?;
        Ok(outcome.unwrap_or_else(|e| {
            tracing::error!(error = %e, "stored password hash is unreadable");
            false
        }))
    }
}

/// Professionals of the clinic bound to the current request.
pub struct StaffDirectory<S: StaffRepo> {
    repo: Arc<S>,
}

impl<S: StaffRepo> StaffDirectory<S> {
    #[must_use]
    pub fn new(repo: Arc<S>) -> Self {
        Self { repo }
    }

    /// # Errors
    /// [`DomainError::Storage`], wrapping a routing error when no connection
    /// could be routed to the clinic.
    pub async fn list(&self) -> Result<Vec<Professional>, DomainError> {
        let staff = self
            .repo
            .list_professionals()
            .await
            .map_err(DomainError::Storage)?;
        tracing::debug!(count = staff.len(), "professionals listed");
        Ok(staff)
    }
}
