use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// HS256 keys shorter than the digest size are rejected.
const MIN_SECRET_LEN: usize = 32;

fn redact<S: Serializer>(_: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("<redacted>")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be at least {MIN_SECRET_LEN} bytes")]
    SecretTooShort(&'static str),

    #[error("user and service tokens must be signed with different secrets")]
    SharedSecret,
}

/// Token signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// `iss` claim written on issue and required on verify
    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(serialize_with = "redact")]
    pub user_secret: SecretString,

    /// Shared with trusted internal services only
    #[serde(serialize_with = "redact")]
    pub service_secret: SecretString,

    #[serde(default = "default_user_ttl", with = "humantime_serde")]
    pub user_token_ttl: Duration,

    #[serde(default = "default_service_ttl", with = "humantime_serde")]
    pub service_token_ttl: Duration,

    /// Tolerated clock skew for `iat` in the future. Does not extend `exp`.
    #[serde(default = "default_leeway")]
    pub iat_leeway_seconds: u64,
}

fn default_issuer() -> String {
    "HCEN".to_owned()
}

fn default_user_ttl() -> Duration {
    Duration::from_secs(8 * 60 * 60)
}

fn default_service_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_leeway() -> u64 {
    5
}

impl AuthConfig {
    /// Config with default lifetimes and the given secrets.
    #[must_use]
    pub fn with_secrets(user_secret: &str, service_secret: &str) -> Self {
        Self {
            issuer: default_issuer(),
            user_secret: SecretString::from(user_secret),
            service_secret: SecretString::from(service_secret),
            user_token_ttl: default_user_ttl(),
            service_token_ttl: default_service_ttl(),
            iat_leeway_seconds: default_leeway(),
        }
    }

    /// # Errors
    /// [`ConfigError`] when a secret is too short or both secrets are equal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let user = self.user_secret.expose_secret();
        let service = self.service_secret.expose_secret();
        if user.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort("auth.user_secret"));
        }
        if service.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort("auth.service_secret"));
        }
        if user == service {
            return Err(ConfigError::SharedSecret);
        }
        Ok(())
    }
}
