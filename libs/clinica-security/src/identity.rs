use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{SchemaName, TenantId};

/// Role name as carried in the token. Comparison is ASCII case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub const ADMINISTRADOR: &'static str = "ADMINISTRADOR";
    pub const PROFESIONAL: &'static str = "PROFESIONAL";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for Role {}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a clinic user, always tied to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub tenant_id: TenantId,
    pub schema: SchemaName,
    pub role: Option<Role>,
    pub subject: String,
}

impl UserIdentity {
    #[must_use]
    pub fn new(tenant_id: TenantId, role: Option<Role>, subject: impl Into<String>) -> Self {
        let schema = tenant_id.schema();
        Self {
            tenant_id,
            schema,
            role,
            subject: subject.into(),
        }
    }
}

/// Identity of a trusted internal service. Carries no tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub service: String,
    pub subject: String,
}

/// Resolved identity of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(UserIdentity),
    Service(ServiceIdentity),
    /// Allow-listed request; no token was inspected.
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("role {required} is required")]
    MissingRole { required: String },

    #[error("a clinic user identity is required")]
    NotAUser,

    #[error("a service identity is required")]
    NotAService,
}

impl Identity {
    /// Schema that unqualified queries for this identity must hit.
    ///
    /// Only a user identity has a tenant schema; service and anonymous
    /// callers explicitly use the shared schema.
    #[must_use]
    pub fn schema(&self) -> SchemaName {
        match self {
            Self::User(u) => u.schema.clone(),
            Self::Service(_) | Self::Anonymous => SchemaName::public(),
        }
    }

    #[must_use]
    pub fn tenant_id(&self) -> Option<&TenantId> {
        match self {
            Self::User(u) => Some(&u.tenant_id),
            Self::Service(_) | Self::Anonymous => None,
        }
    }

    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::User(u) => Some(&u.subject),
            Self::Service(s) => Some(&s.subject),
            Self::Anonymous => None,
        }
    }

    #[must_use]
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service(_))
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        match self {
            Self::User(UserIdentity { role: Some(r), .. }) => r.matches(role),
            _ => false,
        }
    }

    /// # Errors
    /// [`AuthorizationError::NotAUser`] for service and anonymous identities,
    /// [`AuthorizationError::MissingRole`] when the user lacks `role`.
    pub fn require_role(&self, role: &str) -> Result<&UserIdentity, AuthorizationError> {
        let Self::User(user) = self else {
            return Err(AuthorizationError::NotAUser);
        };
        if self.has_role(role) {
            Ok(user)
        } else {
            Err(AuthorizationError::MissingRole {
                required: role.to_owned(),
            })
        }
    }

    /// # Errors
    /// [`AuthorizationError::NotAUser`] for service and anonymous identities.
    pub fn require_user(&self) -> Result<&UserIdentity, AuthorizationError> {
        match self {
            Self::User(user) => Ok(user),
            Self::Service(_) | Self::Anonymous => Err(AuthorizationError::NotAUser),
        }
    }

    /// # Errors
    /// [`AuthorizationError::NotAService`] unless this is a service identity.
    pub fn require_service(&self) -> Result<&ServiceIdentity, AuthorizationError> {
        match self {
            Self::Service(svc) => Ok(svc),
            Self::User(_) | Self::Anonymous => Err(AuthorizationError::NotAService),
        }
    }
}
