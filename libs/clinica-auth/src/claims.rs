use std::fmt;

use serde::{Deserialize, Serialize};

/// `type` claim value of service tokens. User tokens omit the claim.
pub const SERVICE_TOKEN_TYPE: &str = "service";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    User,
    Service,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Service => "service",
        })
    }
}

/// Claim set as it travels on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireClaims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "tenantId", default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Kind-specific claims.
///
/// `tenant_id` is deliberately raw: the token only transports it, validation
/// happens when the schema is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenClaims {
    User {
        tenant_id: Option<String>,
        role: Option<String>,
    },
    Service {
        service: String,
    },
}

impl TokenClaims {
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::User { .. } => TokenKind::User,
            Self::Service { .. } => TokenKind::Service,
        }
    }
}

/// Claims of a token whose signature, issuer and lifetime were checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub claims: TokenClaims,
}
