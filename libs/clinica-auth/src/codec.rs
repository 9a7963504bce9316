//! Signing and verification of user and service tokens.
//!
//! Both kinds are HS256 JWTs with their own secret. Lifetime is checked here
//! rather than by `jsonwebtoken` so that expiry is strict (`now >= exp`
//! rejects) while a small leeway still applies to `iat` lying in the future.

use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;

use crate::claims::{SERVICE_TOKEN_TYPE, TokenClaims, TokenKind, VerifiedToken, WireClaims};
use crate::config::AuthConfig;
use crate::errors::{AuthError, TokenRejection};

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

pub struct TokenCodec {
    issuer: String,
    user: Keys,
    service: Keys,
    validation: Validation,
    iat_leeway: i64,
}

impl TokenCodec {
    #[must_use]
    pub fn new(cfg: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.set_issuer(&[cfg.issuer.as_str()]);
        Self {
            issuer: cfg.issuer.clone(),
            user: Keys::from_secret(cfg.user_secret.expose_secret()),
            service: Keys::from_secret(cfg.service_secret.expose_secret()),
            validation,
            iat_leeway: i64::try_from(cfg.iat_leeway_seconds).unwrap_or(i64::MAX),
        }
    }

    fn keys(&self, kind: TokenKind) -> &Keys {
        match kind {
            TokenKind::User => &self.user,
            TokenKind::Service => &self.service,
        }
    }

    /// Sign a token for `subject` valid for `ttl`.
    ///
    /// # Errors
    /// [`AuthError::Issue`] if encoding fails.
    pub fn issue(
        &self,
        subject: &str,
        claims: TokenClaims,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        self.issue_at(subject, claims, ttl, now())
    }

    fn issue_at(
        &self,
        subject: &str,
        claims: TokenClaims,
        ttl: Duration,
        now: i64,
    ) -> Result<String, AuthError> {
        let ttl = i64::try_from(ttl.as_secs()).map_err(|_| AuthError::Issue)?;
        let kind = claims.kind();
        let mut wire = WireClaims {
            sub: subject.to_owned(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
            tenant_id: None,
            role: None,
            service: None,
            token_type: None,
        };
        match claims {
            TokenClaims::User { tenant_id, role } => {
                wire.tenant_id = tenant_id;
                wire.role = role;
            }
            TokenClaims::Service { service } => {
                wire.service = Some(service);
                wire.token_type = Some(SERVICE_TOKEN_TYPE.to_owned());
            }
        }
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &wire,
            &self.keys(kind).encoding,
        )
        .map_err(|e| {
            tracing::error!(error = %e, "token encoding failed");
            AuthError::Issue
        })
    }

    /// Verify a token of either kind.
    ///
    /// # Errors
    /// [`AuthError::InvalidToken`] for a bad signature, structure, issuer or lifetime.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        self.verify_at(token, None, now())
    }

    /// Verify a token that must be a user token.
    ///
    /// # Errors
    /// As [`TokenCodec::verify`], plus [`AuthError::WrongTokenType`] for a
    /// valid service token.
    pub fn verify_user(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        self.verify_at(token, Some(TokenKind::User), now())
    }

    /// Verify a token that must be a service token.
    ///
    /// # Errors
    /// As [`TokenCodec::verify`], plus [`AuthError::WrongTokenType`] for a
    /// valid user token.
    pub fn verify_service(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        self.verify_at(token, Some(TokenKind::Service), now())
    }

    fn verify_at(
        &self,
        token: &str,
        expected: Option<TokenKind>,
        now: i64,
    ) -> Result<VerifiedToken, AuthError> {
        let (kind, wire) = match self.decode(token, TokenKind::User) {
            Err(TokenRejection::Signature) => (
                TokenKind::Service,
                self.decode(token, TokenKind::Service)
                    .map_err(AuthError::InvalidToken)?,
            ),
            other => (TokenKind::User, other.map_err(AuthError::InvalidToken)?),
        };

        if let Some(expected) = expected
            && expected != kind
        {
            return Err(AuthError::WrongTokenType { expected });
        }

        // A `type` claim that disagrees with the signing key is not honoured.
        let declared_service = wire.token_type.as_deref() == Some(SERVICE_TOKEN_TYPE);
        if declared_service != (kind == TokenKind::Service) {
            return Err(AuthError::InvalidToken(TokenRejection::Malformed));
        }

        if now >= wire.exp {
            return Err(AuthError::InvalidToken(TokenRejection::Expired));
        }
        if wire.iat > now.saturating_add(self.iat_leeway) {
            return Err(AuthError::InvalidToken(TokenRejection::IssuedInFuture));
        }

        let claims = match kind {
            TokenKind::User => TokenClaims::User {
                tenant_id: wire.tenant_id,
                role: wire.role,
            },
            TokenKind::Service => TokenClaims::Service {
                service: wire
                    .service
                    .ok_or(AuthError::InvalidToken(TokenRejection::Malformed))?,
            },
        };

        Ok(VerifiedToken {
            subject: wire.sub,
            issued_at: wire.iat,
            expires_at: wire.exp,
            claims,
        })
    }

    fn decode(&self, token: &str, kind: TokenKind) -> Result<WireClaims, TokenRejection> {
        jsonwebtoken::decode::<WireClaims>(token, &self.keys(kind).decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenRejection::Signature,
                ErrorKind::InvalidIssuer => TokenRejection::Issuer,
                _ => TokenRejection::Malformed,
            })
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    const USER_SECRET: &str = "user-secret-user-secret-user-secret!";
    const SERVICE_SECRET: &str = "service-secret-service-secret-service";

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig::with_secrets(USER_SECRET, SERVICE_SECRET))
    }

    fn user_claims(tenant: &str) -> TokenClaims {
        TokenClaims::User {
            tenant_id: Some(tenant.to_owned()),
            role: Some("PROFESIONAL".to_owned()),
        }
    }

    fn service_claims() -> TokenClaims {
        TokenClaims::Service {
            service: "Componente Central".to_owned(),
        }
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn user_token_round_trip() {
        let c = codec();
        let token = c.issue("5001", user_claims("101"), HOUR).unwrap();
        let v = c.verify(&token).unwrap();
        assert_eq!(v.subject, "5001");
        assert_eq!(v.claims, user_claims("101"));
        assert_eq!(v.expires_at - v.issued_at, 3600);
        assert_eq!(c.verify_user(&token).unwrap(), v);
    }

    #[test]
    fn service_token_round_trip() {
        let c = codec();
        let token = c.issue("central", service_claims(), HOUR).unwrap();
        let v = c.verify(&token).unwrap();
        assert_eq!(v.claims, service_claims());
        assert_eq!(c.verify_service(&token).unwrap(), v);
    }

    #[test]
    fn kind_specific_verifiers_reject_the_other_kind() {
        let c = codec();
        let user = c.issue("1", user_claims("1"), HOUR).unwrap();
        let service = c.issue("s", service_claims(), HOUR).unwrap();

        assert!(matches!(
            c.verify_service(&user),
            Err(AuthError::WrongTokenType {
                expected: TokenKind::Service
            })
        ));
        assert!(matches!(
            c.verify_user(&service),
            Err(AuthError::WrongTokenType {
                expected: TokenKind::User
            })
        ));
    }

    #[test]
    fn zero_ttl_is_expired_immediately() {
        let c = codec();
        let token = c.issue("1", user_claims("1"), Duration::ZERO).unwrap();
        assert!(matches!(
            c.verify(&token),
            Err(AuthError::InvalidToken(TokenRejection::Expired))
        ));
    }

    #[test]
    fn expiry_is_strict_at_the_boundary() {
        let c = codec();
        let token = c.issue_at("1", user_claims("1"), HOUR, 1_000).unwrap();
        assert!(c.verify_at(&token, None, 4_599).is_ok());
        assert!(matches!(
            c.verify_at(&token, None, 4_600),
            Err(AuthError::InvalidToken(TokenRejection::Expired))
        ));
    }

    #[test]
    fn leeway_only_covers_future_iat() {
        let c = codec();
        let token = c.issue_at("1", user_claims("1"), HOUR, 1_005).unwrap();
        assert!(c.verify_at(&token, None, 1_000).is_ok());

        let token = c.issue_at("1", user_claims("1"), HOUR, 1_006).unwrap();
        assert!(matches!(
            c.verify_at(&token, None, 1_000),
            Err(AuthError::InvalidToken(TokenRejection::IssuedInFuture))
        ));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = TokenCodec::new(&AuthConfig::with_secrets(
            "another-user-secret-another-user-secret",
            "another-service-secret-another-service",
        ));
        let token = other.issue("1", user_claims("1"), HOUR).unwrap();
        assert!(matches!(
            codec().verify(&token),
            Err(AuthError::InvalidToken(TokenRejection::Signature))
        ));
    }

    #[test]
    fn tampered_and_garbage_tokens_are_rejected() {
        let c = codec();
        let token = c.issue("1", user_claims("1"), HOUR).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = c.issue("1", user_claims("2"), HOUR).unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap();
        parts[1] = forged_payload;
        parts[2] = "AAAA";
        assert!(c.verify(&parts.join(".")).is_err());
        assert!(matches!(
            c.verify("not-a-jwt"),
            Err(AuthError::InvalidToken(TokenRejection::Malformed))
        ));
    }

    #[test]
    fn issuer_must_match() {
        let mut cfg = AuthConfig::with_secrets(USER_SECRET, SERVICE_SECRET);
        cfg.issuer = "someone-else".to_owned();
        let token = TokenCodec::new(&cfg)
            .issue("1", user_claims("1"), HOUR)
            .unwrap();
        assert!(matches!(
            codec().verify(&token),
            Err(AuthError::InvalidToken(TokenRejection::Issuer))
        ));
    }

    #[test]
    fn service_type_claim_on_user_key_is_refused() {
        let c = codec();
        let wire = WireClaims {
            sub: "x".to_owned(),
            iss: "HCEN".to_owned(),
            iat: now(),
            exp: now() + 60,
            tenant_id: None,
            role: None,
            service: Some("spoof".to_owned()),
            token_type: Some(SERVICE_TOKEN_TYPE.to_owned()),
        };
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &wire, &c.user.encoding).unwrap();
        assert!(matches!(
            c.verify(&token),
            Err(AuthError::InvalidToken(TokenRejection::Malformed))
        ));
    }

    #[test]
    fn user_token_may_omit_tenant() {
        let c = codec();
        let token = c
            .issue(
                "1",
                TokenClaims::User {
                    tenant_id: None,
                    role: None,
                },
                HOUR,
            )
            .unwrap();
        let v = c.verify(&token).unwrap();
        assert_eq!(
            v.claims,
            TokenClaims::User {
                tenant_id: None,
                role: None
            }
        );
    }
}
