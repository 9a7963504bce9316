//! Axum middleware and extractor for the tenant identity filter

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Method, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use clinica_security::{Identity, Role, ServiceIdentity, TenantContext, TenantId, UserIdentity};

use crate::{
    claims::{TokenClaims, VerifiedToken},
    codec::TokenCodec,
    errors::AuthError,
    policy::{Access, RoutePolicy},
};

/// Identity bound to the current request by [`tenant_identity_filter`].
///
/// Reads [`TenantContext`]; there is no second copy in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        TenantContext::get()
            .into_identity()
            .map(CurrentIdentity)
            .ok_or(AuthError::Internal(
                "tenant context not bound - identity filter not configured".to_owned(),
            ))
    }
}

#[derive(Clone)]
pub struct IdentityFilterState {
    codec: Arc<TokenCodec>,
    policy: Arc<dyn RoutePolicy>,
}

impl IdentityFilterState {
    pub fn new(codec: Arc<TokenCodec>, policy: Arc<dyn RoutePolicy>) -> Self {
        Self { codec, policy }
    }

    /// Resolve the identity a request runs as.
    ///
    /// # Errors
    /// Any [`AuthError`] raised by header parsing, token verification or
    /// tenant resolution.
    pub fn authenticate(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Identity, AuthError> {
        match self.policy.resolve(method, path) {
            Access::Public => Ok(Identity::Anonymous),
            Access::Protected => {
                let token = extract_bearer_token(headers)?;
                let verified = self.codec.verify(token)?;
                identity_from_token(verified)
            }
        }
    }
}

/// Map verified claims to an identity. User tokens must name a valid tenant.
///
/// # Errors
/// [`AuthError::MissingTenant`] for a user token without `tenantId`,
/// [`AuthError::TenantResolution`] when the tenant id is unsafe.
pub fn identity_from_token(token: VerifiedToken) -> Result<Identity, AuthError> {
    match token.claims {
        TokenClaims::Service { service } => Ok(Identity::Service(ServiceIdentity {
            service,
            subject: token.subject,
        })),
        TokenClaims::User { tenant_id, role } => {
            let raw = tenant_id
                .filter(|t| !t.is_empty())
                .ok_or(AuthError::MissingTenant)?;
            let tenant = TenantId::parse(&raw)?;
            Ok(Identity::User(UserIdentity::new(
                tenant,
                role.map(Role::new),
                token.subject,
            )))
        }
    }
}

/// Tenant identity filter
///
/// Runs the rest of the stack inside a fresh [`TenantContext`] scope:
/// 1. CORS preflight passes through unauthenticated
/// 2. Allow-listed routes run as [`Identity::Anonymous`]
/// 3. Other routes need a valid bearer token; failures are answered here and
///    never reach a handler or the database
///
/// The binding is cleared when the response is produced, when the handler
/// fails, and when the request future is dropped.
pub async fn tenant_identity_filter(
    State(state): State<IdentityFilterState>,
    request: Request,
    next: Next,
) -> Response {
    TenantContext::scope(async move {
        let _clear = TenantContext::clear_on_drop();

        if is_preflight_request(request.method(), request.headers()) {
            return next.run(request).await;
        }

        let identity =
            match state.authenticate(request.method(), request.uri().path(), request.headers()) {
                Ok(identity) => identity,
                Err(err) => {
                    tracing::warn!(
                        target: "security",
                        method = %request.method(),
                        path = %request.uri().path(),
                        reason = %err,
                        "request rejected by identity filter"
                    );
                    return clinica_errors::Problem::from(err)
                        .with_instance(request.uri().path())
                        .into_response();
                }
            };

        tracing::debug!(
            tenant_id = identity.tenant_id().map(TenantId::as_str),
            schema = %identity.schema(),
            "tenant context bound"
        );
        if let Err(e) = TenantContext::set(identity) {
            return AuthError::Internal(e.to_string()).into_response();
        }

        next.run(request).await
    })
    .await
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::Unauthenticated)?;
    let token = value
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MalformedHeader)?;
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

/// Check if this is a CORS preflight request
///
/// Preflight requests are OPTIONS requests with:
/// - Origin header present
/// - Access-Control-Request-Method header present
fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(axum::http::header::ORIGIN)
        && headers.contains_key(axum::http::header::ACCESS_CONTROL_REQUEST_METHOD)
}
