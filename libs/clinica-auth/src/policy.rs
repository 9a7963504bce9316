//! Which requests may pass without a token.

use http::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Token is not inspected; the request runs as anonymous.
    Public,
    /// A valid bearer token is required.
    Protected,
}

/// Route policy that determines authentication requirements for routes
pub trait RoutePolicy: Send + Sync {
    fn resolve(&self, method: &Method, path: &str) -> Access;
}

/// Allow-list of the clinic backend:
///
/// - `POST /auth/login`
/// - anything under `/config/` (provisioning callbacks from the central platform)
/// - `GET /documentos-pdf/{id}`, a single segment that is not `paciente`
/// - `GET /health`
///
/// Everything else is protected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClinicRoutePolicy;

impl ClinicRoutePolicy {
    fn is_public(method: &Method, path: &str) -> bool {
        if path == "/auth/login" {
            return method == Method::POST;
        }
        if path.starts_with("/config/") {
            return true;
        }
        if let Some(rest) = path.strip_prefix("/documentos-pdf/") {
            return method == Method::GET
                && !rest.is_empty()
                && !rest.contains('/')
                && rest != "paciente";
        }
        path == "/health" && method == Method::GET
    }
}

impl RoutePolicy for ClinicRoutePolicy {
    fn resolve(&self, method: &Method, path: &str) -> Access {
        if Self::is_public(method, path) {
            Access::Public
        } else {
            Access::Protected
        }
    }
}
