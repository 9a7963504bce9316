use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router};

use crate::api::rest::handlers;
use crate::domain::repo::ProvisioningRepo;
use crate::domain::service::ProvisioningService;
use crate::infra::storage::pg_repo::PgProvisioningRepo;

/// Type alias for the concrete service type.
pub type ConcreteService = ProvisioningService<PgProvisioningRepo>;

/// Provisioning callbacks under `/config` plus the service-only `/tenants` listing.
pub fn register_routes<R: ProvisioningRepo + 'static>(
    router: Router,
    service: Arc<ProvisioningService<R>>,
) -> Router {
    router
        .route("/config/init", post(handlers::init_tenant::<R>))
        .route("/config/update", post(handlers::update_tenant::<R>))
        .route("/config/health", get(handlers::config_health))
        .route("/tenants", get(handlers::list_tenants::<R>))
        .layer(Extension(service))
}
