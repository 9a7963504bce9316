use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router};

use crate::api::rest::handlers;
use crate::domain::repo::{AccountRepo, StaffRepo};
use crate::domain::service::{LoginService, StaffDirectory};

/// Services the portal routes dispatch to.
pub struct PortalServices<A: AccountRepo, S: StaffRepo> {
    pub login: Arc<LoginService<A>>,
    pub staff: Arc<StaffDirectory<S>>,
}

/// `POST /auth/login` and `GET /profesionales`.
pub fn register_routes<A, S>(router: Router, services: PortalServices<A, S>) -> Router
where
    A: AccountRepo + 'static,
    S: StaffRepo + 'static,
{
    router
        .route("/auth/login", post(handlers::login::<A>))
        .route("/profesionales", get(handlers::list_professionals::<S>))
        .layer(Extension(services.login))
        .layer(Extension(services.staff))
}
