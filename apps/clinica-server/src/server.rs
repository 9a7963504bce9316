//! Router assembly and the serve loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Method, Request, Response, StatusCode, header};
use axum::routing::get;
use axum::{Json, Router, middleware};
use clinic_portal::{
    AccountRepo, BcryptVerifier, LoginService, PgAccountRepo, PgStaffRepo, PortalServices,
    StaffDirectory, StaffRepo,
};
use clinica_auth::{ClinicRoutePolicy, IdentityFilterState, TokenCodec, tenant_identity_filter};
use clinica_db::{ConnectionRouter, PgSource, connect_pool};
use serde_json::{Value, json};
use tenant_provisioning::{PgProvisioningRepo, ProvisioningRepo, ProvisioningService};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

use crate::config::{AppConfig, CorsConfig};
use crate::shutdown::shutdown_signal;

const REQUEST_ID: &str = "x-request-id";

/// Everything the routes dispatch to.
pub struct AppServices<P: ProvisioningRepo, A: AccountRepo, S: StaffRepo> {
    pub provisioning: Arc<ProvisioningService<P>>,
    pub portal: PortalServices<A, S>,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

/// CORS from `cors.allowed_origins`. An empty list answers no cross-origin request.
#[must_use]
pub fn build_cors_layer(cfg: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(REQUEST_ID)])
        .max_age(Duration::from_secs(3600));

    if cfg.allowed_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS allows any origin");
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = cfg
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| tracing::warn!(%origin, "ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    layer.allow_origin(origins)
}

/// Full application router.
///
/// Layers, outermost first: CORS, request id, trace span, timeout, tenant
/// identity filter. Preflight is answered by CORS before authentication, and
/// a timed out request drops its tenant binding with the inner future.
pub fn build_router<P, A, S>(
    services: AppServices<P, A, S>,
    codec: Arc<TokenCodec>,
    cfg: &AppConfig,
) -> Router
where
    P: ProvisioningRepo + 'static,
    A: AccountRepo + 'static,
    S: StaffRepo + 'static,
{
    let routes = Router::new()
        .route("/health", get(health))
        .merge(tenant_provisioning::register_routes(
            Router::new(),
            services.provisioning,
        ))
        .merge(clinic_portal::register_routes(Router::new(), services.portal));

    let filter = IdentityFilterState::new(codec, Arc::new(ClinicRoutePolicy));
    let request_id = HeaderName::from_static(REQUEST_ID);

    routes
        .layer(middleware::from_fn_with_state(filter, tenant_identity_filter))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            cfg.server.request_timeout,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    let rid = req
                        .headers()
                        .get(REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("n/a");
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri().path(),
                        request_id = %rid,
                        status = Empty,
                        latency_ms = Empty,
                    )
                })
                .on_response(
                    |res: &Response<Body>, latency: Duration, span: &tracing::Span| {
                        span.record("status", res.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                    },
                ),
        )
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(build_cors_layer(&cfg.cors))
}

/// Connect, bootstrap the shared schema, then serve until a shutdown signal.
///
/// # Errors
/// Invalid configuration, an unreachable database, a failed bootstrap or a
/// port that cannot be bound.
pub async fn run(config: &AppConfig) -> Result<()> {
    config.validate()?;

    let pool = connect_pool(&config.database)
        .await
        .context("database unavailable")?;
    let db = ConnectionRouter::new(PgSource::new(pool));
    let codec = Arc::new(TokenCodec::new(&config.auth));

    let provisioning = Arc::new(ProvisioningService::new(
        Arc::new(PgProvisioningRepo::new(db.clone())),
        config.provisioning.clone(),
    ));
    provisioning
        .bootstrap()
        .await
        .context("shared schema bootstrap failed")?;

    let portal = PortalServices {
        login: Arc::new(LoginService::new(
            Arc::new(PgAccountRepo::new(db.clone())),
            Arc::new(BcryptVerifier),
            Arc::clone(&codec),
            config.auth.user_token_ttl,
        )),
        staff: Arc::new(StaffDirectory::new(Arc::new(PgStaffRepo::new(db.clone())))),
    };

    let app = build_router(
        AppServices {
            provisioning,
            portal,
        },
        codec,
        config,
    );

    let addr = config.server.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    db.source().close().await;
    tracing::info!("server stopped");
    Ok(())
}
