#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
    routing::{get, post},
};
use clinica_auth::{
    AuthConfig, ClinicRoutePolicy, CurrentIdentity, IdentityFilterState, TokenClaims, TokenCodec,
    tenant_identity_filter,
};
use clinica_security::{Binding, Identity, TenantContext};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // for `oneshot`

const USER_SECRET: &str = "user-secret-user-secret-user-secret!";
const SERVICE_SECRET: &str = "service-secret-service-secret-service";
const HOUR: Duration = Duration::from_secs(3600);

fn codec() -> Arc<TokenCodec> {
    Arc::new(TokenCodec::new(&AuthConfig::with_secrets(
        USER_SECRET,
        SERVICE_SECRET,
    )))
}

fn describe(identity: &Identity) -> Value {
    match identity {
        Identity::User(u) => json!({
            "kind": "user",
            "tenant": u.tenant_id.as_str(),
            "schema": u.schema.as_str(),
        }),
        Identity::Service(s) => json!({
            "kind": "service",
            "service": s.service,
            "schema": identity.schema().as_str(),
        }),
        Identity::Anonymous => json!({
            "kind": "anonymous",
            "schema": identity.schema().as_str(),
        }),
    }
}

async fn whoami(CurrentIdentity(identity): CurrentIdentity) -> Json<Value> {
    Json(describe(&identity))
}

/// Reports the ambient binding without going through the extractor.
async fn ambient() -> Json<Value> {
    match TenantContext::get() {
        Binding::Bound(identity) => Json(describe(&identity)),
        Binding::Unset => Json(json!({ "kind": "unset" })),
    }
}

struct App {
    router: Router,
    handler_calls: Arc<AtomicUsize>,
}

fn app(codec: Arc<TokenCodec>) -> App {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = {
        let calls = Arc::clone(&calls);
        move |CurrentIdentity(identity): CurrentIdentity| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Json(describe(&identity))
            }
        }
    };
    let failing = || async { (StatusCode::INTERNAL_SERVER_ERROR, "downstream failure") };

    let state = IdentityFilterState::new(codec, Arc::new(ClinicRoutePolicy));
    let router = Router::new()
        .route("/profesionales", get(counted))
        .route("/tenants", get(whoami))
        .route("/fails", get(failing))
        .route("/config/health", get(ambient))
        .route("/config/init", post(whoami))
        .route("/documentos-pdf/{id}", get(ambient))
        .route("/slow", get(|| std::future::pending::<&'static str>()))
        .layer(middleware::from_fn_with_state(state, tenant_identity_filter));
    App {
        router,
        handler_calls: calls,
    }
}

fn get_req(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::empty()).unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn user_token(codec: &TokenCodec, tenant: Option<&str>) -> String {
    codec
        .issue(
            "5001",
            TokenClaims::User {
                tenant_id: tenant.map(str::to_owned),
                role: Some("PROFESIONAL".to_owned()),
            },
            HOUR,
        )
        .unwrap()
}

#[tokio::test]
async fn missing_token_is_rejected_before_handler() {
    let app = app(codec());
    let resp = app
        .router
        .clone()
        .oneshot(get_req("/profesionales", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let body = json_body(resp).await;
    assert_eq!(body["code"], "UNAUTHENTICATED");
    assert_eq!(body["instance"], "/profesionales");
    assert_eq!(app.handler_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_and_invalid_tokens_are_rejected() {
    let app = app(codec());

    let resp = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/profesionales")
                .header(header::AUTHORIZATION, "Token abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .router
        .clone()
        .oneshot(get_req("/profesionales", Some("not.a.jwt")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let other = TokenCodec::new(&AuthConfig::with_secrets(
        "another-user-secret-another-user-secret",
        "another-service-secret-another-service",
    ));
    let resp = app
        .router
        .clone()
        .oneshot(get_req("/profesionales", Some(&user_token(&other, Some("1")))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.handler_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let codec = codec();
    let token = codec
        .issue(
            "5001",
            TokenClaims::User {
                tenant_id: Some("1".to_owned()),
                role: None,
            },
            Duration::ZERO,
        )
        .unwrap();
    let resp = app(Arc::clone(&codec))
        .router
        .oneshot(get_req("/profesionales", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn user_token_binds_tenant_schema() {
    let codec = codec();
    let app = app(Arc::clone(&codec));
    let resp = app
        .router
        .oneshot(get_req(
            "/profesionales",
            Some(&user_token(&codec, Some("101"))),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["kind"], "user");
    assert_eq!(body["schema"], "schema_clinica_101");
    assert_eq!(app.handler_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn user_token_without_tenant_is_unauthorized() {
    let codec = codec();
    let resp = app(Arc::clone(&codec))
        .router
        .oneshot(get_req("/profesionales", Some(&user_token(&codec, None))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["code"], "MISSING_TENANT");
}

#[tokio::test]
async fn unsafe_tenant_is_a_resolution_error_not_a_fallback() {
    let codec = codec();
    let resp = app(Arc::clone(&codec))
        .router
        .oneshot(get_req(
            "/profesionales",
            Some(&user_token(&codec, Some("1\"; DROP SCHEMA public; --"))),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["code"], "TENANT_RESOLUTION");
}

/// A service token on a registry endpoint runs with no tenant schema.
#[tokio::test]
async fn service_token_binds_service_identity() {
    let codec = codec();
    let token = codec
        .issue(
            "central",
            TokenClaims::Service {
                service: "Componente Central".to_owned(),
            },
            HOUR,
        )
        .unwrap();
    let resp = app(Arc::clone(&codec))
        .router
        .oneshot(get_req("/tenants", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["kind"], "service");
    assert_eq!(body["schema"], "public");
}

#[tokio::test]
async fn allow_listed_routes_run_anonymous_without_token() {
    let app = app(codec());

    let resp = app
        .router
        .clone()
        .oneshot(get_req("/config/health", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["kind"], "anonymous");

    let resp = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/config/init")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .router
        .clone()
        .oneshot(get_req("/documentos-pdf/abc", None))
        .await
        .unwrap();
    assert_eq!(json_body(resp).await["schema"], "public");

    let resp = app
        .router
        .oneshot(get_req("/documentos-pdf/paciente", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

/// A tenant request followed by an allow-listed request on the same worker:
/// the second request must not see the first one's tenant.
#[tokio::test(flavor = "current_thread")]
async fn binding_does_not_leak_to_next_request_on_same_worker() {
    let codec = codec();
    let app = app(Arc::clone(&codec));
    let token = user_token(&codec, Some("1"));

    let r1 = app
        .router
        .clone()
        .oneshot(get_req("/profesionales", Some(&token)))
        .await
        .unwrap();
    assert_eq!(json_body(r1).await["tenant"], "1");
    assert_eq!(TenantContext::get(), Binding::Unset);

    let r2 = app
        .router
        .clone()
        .oneshot(get_req("/config/health", None))
        .await
        .unwrap();
    let body = json_body(r2).await;
    assert_eq!(body["kind"], "anonymous");
    assert!(body.get("tenant").is_none());

    // A failing handler must not leave its binding behind either.
    let r3 = app
        .router
        .clone()
        .oneshot(get_req("/fails", Some(&token)))
        .await
        .unwrap();
    assert_eq!(r3.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(TenantContext::get(), Binding::Unset);

    let r4 = app
        .router
        .oneshot(get_req("/config/health", None))
        .await
        .unwrap();
    assert_eq!(json_body(r4).await["kind"], "anonymous");
}

#[tokio::test(flavor = "current_thread")]
async fn cancelled_request_releases_binding() {
    let codec = codec();
    let app = app(Arc::clone(&codec));
    let token = user_token(&codec, Some("7"));

    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        app.router.clone().oneshot(get_req("/slow", Some(&token))),
    )
    .await;
    assert!(cancelled.is_err());
    assert_eq!(TenantContext::get(), Binding::Unset);

    let next = app
        .router
        .oneshot(get_req("/config/health", None))
        .await
        .unwrap();
    assert_eq!(json_body(next).await["kind"], "anonymous");
}

#[tokio::test]
async fn preflight_skips_authentication() {
    let resp = app(codec())
        .router
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/profesionales")
                .header(header::ORIGIN, "https://portal.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // No CORS layer in this router, so the route answers 405 rather than 401.
    assert_ne!(resp.status(), StatusCode::UNAUTHORIZED);
}
