//! Web layer for the risk register
//!
//! HTML pages, the JSON API and the HTTP server.
//!
//! # Module Structure
//! - `api`: JSON API handlers
//! - `error`: Error type for page handlers
//! - `handlers`: HTML page handlers
//! - `pages`: Layout and form widgets
//! - `state`: Application state and runtime info
//! - `types`: API request and response types
//! - `views`: Page bodies

mod api;
mod error;
mod handlers;
pub(crate) mod pages;
mod state;
mod types;
pub(crate) mod views;

pub use error::AppError;
pub use state::{AppState, RuntimeInfo, Settings};
pub use types::{ErrorResponse, ListResponse, RiskQuery, StatusResponse, VersionResponse};

use anyhow::Result;
use axum::{
    Router,
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::get,
};
use rust_embed::Embed;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;

use crate::auth::{self, LOGIN_PATH, LOGOUT_PATH, require_auth};
use crate::config::Config;
use crate::domain::RiskStatus;
use crate::health::HealthServer;
use crate::storage::{
    AssessmentSummary, Asset, AssetOverview, Database, ImpactCount, Risk, Stats, StatusCount,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Risk Register API",
        description = "Read-only API over assets, risks and risk assessments",
        version = env!("CARGO_PKG_VERSION"),
        license(name = "MIT")
    ),
    paths(
        api::list_risks,
        api::list_assets,
        api::get_assessment_summary,
        api::get_stats,
        api::get_version,
        api::get_status,
    ),
    components(schemas(
        ErrorResponse,
        VersionResponse,
        StatusResponse,
        Risk,
        RiskStatus,
        Asset,
        AssetOverview,
        AssessmentSummary,
        StatusCount,
        ImpactCount,
        Stats,
    )),
    tags(
        (name = "Risks", description = "Risk listing endpoints"),
        (name = "Assets", description = "Asset listing endpoints"),
        (name = "Assessments", description = "Risk assessment endpoints"),
        (name = "Statistics", description = "Statistics endpoints"),
        (name = "Version", description = "Build version information endpoints"),
        (name = "Status", description = "Server runtime status endpoints"),
    )
)]
pub struct ApiDoc;

#[derive(Embed)]
#[folder = "static/"]
struct StaticAssets;

/// Build the application router.
///
/// Login, logout, static files and the OpenAPI document are public;
/// every other route requires a session.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        // Pages
        .route("/", get(handlers::dashboard))
        .route(
            "/planning/",
            get(handlers::planning_page).post(handlers::create_assessment),
        )
        .route("/assets/", get(handlers::list_assets))
        .route(
            "/assets/new/",
            get(handlers::asset_page).post(handlers::create_asset),
        )
        .route(
            "/vulnerabilities/",
            get(handlers::vulnerability_page).post(handlers::create_vulnerability),
        )
        .route(
            "/threats/",
            get(handlers::threat_page).post(handlers::create_threat),
        )
        .route(
            "/risks/calculate/",
            get(handlers::risk_page).post(handlers::create_risk),
        )
        .route("/risks/prioritize/", get(handlers::prioritize))
        .route("/risks/monitor/", get(handlers::monitor))
        .route(
            "/risks/{id}/response/",
            get(handlers::response_page).post(handlers::update_response),
        )
        .route(
            "/risks/impact/{id}/",
            get(handlers::impact_page).post(handlers::update_impact),
        )
        .route("/assessment/{id}/", get(handlers::assessment_detail))
        // API routes
        .route("/api/v1/risks", get(api::list_risks))
        .route("/api/v1/assets", get(api::list_assets))
        .route(
            "/api/v1/assessments/{id}/summary",
            get(api::get_assessment_summary),
        )
        .route("/api/v1/stats", get(api::get_stats))
        .route("/api/v1/version", get(api::get_version))
        .route("/api/v1/status", get(api::get_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(protected)
        .route(
            LOGIN_PATH,
            get(auth::handlers::login_page).post(auth::handlers::login),
        )
        .route(
            LOGOUT_PATH,
            get(auth::handlers::logout).post(auth::handlers::logout),
        )
        // OpenAPI documentation
        .route("/api-docs/openapi.json", get(serve_openapi))
        .route("/static/{*path}", get(serve_static))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(
    config: Config,
    health_server: HealthServer,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> Result<()> {
    info!(
        port = config.server_port,
        storage_path = %config.storage_path,
        session_ttl_hours = config.session_ttl_hours,
        high_risk_threshold = config.high_risk_threshold,
        "Starting web server"
    );

    let db = Arc::new(Database::new(&config.get_db_path())?);
    let cookie_key = auth::cookie_key(config.session_secret.as_deref());
    let state = AppState::new(db, cookie_key, Settings::from(&config));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(addr = %addr, "Server listening");

    // Mark as ready
    health_server.set_ready(true);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
            info!("Server shutting down");
        })
        .await?;

    health_server.set_ready(false);
    Ok(())
}

async fn serve_static(axum::extract::Path(path): axum::extract::Path<String>) -> impl IntoResponse {
    let path = path.trim_start_matches('/');
    match StaticAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data.to_vec(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

async fn serve_openapi() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        ApiDoc::openapi().to_json().unwrap_or_default(),
    )
}

async fn not_found() -> AppError {
    AppError::NotFound("Page")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, Response};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::auth::password::hash_password;
    use crate::storage::RiskResponseUpdate;
    use crate::storage::testing::{new_risk, seed_graph};

    const USERNAME: &str = "alice";
    const PASSWORD: &str = "correct horse battery staple";

    fn test_app() -> (Router, Arc<Database>) {
        let db = Arc::new(Database::new(":memory:").expect("Failed to create database"));
        let hash = hash_password(PASSWORD).expect("hash");
        db.create_user(USERNAME, &hash).expect("user");
        let state = AppState::new(
            db.clone(),
            auth::cookie_key(Some("0123456789abcdef0123456789abcdef")),
            Settings::default(),
        );
        (router(state), db)
    }

    async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
        app.clone().oneshot(request).await.expect("request")
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    fn location(response: &Response<Body>) -> &str {
        response.headers()[header::LOCATION]
            .to_str()
            .expect("location header")
    }

    fn get(uri: &str, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = session {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).expect("request")
    }

    fn post_form(uri: &str, session: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = session {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    /// Log in and return the `name=value` pair of the session cookie
    async fn login(app: &Router) -> String {
        let body = format!("username={}&password={}", USERNAME, urlencoding::encode(PASSWORD));
        let response = send(app, post_form(LOGIN_PATH, None, &body)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        let set_cookie = response.headers()[header::SET_COOKIE]
            .to_str()
            .expect("set-cookie header");
        set_cookie
            .split(';')
            .next()
            .expect("cookie pair")
            .to_string()
    }

    #[tokio::test]
    async fn test_page_requires_login() {
        let (app, _) = test_app();
        let response = send(&app, get("/risks/prioritize/", None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&response),
            "/accounts/login/?next=%2Frisks%2Fprioritize%2F"
        );
    }

    #[tokio::test]
    async fn test_api_requires_login() {
        let (app, _) = test_app();
        let response = send(&app, get("/api/v1/risks", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Authentication required"));
    }

    #[tokio::test]
    async fn test_public_routes() {
        let (app, _) = test_app();

        let response = send(&app, get(LOGIN_PATH, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(r#"name="password""#));

        let response = send(&app, get("/static/style.css", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");

        let response = send(&app, get("/api-docs/openapi.json", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("/api/v1/risks"));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (app, _) = test_app();
        let body = format!("username={}&password=wrong", USERNAME);
        let response = send(&app, post_form(LOGIN_PATH, None, &body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(
            body_text(response)
                .await
                .contains("Please enter a correct username and password.")
        );
    }

    #[tokio::test]
    async fn test_login_redirects_to_next() {
        let (app, _) = test_app();
        let body = format!(
            "username={}&password={}&next=%2Fassets%2F",
            USERNAME,
            urlencoding::encode(PASSWORD)
        );
        let response = send(&app, post_form(LOGIN_PATH, None, &body)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/assets/");

        let body = format!(
            "username={}&password={}&next=https%3A%2F%2Fevil.example.com%2F",
            USERNAME,
            urlencoding::encode(PASSWORD)
        );
        let response = send(&app, post_form(LOGIN_PATH, None, &body)).await;
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_dashboard_after_login() {
        let (app, _) = test_app();
        let session = login(&app).await;

        let response = send(&app, get("/", Some(&session))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("Dashboard"));
        assert!(page.contains(USERNAME));
    }

    #[tokio::test]
    async fn test_tampered_cookie_rejected() {
        let (app, _) = test_app();
        let response = send(&app, get("/", Some("risk_session=forged"))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_create_risk_computes_score() {
        let (app, db) = test_app();
        let session = login(&app).await;
        let g = seed_graph(&db);

        let body = format!(
            "name=Data+breach&description=SQL+injection&asset={}&vulnerability={}&threat={}&likelihood=5&impact=8&status=identified&mitigation_plan=",
            g.asset_id, g.vulnerability_id, g.threat_id
        );
        let response = send(&app, post_form("/risks/calculate/", Some(&session), &body)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        let risks = db.list_risks_by_score(None).expect("risks");
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].risk_score, Some(20.0));
    }

    #[tokio::test]
    async fn test_invalid_form_rerenders() {
        let (app, _) = test_app();
        let session = login(&app).await;

        let body = "name=Laptop&description=Dev+laptop&value=-5&category=Hardware";
        let response = send(&app, post_form("/assets/new/", Some(&session), body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("Asset value cannot be negative."));
        assert!(page.contains(r#"value="Laptop""#));
    }

    #[tokio::test]
    async fn test_mitigated_response_needs_plan() {
        let (app, db) = test_app();
        let session = login(&app).await;
        let g = seed_graph(&db);
        let risk = db.create_risk(&new_risk(&g, "r", 4, 4)).expect("risk");
        let uri = format!("/risks/{}/response/", risk.id);

        let response = send(
            &app,
            post_form(&uri, Some(&session), "status=mitigated&mitigation_plan="),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            body_text(response)
                .await
                .contains("A mitigation plan is required")
        );

        let response = send(
            &app,
            post_form(
                &uri,
                Some(&session),
                "status=mitigated&mitigation_plan=Patch+TLS&response_type=mitigate&response_details=Upgrade",
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        let updated = db.get_risk(risk.id).expect("get").expect("risk");
        assert_eq!(updated.status, RiskStatus::Mitigated);
        assert!(db.get_risk_response(risk.id).expect("get").is_some());
    }

    #[tokio::test]
    async fn test_impact_update_redirects_to_same_page() {
        let (app, db) = test_app();
        let session = login(&app).await;
        let g = seed_graph(&db);
        let risk = db.create_risk(&new_risk(&g, "r", 5, 2)).expect("risk");
        let uri = format!("/risks/impact/{}/", risk.id);

        let response = send(&app, post_form(&uri, Some(&session), "impact=8")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), uri);

        let updated = db.get_risk(risk.id).expect("get").expect("risk");
        assert_eq!(updated.risk_score, Some(20.0));
    }

    #[tokio::test]
    async fn test_unknown_records_are_404() {
        let (app, _) = test_app();
        let session = login(&app).await;

        for uri in [
            "/risks/999/response/",
            "/risks/abc/response/",
            "/risks/impact/999/",
            "/assessment/999/",
            "/no-such-page/",
        ] {
            let response = send(&app, get(uri, Some(&session))).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        }

        for uri in [
            "/api/v1/assessments/999/summary",
            "/api/v1/assessments/abc/summary",
        ] {
            let response = send(&app, get(uri, Some(&session))).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
            let json: serde_json::Value =
                serde_json::from_str(&body_text(response).await).expect("json");
            assert_eq!(json["error"], "Assessment not found");
        }
    }

    #[tokio::test]
    async fn test_planning_creates_assessment() {
        let (app, db) = test_app();
        let session = login(&app).await;
        let g = seed_graph(&db);
        let risk = db.create_risk(&new_risk(&g, "r", 3, 3)).expect("risk");

        let body = format!(
            "title=Q2+review&description=Quarterly&start_date=2024-04-01&end_date=2024-06-30&status=planned&assessor=&risks={}",
            risk.id
        );
        let response = send(&app, post_form("/planning/", Some(&session), &body)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let assessments = db.list_assessments(None).expect("assessments");
        assert_eq!(assessments.len(), 1);
        assert_eq!(assessments[0].risk_count, 1);

        let uri = format!("/assessment/{}/", assessments[0].id);
        let response = send(&app, get(&uri, Some(&session))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Q2 review"));

        let body = "title=Bad&description=x&start_date=2024-05-01&end_date=2024-04-01&status=planned";
        let response = send(&app, post_form("/planning/", Some(&session), body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            body_text(response)
                .await
                .contains("End date must be after start date.")
        );
    }

    #[tokio::test]
    async fn test_api_lists_risks() {
        let (app, db) = test_app();
        let session = login(&app).await;
        let g = seed_graph(&db);
        db.create_risk(&new_risk(&g, "low", 2, 2)).expect("risk");
        db.create_risk(&new_risk(&g, "high", 9, 9)).expect("risk");

        let response = send(&app, get("/api/v1/risks", Some(&session))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value =
            serde_json::from_str(&body_text(response).await).expect("json");
        assert_eq!(json["total"], 2);
        assert_eq!(json["items"][0]["name"], "high");

        let response = send(&app, get("/api/v1/risks?status=mitigated", Some(&session))).await;
        let json: serde_json::Value =
            serde_json::from_str(&body_text(response).await).expect("json");
        assert_eq!(json["total"], 0);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let (app, _) = test_app();
        let session = login(&app).await;

        let response = send(&app, post_form(LOGOUT_PATH, Some(&session), "")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), LOGIN_PATH);
        let cleared = response.headers()[header::SET_COOKIE]
            .to_str()
            .expect("set-cookie header");
        assert!(cleared.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let (app, _) = test_app();
        let body = format!("username=mallory&password={}", urlencoding::encode(PASSWORD));
        let response = send(&app, post_form(LOGIN_PATH, None, &body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(
            body_text(response)
                .await
                .contains("Please enter a correct username and password.")
        );
    }

    #[tokio::test]
    async fn test_monitor_splits_mitigated() {
        let (app, db) = test_app();
        let session = login(&app).await;
        let g = seed_graph(&db);
        db.create_risk(&new_risk(&g, "Open phishing risk", 4, 4))
            .expect("risk");
        let closed = db
            .create_risk(&new_risk(&g, "Closed TLS risk", 6, 6))
            .expect("risk");
        let update = RiskResponseUpdate {
            status: RiskStatus::Mitigated,
            mitigation_plan: Some("Disable TLS 1.0".to_string()),
            response: None,
        };
        assert!(db.update_risk_response(closed.id, &update).expect("update"));

        let response = send(&app, get("/risks/monitor/", Some(&session))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        let position = |text: &str| page.find(text).expect(text);

        assert!(position("<h2>Pending</h2>") < position("Open phishing risk"));
        assert!(position("Open phishing risk") < position("<h2>Mitigated</h2>"));
        assert!(position("<h2>Mitigated</h2>") < position("Closed TLS risk"));
        assert!(page.contains("2 risks: 1 mitigated, 1 pending"));
    }

    #[tokio::test]
    async fn test_asset_list_shows_vulnerability_count() {
        let (app, db) = test_app();
        let session = login(&app).await;
        seed_graph(&db);

        let response = send(&app, get("/assets/", Some(&session))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("<td>Web server</td>"));
        assert!(page.contains(r#"<td class="num">1</td>"#));
    }

    #[tokio::test]
    async fn test_create_vulnerability() {
        let (app, db) = test_app();
        let session = login(&app).await;
        let g = seed_graph(&db);

        let body = format!(
            "name=SQL+injection&description=Unsanitised+input&asset={}&severity=11",
            g.asset_id
        );
        let response = send(&app, post_form("/vulnerabilities/", Some(&session), &body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            body_text(response)
                .await
                .contains("Severity must be between 1 and 10.")
        );

        let body = format!(
            "name=SQL+injection&description=Unsanitised+input&asset={}&severity=8",
            g.asset_id
        );
        let response = send(&app, post_form("/vulnerabilities/", Some(&session), &body)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/assets/");
        assert_eq!(db.list_vulnerabilities().expect("vulnerabilities").len(), 2);
    }

    #[tokio::test]
    async fn test_create_threat() {
        let (app, db) = test_app();
        let session = login(&app).await;

        let body = "name=Flood&description=River+flooding&threat_type=natural&likelihood=3";
        let response = send(&app, post_form("/threats/", Some(&session), body)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        let threats = db.list_threats().expect("threats");
        assert_eq!(threats.len(), 1);
        assert_eq!(threats[0].name, "Flood");
    }

    #[tokio::test]
    async fn test_repeated_field_keeps_last_value() {
        let (app, db) = test_app();
        let session = login(&app).await;

        let body = "name=Laptop&name=Workstation&description=Dev+machine&value=1200.50&category=Hardware";
        let response = send(&app, post_form("/assets/new/", Some(&session), body)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/assets/");

        let assets = db.list_assets().expect("assets");
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].asset.name, "Workstation");
    }
}
