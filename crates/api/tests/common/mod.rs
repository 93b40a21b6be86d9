#![allow(dead_code)]

//! Shared test harness: stub queue server, app construction mirroring
//! `main.rs`, and request helpers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use mvforge_api::config::ServerConfig;
use mvforge_api::routes;
use mvforge_api::state::AppState;
use mvforge_comfy::ComfyClient;
use mvforge_pipeline::{Pipeline, TemplateRegistry};

/// Directory holding the shipped workflow templates.
pub fn template_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates")
}

/// Build a test `ServerConfig` pointing at a stub queue and temp dirs.
pub fn test_config(comfy_url: &str, output_dir: &Path, upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        comfy_url: comfy_url.to_string(),
        public_base_url: "http://localhost:8000".to_string(),
        output_dir: output_dir.to_path_buf(),
        upload_dir: upload_dir.to_path_buf(),
        template_dir: template_dir(),
        poll_interval_secs: 1,
        poll_timeout_secs: 10,
        poll_max_failures: 3,
    }
}

/// Build the full application router with all middleware layers.
///
/// This mirrors the router construction in `main.rs` so integration
/// tests exercise the same middleware stack (CORS, request ID, timeout,
/// tracing, panic recovery) that production uses.
pub fn build_test_app(config: ServerConfig) -> Router {
    std::fs::create_dir_all(config.model_dir()).unwrap();
    std::fs::create_dir_all(&config.upload_dir).unwrap();

    let registry = TemplateRegistry::load(&config.template_dir).unwrap();
    let pipeline = Arc::new(Pipeline::new(
        ComfyClient::new(config.comfy_url.clone()),
        registry,
        config.poll_config(),
        format!("{}/images", config.public_base_url),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        pipeline,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .nest_service("/images", ServeDir::new(&config.output_dir))
        .nest_service("/files", ServeDir::new(config.model_dir()))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Serve a stub router on an ephemeral port, returning its base URL.
pub async fn serve_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Stub queue that accepts any workflow and immediately reports the
/// given history entry for the assigned job id.
pub fn stub_queue(prompt_id: &'static str, entry: serde_json::Value) -> Router {
    Router::new()
        .route(
            "/prompt",
            post(move || async move { Json(serde_json::json!({"prompt_id": prompt_id})) }),
        )
        .route(
            "/history/{id}",
            get(move |axum::extract::Path(id): axum::extract::Path<String>| {
                let entry = entry.clone();
                async move { Json(serde_json::json!({ id: entry })) }
            }),
        )
}

// ---- request helpers ----

pub async fn get_uri(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Build a multipart request with one part per `(field, filename, bytes)`.
pub fn multipart_request(uri: &str, parts: &[(&str, &str, &[u8])]) -> Request<Body> {
    const BOUNDARY: &str = "mvforge-test-boundary";

    let mut body: Vec<u8> = Vec::new();
    for (field, filename, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
