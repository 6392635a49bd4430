use crate::presence::ClientView;
use crate::scan::{NetworkView, ScanOrchestrator};
use crate::traits::UiAssetProvider;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

// The shared state for our web server.
// By using `Arc<dyn Trait>` for the frontend, any asset provider
// can be injected.
pub type WebServerState = State<Arc<AppState>>;

pub struct AppState {
    pub orchestrator: Arc<ScanOrchestrator>,
    pub frontend: Arc<dyn UiAssetProvider>,
}

/// Builds the router: JSON API plus the dashboard as fallback.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/scan", get(api_scan))
        .route("/api/networks", get(api_networks))
        .route("/api/channels", get(api_channels))
        .route("/api/clients", get(api_clients))
        .route("/api/presence/start", post(api_presence_start))
        .route("/api/presence/stop", post(api_presence_stop))
        .route("/api/status", get(api_status))
        .route("/generate_204", get(handle_captive_portal))
        .fallback(get(serve_static_asset))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the Axum web server.
///
/// # Returns
/// A `JoinHandle` for the server task.
pub fn start_web_server(
    addr: SocketAddr,
    orchestrator: Arc<ScanOrchestrator>,
    frontend: Arc<dyn UiAssetProvider>,
) -> JoinHandle<Result<(), crate::Error>> {
    let app = router(Arc::new(AppState {
        orchestrator,
        frontend,
    }));

    tokio::spawn(async move {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("🌐 Web server listening on {}", addr);
        axum::serve(listener, app.into_make_service())
            .await
            .map_err(|e| crate::Error::WebServer(e.into()))
    })
}

// --- Route Handlers ---

/// Runs a fresh scan. The scan is driven from its own task so a client
/// hanging up cannot abort it halfway.
async fn api_scan(State(state): WebServerState) -> impl IntoResponse {
    tracing::debug!("Handling /scan");
    let orchestrator = state.orchestrator.clone();
    let task = tokio::spawn(async move {
        let snapshot = orchestrator.run_scan().await;
        orchestrator.views(&snapshot)
    });
    match task.await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(e) => {
            // Keeps the "empty means nothing to show" contract.
            tracing::error!("Scan task failed: {}", e);
            (StatusCode::OK, Json(Vec::<NetworkView>::new())).into_response()
        }
    }
}

/// Returns the last published scan without touching the radio.
async fn api_networks(State(state): WebServerState) -> impl IntoResponse {
    let snapshot = state.orchestrator.snapshot();
    (StatusCode::OK, Json(state.orchestrator.views(&snapshot))).into_response()
}

async fn api_channels(State(state): WebServerState) -> impl IntoResponse {
    (StatusCode::OK, Json(state.orchestrator.histogram())).into_response()
}

async fn api_clients(State(state): WebServerState) -> impl IntoResponse {
    let clients = match state.orchestrator.presence() {
        Some(tracker) => tracker.list_clients(Instant::now()),
        None => Vec::<ClientView>::new(),
    };
    (StatusCode::OK, Json(clients)).into_response()
}

async fn api_presence_start(State(state): WebServerState) -> impl IntoResponse {
    set_tracking(&state, true)
}

async fn api_presence_stop(State(state): WebServerState) -> impl IntoResponse {
    set_tracking(&state, false)
}

fn set_tracking(state: &AppState, on: bool) -> Response {
    let Some(tracker) = state.orchestrator.presence() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "presence tracking is not enabled" })),
        )
            .into_response();
    };
    let now = Instant::now();
    if on {
        tracker.start(now);
    } else {
        tracker.stop(now);
    }
    tracing::info!(tracking = on, "Presence tracking toggled");
    (StatusCode::OK, Json(json!({ "tracking": tracker.is_tracking() }))).into_response()
}

async fn api_status(State(state): WebServerState) -> impl IntoResponse {
    let orchestrator = &state.orchestrator;
    let presence = orchestrator.presence().map(|tracker| {
        json!({
            "tracking": tracker.is_tracking(),
            "estimatedClients": tracker.estimated_count(Instant::now()),
            "evictionWindowSecs": tracker.eviction_window().as_secs(),
            "countWindowSecs": tracker.count_window().as_secs(),
        })
    });
    (
        StatusCode::OK,
        Json(json!({
            "diagnostics": orchestrator.diagnostics().snapshot(),
            "presence": presence,
            "tierPolicy": orchestrator.tier_policy(),
            "networks": orchestrator.snapshot().len(),
        })),
    )
        .into_response()
}

/// 处理捕获门户检测请求（Captive Portal Detection）
///
/// 手机连上设备热点后会请求 generate_204 以判断是否有互联网连接，
/// 这里静默返回 204，避免不必要的日志警告。
async fn handle_captive_portal() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, "")
}

/// 处理静态资产的 Fallback 处理器
async fn serve_static_asset(State(state): WebServerState, uri: Uri) -> impl IntoResponse {
    let mut path = uri.path().trim_start_matches('/').to_string();

    // 如果路径为空 (即请求根目录 "/"), 则服务 "index.html"
    if path.is_empty() {
        path = "index.html".to_string();
    }

    match state.frontend.get_asset(&path).await {
        Ok((data, mime)) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, mime)
            .body(Body::from(data))
            .unwrap_or_else(|_| {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response").into_response()
            }),
        Err(e) => {
            tracing::warn!("Failed to get asset: {} (Error: {})", path, e);
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}
