use crate::core::intake::IntakeEndpoint;
use crate::core::monitor::pending_report;
use crate::domain::model::PendingReport;
use crate::utils::error::{FaucetError, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Clone)]
struct AppState {
    intake: Arc<IntakeEndpoint>,
}

#[derive(Debug, Deserialize)]
struct DripBody {
    // 缺少欄位時當作空字串，交給地址驗證回 400
    #[serde(default)]
    address: String,
}

fn invalid_address() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid wallet address" })),
    )
}

async fn drip_token(
    State(state): State<AppState>,
    body: std::result::Result<Json<DripBody>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    // body 解析失敗也回無效地址
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!("Rejected drip body: {}", rejection);
            return invalid_address();
        }
    };

    match state.intake.submit(&body.address) {
        Ok(receipt) => (
            StatusCode::OK,
            Json(json!({
                "message": "Request added to the queue",
                "requestId": receipt.request_id,
            })),
        ),
        Err(_) => invalid_address(),
    }
}

async fn queue_status(State(state): State<AppState>) -> Json<PendingReport> {
    Json(pending_report(state.intake.queue()))
}

async fn health() -> &'static str {
    "ok"
}

/// CORS for the faucet front end. `"*"` allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(AllowOrigin::any()));
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| FaucetError::InvalidConfigValueError {
                field: "server.allowed_origins".to_string(),
                value: origin.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

pub fn router(intake: Arc<IntakeEndpoint>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/drip-token", post(drip_token))
        .route("/queue", get(queue_status))
        .route("/health", get(health))
        .layer(cors)
        .with_state(AppState { intake })
}

pub async fn serve(
    listener: TcpListener,
    app: Router,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let local_addr = listener.local_addr()?;
    tracing::info!("🌐 Token faucet backend running on http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .map_err(|e| FaucetError::ServerError {
            message: e.to_string(),
        })
}
