//! HTTP server implementation using axum.
//!
//! Routes:
//! - `POST /webhook`: validate, sign and forward (or echo in test mode) one order
//! - `GET /health`: liveness plus the active scheme

use std::sync::Arc;

use aster_core::{Clock, OrderIntent, ParamBuilder};
use aster_signer::{assemble, PayloadSigner, RequestSigner, SharedClock, WireRequest};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Map, Value};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::forwarder::OrderForwarder;

/// Shared state for axum handlers. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    params: ParamBuilder,
    signer: Arc<RequestSigner>,
    forwarder: OrderForwarder,
    clock: SharedClock,
    test_mode: bool,
}

impl AppState {
    pub fn new(config: &AppConfig, signer: RequestSigner, clock: SharedClock) -> AppResult<Self> {
        Ok(Self {
            params: ParamBuilder::new(config.recv_window),
            signer: Arc::new(signer),
            forwarder: OrderForwarder::new(config.order_url.clone(), config.request_timeout())?,
            clock,
            test_mode: config.test_mode,
        })
    }

    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    /// Validate, sign, and either echo or submit one webhook body.
    async fn relay(&self, body: &[u8]) -> AppResult<Value> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| AppError::InvalidJson(e.to_string()))?;
        let intent = OrderIntent::from_value(value)?;

        info!(
            symbol = %intent.symbol,
            side = %intent.side,
            order_type = %intent.order_type,
            quantity = %intent.quantity,
            "Received order"
        );

        let params = self.params.build(&intent, self.clock.now_ms())?;
        let signed = self.signer.sign(params)?;
        let request = assemble(&signed)?;

        if self.test_mode {
            info!("Test mode: order signed but not submitted");
            return Ok(dry_run_body(&request, self.forwarder.order_url()));
        }

        let reply = self.forwarder.send(&request).await?;
        info!(status = reply.status, "Order placed");
        Ok(json!({ "status": "ok", "result": reply.body }))
    }
}

/// Echo of what would have been sent. The API key is never echoed.
fn dry_run_body(request: &WireRequest, endpoint: &str) -> Value {
    let mut headers = Map::new();
    if let Some((name, _)) = request.api_key_header() {
        headers.insert(name.to_string(), Value::from("REDACTED"));
    }
    json!({
        "status": "test",
        "final_qs": request.body,
        "endpoint": endpoint,
        "headers": headers,
    })
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn webhook(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, AppError> {
    let span = info_span!("webhook", request_id = %Uuid::new_v4());

    async move {
        match state.relay(&body).await {
            Ok(reply) => Ok(Json(reply)),
            Err(e) => {
                if e.is_local() {
                    warn!(error = %e, status = e.status_code(), "Webhook rejected");
                } else {
                    error!(error = %e, status = e.status_code(), "Order submission failed");
                }
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "scheme": state.signer.scheme(),
        "test_mode": state.test_mode,
    }))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        let body = match self {
            AppError::InvalidJson(_) => json!({ "error": "Invalid JSON" }),
            AppError::NonJsonResponse { text, .. } => {
                json!({ "error": "Non-JSON response", "text": text })
            }
            AppError::OrderRejected { detail, .. } => {
                json!({ "error": "order failed", "detail": detail })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
