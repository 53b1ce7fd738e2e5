//! HTTP routes.

use crate::{PipelineError, RequestOrchestrator};
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use manzai_core::{GenerationRequestInput, UserKey};
use manzai_ledger::CreditDelta;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared state for route handlers.
#[derive(Debug, Clone)]
pub struct ApiState {
    orchestrator: Arc<RequestOrchestrator>,
    production: bool,
}

impl ApiState {
    /// Create API state.
    ///
    /// In production, classified provider failures are not echoed back to
    /// clients.
    pub fn new(orchestrator: Arc<RequestOrchestrator>, production: bool) -> Self {
        Self {
            orchestrator,
            production,
        }
    }

    /// The pipeline behind the routes.
    pub fn orchestrator(&self) -> &RequestOrchestrator {
        &self.orchestrator
    }

    fn fail(&self, err: PipelineError) -> Response {
        err.into_response_for(self.production)
    }
}

/// Build the service router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/generate",
            post(generate_script).fallback(method_not_allowed),
        )
        .route(
            "/api/credit/add",
            post(add_credit).fallback(method_not_allowed),
        )
        .route("/api/usage/:user_key", get(get_usage))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn method_not_allowed() -> Response {
    let mut response = PipelineError::MethodNotAllowed.into_response();
    response
        .headers_mut()
        .insert(header::ALLOW, header::HeaderValue::from_static("POST"));
    response
}

/// Generate a script.
async fn generate_script(
    State(state): State<ApiState>,
    payload: Result<Json<GenerationRequestInput>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "Rejected generate body");
            return state.fail(PipelineError::BadRequest(rejection.body_text()));
        }
    };

    match state.orchestrator.generate(input).await {
        Ok(script) => (StatusCode::OK, Json(script)).into_response(),
        Err(e) => state.fail(e),
    }
}

/// Add purchased credits.
///
/// Accepts `{"user_id" | "userKey": string, "delta": number | string}`.
async fn add_credit(
    State(state): State<ApiState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return state.fail(PipelineError::BadRequest(rejection.body_text())),
    };

    let key = body
        .get("user_id")
        .or_else(|| body.get("userKey"))
        .and_then(Value::as_str)
        .map(UserKey::new);
    let key = match key {
        Some(Ok(key)) => key,
        Some(Err(e)) => return state.fail(e.into()),
        None => return state.fail(PipelineError::BadRequest("bad params: user_id".to_string())),
    };
    let delta = match body.get("delta").map(CreditDelta::from_json) {
        Some(Ok(delta)) => delta,
        Some(Err(e)) => {
            warn!(error = %e.kind, "Rejected credit delta");
            return state.fail(PipelineError::BadRequest(format!("bad params: {}", e.kind)));
        }
        None => return state.fail(PipelineError::BadRequest("bad params: delta".to_string())),
    };

    match state.orchestrator.add_credits(&key, delta).await {
        Ok(record) => (
            StatusCode::OK,
            Json(json!({"ok": true, "paidCredits": record.paid_credits})),
        )
            .into_response(),
        Err(e) => state.fail(e),
    }
}

/// Read a user's counters without changing them.
async fn get_usage(State(state): State<ApiState>, Path(user_key): Path<String>) -> Response {
    let key = match UserKey::new(user_key) {
        Ok(key) => key,
        Err(e) => return state.fail(e.into()),
    };
    match state.orchestrator.usage(&key).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => state.fail(e),
    }
}
