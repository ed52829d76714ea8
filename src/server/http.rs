//! HTTP API handlers

use axum::{
    body::Bytes,
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::server::ServerState;

/// Upper bound for a single lead request
pub const MAX_LEADS_PER_REQUEST: usize = 100;

#[derive(Debug, Deserialize)]
pub struct LeadsQuery {
    pub count: Option<usize>,
}

/// Reflect request, all fields optional
#[derive(Debug, Default, Deserialize)]
pub struct ReflectRequest {
    pub days: Option<i64>,
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (
        status,
        Json(json!({
            "status": "error",
            "message": message.to_string()
        })),
    )
        .into_response()
}

/// Soul statistics
pub async fn stats_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let engine = state.engine.lock().await;
    (StatusCode::OK, Json(engine.stats()))
}

/// Current ICP recommendations
pub async fn icp_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let engine = state.engine.lock().await;
    (StatusCode::OK, Json(engine.current_recommendations()))
}

/// Generated and scored leads
pub async fn leads_handler(
    State(state): State<ServerState>,
    Query(query): Query<LeadsQuery>,
) -> impl IntoResponse {
    let count = query
        .count
        .unwrap_or(state.config.leads.default_count)
        .min(MAX_LEADS_PER_REQUEST);

    let icp = state.engine.lock().await.current_recommendations();
    let leads = state.sourcer.generate_leads(count, &icp);
    (StatusCode::OK, Json(state.sourcer.score_leads(leads)))
}

/// Record one outcome
pub async fn feedback_handler(
    State(state): State<ServerState>,
    Json(outcome_data): Json<Value>,
) -> Response {
    let mut engine = state.engine.lock().await;
    match engine.add_feedback(&outcome_data) {
        Ok(record) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "result": record
            })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to record feedback: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
    }
}

/// Run a reflection cycle. The body is optional.
pub async fn reflect_handler(State(state): State<ServerState>, body: Bytes) -> Response {
    let request = if body.is_empty() {
        ReflectRequest::default()
    } else {
        match serde_json::from_slice::<ReflectRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid reflect request: {}", e),
                )
            }
        }
    };
    let days = request
        .days
        .unwrap_or(state.config.soul.reflection_window_days);
    debug!("Reflection requested over {} days", days);

    let mut engine = state.engine.lock().await;
    match engine.run_reflection_cycle(days) {
        Ok(analysis) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "analysis": analysis
            })),
        )
            .into_response(),
        Err(e) => {
            error!("Reflection cycle failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
    }
}

/// Analyze a lead with the local model
pub async fn ai_analyze_handler(
    State(state): State<ServerState>,
    Json(lead): Json<Value>,
) -> impl IntoResponse {
    let analysis = state.ollama.analyze_lead(&lead).await;
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "analysis": analysis
        })),
    )
}
