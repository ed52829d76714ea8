//! Integration tests for the dashboard API, driven in-process through the router

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use icp_architect::config::Config;
use icp_architect::server::{router, ServerState};
use icp_architect::SoulEngine;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn test_state() -> (TempDir, ServerState) {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.soul.path = dir.path().join("soul_file.json");
    config.ollama.base_url = "http://127.0.0.1:9".to_string();
    config.ollama.timeout_secs = 2;

    let engine = SoulEngine::open(&config.soul.path).unwrap();
    let state = ServerState::new(config, engine).unwrap();
    (dir, state)
}

async fn send(state: &ServerState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_index_serves_dashboard() {
    let (_dir, state) = test_state();
    let response = router(state).oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("ICP Architect Dashboard"));
}

#[tokio::test]
async fn test_stats_on_fresh_soul() {
    let (_dir, state) = test_state();
    let (status, body) = send(&state, get("/api/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_feedback_entries"], 0);
    assert_eq!(body["evolution_cycles"], 0);
    assert_eq!(body["patterns_learned"], 0);
}

#[tokio::test]
async fn test_feedback_then_icp() {
    let (_dir, state) = test_state();
    let (status, body) = send(
        &state,
        post_json(
            "/api/feedback",
            &json!({
                "lead_data": {"company_size": "10-50", "industry": "SaaS"},
                "outcome": "won",
                "revenue": 80000
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["result"]["outcome"], "won");
    assert_eq!(body["result"]["lead_data"]["industry"], "SaaS");

    let (_, icp) = send(&state, get("/api/icp")).await;
    assert_eq!(icp["target_signals"], json!(["company_size_10-50_positive"]));
    assert_eq!(icp["whale_indicators"], json!(["high_ticket_positive"]));
    assert_eq!(icp["based_on_examples"], 1);
}

#[tokio::test]
async fn test_reflect_without_body_uses_default_window() {
    let (_dir, state) = test_state();

    let (status, body) = send(
        &state,
        Request::builder()
            .method("POST")
            .uri("/api/reflect")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(body["analysis"].is_null());

    send(&state, post_json("/api/feedback", &json!({"outcome": "won"}))).await;
    send(&state, post_json("/api/feedback", &json!({"outcome": "lost"}))).await;

    let (_, body) = send(&state, post_json("/api/reflect", &json!({"days": 30}))).await;
    assert_eq!(body["analysis"]["win_rate"], 0.5);
    assert_eq!(body["analysis"]["significant_patterns"], json!(["recent_wins_1"]));

    let (_, stats) = send(&state, get("/api/stats")).await;
    assert_eq!(stats["evolution_cycles"], 1);
}

#[tokio::test]
async fn test_reflect_rejects_malformed_body() {
    let (_dir, state) = test_state();
    let (status, body) = send(
        &state,
        Request::builder()
            .method("POST")
            .uri("/api/reflect")
            .header("content-type", "application/json")
            .body(Body::from("{\"days\": \"seven\"}"))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_leads_follow_learned_icp() {
    let (_dir, state) = test_state();
    send(
        &state,
        post_json(
            "/api/feedback",
            &json!({"lead_data": {"company_size": "10-50"}, "outcome": "won"}),
        ),
    )
    .await;

    let (status, leads) = send(&state, get("/api/leads?count=3")).await;
    assert_eq!(status, StatusCode::OK);

    let leads = leads.as_array().unwrap();
    assert_eq!(leads.len(), 3);
    for lead in leads {
        assert_eq!(lead["company_size"], "10-50");
        assert_eq!(lead["industry"], "SaaS");
        assert_eq!(lead["recommendation"], "HIGH");
    }
}

#[tokio::test]
async fn test_leads_default_count() {
    let (_dir, state) = test_state();
    let (_, leads) = send(&state, get("/api/leads")).await;
    assert_eq!(leads.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_ai_analyze_degrades_without_model_server() {
    let (_dir, state) = test_state();
    let (status, body) = send(
        &state,
        post_json("/api/ai-analyze", &json!({"company_name": "AcmeSaaS0"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["analysis"]["score"], 5.0);
    assert_eq!(body["analysis"]["confidence"], 0.3);
}
