//! Dashboard server
//!
//! Serves a small HTML dashboard and the JSON API over one shared engine.
//! The engine is built once per process and injected as router state; the
//! mutex serializes writers inside this process only.

pub mod http;

use anyhow::{Context, Result};
use axum::{
    response::Html,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::OllamaClient;
use crate::config::Config;
use crate::leads::LeadSourcer;
use crate::soul::SoulEngine;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub engine: Arc<Mutex<SoulEngine>>,
    pub sourcer: LeadSourcer,
    pub ollama: OllamaClient,
}

impl ServerState {
    pub fn new(config: Config, engine: SoulEngine) -> Result<Self> {
        let ollama = OllamaClient::new(&config.ollama)?;
        Ok(Self {
            config: Arc::new(config),
            engine: Arc::new(Mutex::new(engine)),
            sourcer: LeadSourcer::new(),
            ollama,
        })
    }
}

/// Build the application router
pub fn router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_page))
        .route("/api/stats", get(http::stats_handler))
        .route("/api/icp", get(http::icp_handler))
        .route("/api/leads", get(http::leads_handler))
        .route("/api/feedback", post(http::feedback_handler))
        .route("/api/reflect", post(http::reflect_handler))
        .route("/api/ai-analyze", post(http::ai_analyze_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn start(host: &str, port: u16, state: ServerState) -> Result<()> {
    let soul_path = state.engine.lock().await.store().path().display().to_string();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    let addr = listener.local_addr().context("Failed to read bound address")?;

    info!("Dashboard listening on http://{}", addr);
    println!("ICP Architect dashboard on http://{}", addr);
    println!("Soul file: {}", soul_path);
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")?;

    Ok(())
}

async fn index_page() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>ICP Architect Dashboard</title>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; }
        .dashboard { display: grid; grid-template-columns: 1fr 1fr; gap: 20px; }
        .card { background: #f5f5f5; padding: 20px; border-radius: 8px; }
        .leads { grid-column: 1 / -1; }
        .lead-item { background: white; margin: 5px 0; padding: 10px; border-radius: 4px; }
        .high-confidence { border-left: 4px solid #4CAF50; }
        .medium-confidence { border-left: 4px solid #FFC107; }
        .low-confidence { border-left: 4px solid #F44336; }
    </style>
</head>
<body>
    <h1>ICP Architect Dashboard</h1>

    <div class="dashboard">
        <div class="card">
            <h3>System Stats</h3>
            <div id="stats">Loading...</div>
        </div>

        <div class="card">
            <h3>ICP Recommendations</h3>
            <div id="icp">Loading...</div>
            <button onclick="reflect()">Run Reflection</button>
        </div>

        <div class="card leads">
            <h3>Generated Leads</h3>
            <button onclick="loadLeads()">Generate New Leads</button>
            <div id="leads-container"></div>
        </div>
    </div>

    <script>
        function escapeHtml(text) {
            const div = document.createElement('div');
            div.textContent = String(text);
            return div.innerHTML;
        }

        async function loadStats() {
            const stats = await (await fetch('/api/stats')).json();
            document.getElementById('stats').innerHTML =
                `<p>Feedback Entries: ${stats.total_feedback_entries}</p>
                 <p>Evolution Cycles: ${stats.evolution_cycles}</p>
                 <p>Patterns Learned: ${stats.patterns_learned}</p>`;
        }

        async function loadIcp() {
            const icp = await (await fetch('/api/icp')).json();
            document.getElementById('icp').innerHTML =
                `<strong>Target:</strong> ${escapeHtml(icp.target_signals.join(', '))}<br>
                 <strong>Avoid:</strong> ${escapeHtml(icp.avoid_signals.join(', '))}<br>
                 <strong>Whales:</strong> ${escapeHtml(icp.whale_indicators.join(', '))}<br>
                 <strong>Confidence:</strong> ${(icp.confidence_level * 100).toFixed(1)}%`;
        }

        async function loadLeads() {
            const leads = await (await fetch('/api/leads?count=5')).json();
            document.getElementById('leads-container').innerHTML = leads.map(lead =>
                `<div class="lead-item ${confidenceClass(lead.confidence_score)}">
                    <strong>${escapeHtml(lead.company_name)}</strong> - ${escapeHtml(lead.industry)}<br>
                    Size: ${escapeHtml(lead.company_size)} | Potential: $${lead.revenue_potential}<br>
                    Confidence: ${(lead.confidence_score * 100).toFixed(1)}% (${lead.recommendation})
                </div>`
            ).join('');
        }

        async function reflect() {
            await fetch('/api/reflect', { method: 'POST' });
            await Promise.all([loadStats(), loadIcp(), loadLeads()]);
        }

        function confidenceClass(score) {
            if (score > 0.7) return 'high-confidence';
            if (score > 0.5) return 'medium-confidence';
            return 'low-confidence';
        }

        loadStats();
        loadIcp();
        loadLeads();
    </script>
</body>
</html>
"#;
