//! REST API server for the query agent
//!
//! Thin transport around the orchestration core: status mapping, CORS
//! for the browser frontend, and request logging live here and nowhere
//! deeper.

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::agent::QueryAgent;
use crate::health::HealthAggregator;
use crate::AgentError;

/// Static example questions for the frontend. Not data-dependent.
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "Show me top 5 clients by equity value",
    "What are the recent transactions for high-value portfolios?",
    "List clients from New York with investment preferences",
    "Compare portfolio performance over the last quarter",
    "Show me the distribution of client age groups",
    "Which sectors have the highest returns this month?",
];

pub fn list_example_questions() -> &'static [&'static str] {
    EXAMPLE_QUESTIONS
}

/// =============================
/// Request/Response Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn failure(error: &AgentError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                kind: error.kind(),
                message: error.user_message(),
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<QueryAgent>,
    pub health: Arc<HealthAggregator>,
}

/// =============================
/// Handlers
/// =============================

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Portfolio query agent is running"
    }))
}

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    let snapshot = state.health.snapshot().await;
    Json(serde_json::json!({
        "status": "healthy",
        "backend_reachable": snapshot.backend_reachable,
        "adapters": snapshot.adapters,
        "checked_at": snapshot.checked_at.to_rfc3339(),
    }))
}

async fn examples() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "examples": EXAMPLE_QUESTIONS }))
}

async fn ask(
    State(state): State<ApiState>,
    Json(request): Json<AskRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    info!(question = %request.question, "Received question");

    match state.agent.orchestrate(&request.question).await {
        Ok(envelope) => (StatusCode::OK, Json(ApiResponse::success(envelope))),
        Err(error) => {
            warn!(kind = error.kind(), %error, "Question failed");
            let status = match &error {
                AgentError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                AgentError::BackendError(_) => StatusCode::BAD_GATEWAY,
                AgentError::StepLimitExceeded(_) => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(ApiResponse::failure(&error)))
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(agent: Arc<QueryAgent>, health_aggregator: Arc<HealthAggregator>) -> Router {
    let state = ApiState {
        agent,
        health: health_aggregator,
    };

    // React dev servers
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"),
        ]))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/examples", get(examples))
        .route("/ask", post(ask))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    agent: Arc<QueryAgent>,
    health_aggregator: Arc<HealthAggregator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(agent, health_aggregator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
