use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chatsim_core::{ErrorResponse, GenerateRequest};
use serde::Serialize;
use tracing::{info, warn};

use crate::orchestrator::GenerateError;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        let status = match self {
            GenerateError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GenerateError::GenerationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.user_message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>, bind_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/generate-conversation", post(generate_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /api/generate-conversation
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected generation request: {}", rejection.body_text());
            return GenerateError::InvalidRequest(rejection.body_text()).into_response();
        }
    };

    info!(
        characters = request.characters.len(),
        model = request.model.as_deref().unwrap_or("-"),
        "Received generation request"
    );

    match state.orchestrator().handle(request).await {
        Ok(conversation) => (StatusCode::OK, Json(conversation)).into_response(),
        Err(e) => e.into_response(),
    }
}
