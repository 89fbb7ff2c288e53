use crate::config::Config;
use crate::dashboard::DashboardView;
use crate::errors::{AppError, ResultExt};
use crate::gateway::AnalysisGateway;
use crate::models::FraudInput;
use crate::sample::sample_input;
use crate::session::{Session, SessionSnapshot, View};
use crate::validator::parse_input_with;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Gateway to the inference service.
    pub gateway: AnalysisGateway,
    /// The single analysis session.
    pub session: Session,
}

impl AppState {
    pub fn new(config: Config, gateway: AnalysisGateway) -> Self {
        Self {
            config,
            gateway,
            session: Session::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: SessionSnapshot,
    /// False while a call is in flight or when no API key is configured.
    pub analyze_enabled: bool,
}

async fn session_response(state: &AppState) -> SessionResponse {
    let session = state.session.snapshot().await;
    let analyze_enabled = !session.busy && state.config.credential_configured();
    SessionResponse {
        session,
        analyze_enabled,
    }
}

/// Routes without middleware; `main` adds tracing, CORS and the body limit.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/sample-input", get(get_sample_input))
        .route("/api/v1/analyze", post(analyze))
        .route("/api/v1/dashboard", get(get_dashboard))
        .route("/api/v1/session", get(get_session))
        .route("/api/v1/session/input", put(put_session_input))
        .route("/api/v1/session/reset", post(reset_session_input))
        .route("/api/v1/session/view/:view", post(select_view))
        .route("/api/v1/session/analyze", post(analyze_session))
        .with_state(state)
}

/// Health check endpoint.
///
/// Reports whether an API key is configured so clients can disable analysis up front.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "fraudguard-api",
            "version": env!("CARGO_PKG_VERSION"),
            "credential_configured": state.config.credential_configured(),
        })),
    )
}

/// GET /api/v1/sample-input
pub async fn get_sample_input() -> Json<FraudInput> {
    Json(sample_input())
}

/// POST /api/v1/analyze
///
/// Stateless analysis of the raw request body. The session is not touched.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<DashboardView>, AppError> {
    tracing::info!("POST /analyze - {} bytes", body.len());
    state.config.credential()?;

    let input = parse_input_with(&body, state.config.validation_mode)?;
    let completed = state
        .gateway
        .run(input)
        .await
        .context("Stateless analysis failed")?;

    Ok(Json(DashboardView::build(&completed)))
}

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardView>, AppError> {
    Ok(Json(state.session.dashboard().await?))
}

/// GET /api/v1/session
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    Json(session_response(&state).await)
}

/// PUT /api/v1/session/input
///
/// Replaces the editor text verbatim; it is only validated when analyzed.
pub async fn put_session_input(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Json<SessionResponse> {
    state.session.set_input(body).await;
    Json(session_response(&state).await)
}

/// POST /api/v1/session/reset
pub async fn reset_session_input(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    state.session.reset_input().await;
    Json(session_response(&state).await)
}

/// POST /api/v1/session/view/:view
pub async fn select_view(
    State(state): State<Arc<AppState>>,
    Path(view): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let view: View = view.parse()?;
    state.session.select_view(view).await?;
    Ok(Json(session_response(&state).await))
}

/// POST /api/v1/session/analyze
///
/// Analyzes the session's current input text and returns the new dashboard.
pub async fn analyze_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardView>, AppError> {
    tracing::info!("POST /session/analyze");
    state.config.credential()?;

    let completed = state.session.analyze(&state.gateway).await?;
    Ok(Json(DashboardView::build(&completed)))
}
