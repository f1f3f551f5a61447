// Attendance Ledger - Web Server
// JSON API over the attendance engine

use attendance_ledger::{
    AttendanceConfig, AttendanceEngine, AttendanceError, AttendanceReport, DataValidator, RawTable,
    ValidationReport,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Shared application state
#[derive(Clone)]
struct AppState {
    /// Used when a request carries no configuration of its own
    default_config: Arc<AttendanceConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        data: None,
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

/// Request body for /api/attendance and /api/validate
#[derive(Deserialize)]
struct AttendanceRequest {
    punches: RawTable,
    shifts: RawTable,
    #[serde(default)]
    config: Option<AttendanceConfig>,
}

impl AttendanceRequest {
    fn resolve_config(&self, state: &AppState) -> AttendanceConfig {
        self.config
            .clone()
            .unwrap_or_else(|| state.default_config.as_ref().clone())
    }
}

fn error_response(err: AttendanceError) -> Response {
    let status = match &err {
        AttendanceError::MissingColumns { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AttendanceError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    failure(status, err.to_string())
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/config - Server default configuration
async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.default_config.as_ref().clone()))
}

/// POST /api/attendance - Evaluate a punch batch against a shift schedule
async fn calculate_attendance(
    State(state): State<AppState>,
    Json(request): Json<AttendanceRequest>,
) -> Response {
    let config = request.resolve_config(&state);

    let result = tokio::task::spawn_blocking(move || -> Result<AttendanceReport, AttendanceError> {
        let engine = AttendanceEngine::new(config)?;
        engine.calculate(&request.punches, &request.shifts)
    })
    .await;

    match result {
        Ok(Ok(report)) => {
            info!("attendance: {}", report.summary());
            (StatusCode::OK, Json(ApiResponse::ok(report))).into_response()
        }
        Ok(Err(e)) => error_response(e),
        Err(e) => {
            error!("attendance task failed: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "calculation task failed")
        }
    }
}

/// POST /api/validate - Pre-flight checks only
async fn validate_batches(
    State(state): State<AppState>,
    Json(request): Json<AttendanceRequest>,
) -> Response {
    let config = request.resolve_config(&state);

    let result = tokio::task::spawn_blocking(move || -> ValidationReport {
        DataValidator::new(&config).validate(&request.punches, &request.shifts)
    })
    .await;

    match result {
        Ok(report) => (StatusCode::OK, Json(ApiResponse::ok(report))).into_response(),
        Err(e) => {
            error!("validation task failed: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "validation task failed")
        }
    }
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/config", get(get_config))
        .route("/attendance", post(calculate_attendance))
        .route("/validate", post(validate_batches))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let default_config = match std::env::var("ATTENDANCE_CONFIG") {
        Ok(path) => AttendanceConfig::from_file(&path)?,
        Err(_) => AttendanceConfig::default(),
    };

    let state = AppState {
        default_config: Arc::new(default_config),
    };

    let addr = std::env::var("ATTENDANCE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Server running on http://{}", addr);
    info!("   API: http://{}/api/attendance", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
