// 🌐 REST API with Axum
// JSON surface over CertificateService

use crate::certificate::Certificate;
use crate::db::SqliteStore;
use crate::error::{IssueError, Rejection};
use crate::pricing::{PricingTier, PRICING_TIERS};
use crate::schema::CertificateSubmission;
use crate::service::CertificateService;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CertificateService<SqliteStore>>,
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl IntoResponse for IssueError {
    fn into_response(self) -> Response {
        match self {
            IssueError::Rejected(rejection) => {
                (StatusCode::BAD_REQUEST, Json(rejection.to_body())).into_response()
            }
            IssueError::Storage(e) => {
                tracing::error!("Storage failure: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<()>::failed("Internal storage error".to_string())),
                )
                    .into_response()
            }
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/certificates - All certificates in issue order
async fn list_certificates(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Certificate>>>, IssueError> {
    let certificates = state.service.list()?;
    Ok(Json(ApiResponse::ok(certificates)))
}

/// POST /api/certificates - Issue a certificate
async fn create_certificate(
    State(state): State<AppState>,
    payload: Result<Json<CertificateSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Certificate>>), IssueError> {
    let Json(submission) =
        payload.map_err(|e| IssueError::Rejected(Rejection::Malformed(e.body_text())))?;

    let certificate = state.service.issue(&submission)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(certificate))))
}

/// GET /api/pricing-tiers - Insured-sum ranges and their premiums
async fn pricing_tiers() -> Json<ApiResponse<Vec<PricingTier>>> {
    Json(ApiResponse::ok(PRICING_TIERS.to_vec()))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(service: Arc<CertificateService<SqliteStore>>) -> Router {
    let state = AppState { service };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/certificates", get(list_certificates).post(create_certificate))
        .route("/pricing-tiers", get(pricing_tiers))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
