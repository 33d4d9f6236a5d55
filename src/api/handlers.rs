//! REST API handlers for ZIP referral lookups and map edits
//!
//! These handlers use the shared LocationService.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::service::LocationService;
use crate::error::ZipRouteError;
use crate::models::{MapSnapshot, Resolution, ZipAssignmentProposal};
use crate::reconciler::ReconcileReport;
use crate::store::LocationStore;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ResolutionResponse {
    #[serde(flatten)]
    pub resolution: Resolution,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: i64,
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Deserialize)]
pub struct ZipQuery {
    pub zip: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

pub type AppState<S> = Arc<LocationService<S>>;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            timestamp: now_millis(),
        }),
    )
}

impl From<ZipRouteError> for (StatusCode, Json<ErrorResponse>) {
    fn from(e: ZipRouteError) -> Self {
        let status = match &e {
            ZipRouteError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ZipRouteError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ZipRouteError::PartialReconciliation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        api_error(status, e.to_string())
    }
}

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn lookup<S: LocationStore>(
    service: &LocationService<S>,
    zip: &str,
) -> Result<Json<ResolutionResponse>, ApiError> {
    match service.resolve(zip).await? {
        Some(resolution) => Ok(Json(ResolutionResponse {
            resolution,
            timestamp: now_millis(),
        })),
        None => Err(api_error(StatusCode::NOT_FOUND, "No matching location found")),
    }
}

/// GET /api/v1/locations/by-zip?zip=NNNNN
pub async fn get_location_by_zip_query<S: LocationStore>(
    State(service): State<AppState<S>>,
    Query(params): Query<ZipQuery>,
) -> Result<Json<ResolutionResponse>, ApiError> {
    let Some(zip) = params.zip else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Missing zip parameter. Use ?zip=12345",
        ));
    };
    lookup(&service, &zip).await
}

/// GET /api/v1/locations/by-zip/:zip
pub async fn get_location_by_zip<S: LocationStore>(
    State(service): State<AppState<S>>,
    Path(zip): Path<String>,
) -> Result<Json<ResolutionResponse>, ApiError> {
    lookup(&service, &zip).await
}

/// GET /api/v1/zip-map
pub async fn get_zip_map<S: LocationStore>(
    State(service): State<AppState<S>>,
) -> Result<Json<MapSnapshot>, ApiError> {
    Ok(Json(service.map_snapshot().await?))
}

/// POST /api/v1/zip-assignments
pub async fn post_zip_assignments<S: LocationStore>(
    State(service): State<AppState<S>>,
    Json(proposal): Json<ZipAssignmentProposal>,
) -> Result<(StatusCode, Json<ReconcileReport>), ApiError> {
    let report = service.reconcile(proposal).await?;
    let status = if report.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(report)))
}
