use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{http::StatusCode, response::Json};
use common::{
    DashboardLayout, DashboardViews, HorizonOption, MapHighlightDto, RegionCell, SelectionDto,
    SeriesView, SetHorizonRequest, SetRegionRequest,
};
use dashboard::{DashboardError, DatasetStore, RegionId, Session};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

pub use common::ApiResponse;

/// A session guarded for sequential event processing
pub type SharedSession = Arc<Mutex<Session>>;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Dataset shared read-only by every session
    pub store: Arc<DatasetStore>,
    /// Open dashboard sessions
    pub sessions: Cache<Uuid, SharedSession>,
    /// Selection a new session starts with
    pub defaults: SessionDefaults,
    /// Per-request timeout applied by the router
    pub request_timeout: Duration,
}

/// Starting selection of new sessions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionDefaults {
    pub region: RegionId,
    pub horizon: usize,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            success: false,
        }
    }
}

/// Error half of handler results
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Maps a rejected selection to a client error.
pub fn dashboard_error(error: &DashboardError) -> ApiError {
    let code = match error {
        DashboardError::InvalidRegion(_) => "INVALID_REGION",
        DashboardError::InvalidHorizon { .. } => "INVALID_HORIZON",
        DashboardError::UnknownRegion(_) => "UNKNOWN_REGION",
        DashboardError::UnknownHorizon(_) => "UNKNOWN_HORIZON",
    };
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(code, error.to_string())),
    )
}

pub fn session_not_found(session_id: Uuid) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(
            "SESSION_NOT_FOUND",
            format!("Session {} does not exist or has expired", session_id),
        )),
    )
}

pub fn internal_error(error: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("INTERNAL_ERROR", error)),
    )
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Number of selectable regions
    pub regions: usize,
    /// Number of prediction horizons
    pub horizons: usize,
    /// Length of the historical timestamp grid
    pub grid_points: usize,
    /// Open sessions
    pub active_sessions: u64,
}

/// A session and the views last pushed to it
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub selection: SelectionDto,
    pub views: DashboardViews,
}

/// Result of a selection change
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SelectionUpdateResponse {
    pub session_id: Uuid,
    /// Dispatched event kind, absent when the value was already selected
    pub event: Option<String>,
    /// Views refreshed by the event
    pub refreshed: Vec<String>,
    pub selection: SelectionDto,
    pub views: DashboardViews,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::dashboard::get_dashboard,
        crate::handlers::sessions::create_session,
        crate::handlers::sessions::get_session,
        crate::handlers::sessions::set_region,
        crate::handlers::sessions::set_horizon,
        crate::handlers::sessions::delete_session,
    ),
    components(
        schemas(
            ApiResponse<DashboardLayout>,
            ApiResponse<SessionResponse>,
            ApiResponse<SelectionUpdateResponse>,
            ErrorResponse,
            HealthResponse,
            SessionResponse,
            SelectionUpdateResponse,
            SetRegionRequest,
            SetHorizonRequest,
            DashboardLayout,
            DashboardViews,
            SeriesView,
            MapHighlightDto,
            SelectionDto,
            HorizonOption,
            RegionCell,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "dashboard", description = "Dashboard layout endpoints"),
        (name = "sessions", description = "Dashboard session and selection endpoints"),
    ),
    info(
        title = "Taxicast API",
        description = "Taxi demand forecast dashboard - historical and predicted trips per region",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
