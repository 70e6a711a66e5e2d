use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use common::{ApiResponse, SetHorizonRequest, SetRegionRequest};
use dashboard::{Refresh, Session, ViewSnapshot};
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

use crate::helpers::converters::{selection_to_dto, views_to_dto};
use crate::schemas::{
    dashboard_error, internal_error, session_not_found, ApiError, AppState, ErrorResponse,
    SelectionUpdateResponse, SessionResponse, SharedSession,
};

fn session_response(session_id: Uuid, session: &Session) -> SessionResponse {
    SessionResponse {
        session_id,
        selection: selection_to_dto(session.selection()),
        views: views_to_dto(session.sink().views()),
    }
}

fn update_response(session_id: Uuid, session: &Session, refresh: &Refresh) -> SelectionUpdateResponse {
    SelectionUpdateResponse {
        session_id,
        event: refresh.event.map(|event| event.kind().to_string()),
        refreshed: refresh
            .update
            .targets()
            .iter()
            .map(|target| target.as_str().to_string())
            .collect(),
        selection: selection_to_dto(session.selection()),
        views: views_to_dto(session.sink().views()),
    }
}

async fn find_session(state: &AppState, session_id: Uuid) -> Result<SharedSession, ApiError> {
    match state.sessions.get(&session_id).await {
        Some(session) => Ok(session),
        None => {
            debug!("Session {} not found", session_id);
            Err(session_not_found(session_id))
        }
    }
}

/// Runs one selection event under the session lock.
fn apply_selection<F>(
    shared: &SharedSession,
    session_id: Uuid,
    apply: F,
) -> Result<SelectionUpdateResponse, ApiError>
where
    F: FnOnce(&mut Session) -> dashboard::error::Result<Refresh>,
{
    let mut session = shared.lock().map_err(|_| {
        error!("Session {} lock is poisoned", session_id);
        internal_error("Session state is unavailable")
    })?;

    match apply(&mut *session) {
        Ok(refresh) => Ok(update_response(session_id, &session, &refresh)),
        Err(err) => {
            warn!("Rejected selection for session {}: {}", session_id, err);
            Err(dashboard_error(&err))
        }
    }
}

/// Open a new dashboard session at the default selection
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "sessions",
    responses(
        (status = 201, description = "Session created successfully", body = ApiResponse<SessionResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), ApiError> {
    trace!("Entering create_session function");

    let session = Session::open(
        Arc::clone(&state.store),
        state.defaults.region,
        state.defaults.horizon,
        ViewSnapshot::new(),
    )
    .map_err(|err| {
        error!("Failed to open session at the default selection: {}", err);
        internal_error(err.to_string())
    })?;

    let session_id = Uuid::new_v4();
    let response = session_response(session_id, &session);
    state
        .sessions
        .insert(session_id, Arc::new(Mutex::new(session)))
        .await;

    info!("Session {} created", session_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(response, "Session created successfully")),
    ))
}

/// Get the current selection and views of a session
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{session_id}",
    tag = "sessions",
    params(
        ("session_id" = Uuid, Path, description = "Session ID"),
    ),
    responses(
        (status = 200, description = "Session retrieved successfully", body = ApiResponse<SessionResponse>),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_session(
    Path(session_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    trace!("Entering get_session function for session_id: {}", session_id);
    let shared = find_session(&state, session_id).await?;

    let response = {
        let session = shared
            .lock()
            .map_err(|_| internal_error("Session state is unavailable"))?;
        session_response(session_id, &session)
    };

    Ok(Json(ApiResponse::ok(response, "Session retrieved successfully")))
}

/// Select a region; refreshes the historical, predicted and map views
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{session_id}/region",
    tag = "sessions",
    params(
        ("session_id" = Uuid, Path, description = "Session ID"),
    ),
    request_body = SetRegionRequest,
    responses(
        (status = 200, description = "Region selected", body = ApiResponse<SelectionUpdateResponse>),
        (status = 400, description = "Region is not selectable", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn set_region(
    Path(session_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<SetRegionRequest>,
) -> Result<Json<ApiResponse<SelectionUpdateResponse>>, ApiError> {
    trace!("Entering set_region function for session_id: {}", session_id);
    let shared = find_session(&state, session_id).await?;

    let response = apply_selection(&shared, session_id, |session| {
        session.set_region(request.region)
    })?;

    debug!("Session {} refreshed {:?}", session_id, response.refreshed);
    Ok(Json(ApiResponse::ok(response, "Region selected successfully")))
}

/// Select a forecast horizon; refreshes only the predicted view
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{session_id}/horizon",
    tag = "sessions",
    params(
        ("session_id" = Uuid, Path, description = "Session ID"),
    ),
    request_body = SetHorizonRequest,
    responses(
        (status = 200, description = "Horizon selected", body = ApiResponse<SelectionUpdateResponse>),
        (status = 400, description = "Horizon index out of range", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn set_horizon(
    Path(session_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<SetHorizonRequest>,
) -> Result<Json<ApiResponse<SelectionUpdateResponse>>, ApiError> {
    trace!("Entering set_horizon function for session_id: {}", session_id);
    let shared = find_session(&state, session_id).await?;

    let response = apply_selection(&shared, session_id, |session| {
        session.set_horizon(request.horizon)
    })?;

    debug!("Session {} refreshed {:?}", session_id, response.refreshed);
    Ok(Json(ApiResponse::ok(response, "Horizon selected successfully")))
}

/// End a session
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{session_id}",
    tag = "sessions",
    params(
        ("session_id" = Uuid, Path, description = "Session ID"),
    ),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_session(
    Path(session_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_session function for session_id: {}", session_id);

    match state.sessions.remove(&session_id).await {
        Some(_) => {
            info!("Session {} deleted", session_id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(session_not_found(session_id)),
    }
}
