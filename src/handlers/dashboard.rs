use axum::{extract::State, response::Json};
use common::{ApiResponse, DashboardLayout, HorizonOption};
use dashboard::horizon_label;
use tracing::{debug, instrument, trace};

use crate::helpers::converters::{cell_to_dto, selection_dto};
use crate::schemas::AppState;

/// Heading shown above the dashboard
pub const DASHBOARD_TITLE: &str = "New York taxi demand forecast for June";

/// Get the dashboard layout: region picker options, horizon picker options and
/// the static map background
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard layout retrieved successfully", body = ApiResponse<DashboardLayout>)
    )
)]
#[instrument(skip(state))]
pub async fn get_dashboard(State(state): State<AppState>) -> Json<ApiResponse<DashboardLayout>> {
    trace!("Entering get_dashboard function");
    let store = &state.store;

    let horizons = (0..store.horizon_count())
        .map(|index| HorizonOption {
            index,
            label: horizon_label(index),
        })
        .collect();
    let cells: Vec<_> = store.cells().into_iter().map(cell_to_dto).collect();
    debug!("Dashboard layout with {} regions and {} cells", store.regions().len(), cells.len());

    let layout = DashboardLayout {
        title: DASHBOARD_TITLE.to_string(),
        regions: store.regions().to_vec(),
        horizons,
        cell_size: store.cell_size(),
        cells,
        default_selection: selection_dto(state.defaults.region, state.defaults.horizon),
    };

    Json(ApiResponse::ok(layout, "Dashboard layout retrieved successfully"))
}
