//! Common transport-layer types shared between the backend and any frontend.
//! These structs mirror the backend handlers' request/response payloads
//! so a frontend can deserialize API responses without duplicating shapes.

mod dashboard;
mod views;

pub use dashboard::{DashboardLayout, HorizonOption, RegionCell, SelectionDto};
pub use views::{DashboardViews, MapHighlightDto, SeriesView};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

// ===================== Selection =====================

/// Request body for selecting a region.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SetRegionRequest {
    /// Region id from the dashboard's region list
    pub region: i64,
}

/// Request body for selecting a forecast horizon.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SetHorizonRequest {
    /// Horizon index, 0 for one hour ahead
    pub horizon: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_roundtrip_shape() {
        let response = ApiResponse::ok(SetHorizonRequest { horizon: 2 }, "ok");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["horizon"], 2);
        assert_eq!(json["message"], "ok");
        assert_eq!(json["success"], true);
    }

    #[test]
    fn test_set_region_request_from_json() {
        let request: SetRegionRequest = serde_json::from_str(r#"{"region": 1282}"#).unwrap();
        assert_eq!(request, SetRegionRequest { region: 1282 });
    }
}
