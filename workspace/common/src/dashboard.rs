use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A choice in the horizon picker.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct HorizonOption {
    /// Index sent back when selecting this horizon
    pub index: usize,
    /// Display label, e.g. "Hour +1"
    pub label: String,
}

/// A region cell of the static map background.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RegionCell {
    pub region: i64,
    pub x: f64,
    pub y: f64,
}

/// Current selection of a session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SelectionDto {
    pub region: i64,
    pub horizon: usize,
    pub horizon_label: String,
}

/// Everything a frontend needs to lay out the dashboard controls and map.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DashboardLayout {
    /// Page heading
    pub title: String,
    /// Selectable regions, ascending
    pub regions: Vec<i64>,
    /// Horizon picker options
    pub horizons: Vec<HorizonOption>,
    /// Side length of every region cell in map units
    pub cell_size: f64,
    /// All region cells for the map background
    pub cells: Vec<RegionCell>,
    /// Selection a new session starts with
    pub default_selection: SelectionDto,
}
