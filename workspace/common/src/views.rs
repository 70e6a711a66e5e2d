use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One line of the time-series chart.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct SeriesView {
    /// Timestamps, ascending
    pub x: Vec<NaiveDateTime>,
    /// Values aligned with `x`
    pub y: Vec<f64>,
}

impl SeriesView {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Highlighted region cell on the map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct MapHighlightDto {
    pub x: f64,
    pub y: f64,
}

/// Last-pushed data of every view of a session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct DashboardViews {
    pub historical: SeriesView,
    pub predicted: SeriesView,
    pub map_highlight: MapHighlightDto,
}
