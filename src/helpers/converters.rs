use common::{DashboardViews, MapHighlightDto, RegionCell, SelectionDto, SeriesView};
use dashboard::{
    horizon_label, Coordinate, DerivedViews, HistoricalView, MapHighlight, PredictedView,
    RegionId, SelectionState,
};

pub fn historical_to_dto(view: &HistoricalView) -> SeriesView {
    SeriesView {
        x: view.x.clone(),
        y: view.y.clone(),
    }
}

pub fn predicted_to_dto(view: &PredictedView) -> SeriesView {
    SeriesView {
        x: view.x.clone(),
        y: view.y.clone(),
    }
}

pub fn map_highlight_to_dto(view: &MapHighlight) -> MapHighlightDto {
    MapHighlightDto {
        x: view.x,
        y: view.y,
    }
}

pub fn views_to_dto(views: &DerivedViews) -> DashboardViews {
    DashboardViews {
        historical: historical_to_dto(&views.historical),
        predicted: predicted_to_dto(&views.predicted),
        map_highlight: map_highlight_to_dto(&views.map_highlight),
    }
}

pub fn selection_to_dto(selection: &SelectionState) -> SelectionDto {
    selection_dto(selection.region(), selection.horizon())
}

pub fn selection_dto(region: RegionId, horizon: usize) -> SelectionDto {
    SelectionDto {
        region,
        horizon,
        horizon_label: horizon_label(horizon),
    }
}

pub fn cell_to_dto((region, coordinate): (RegionId, Coordinate)) -> RegionCell {
    RegionCell {
        region,
        x: coordinate.x,
        y: coordinate.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard::query::derive_all;
    use dashboard::testing::fixture_store;

    #[test]
    fn test_views_to_dto_copies_every_view() {
        let store = fixture_store();
        let selection = SelectionState::for_store(&store, 1282, 3).unwrap();
        let views = derive_all(&store, &selection).unwrap();

        let dto = views_to_dto(&views);

        assert_eq!(dto.historical.x, views.historical.x);
        assert_eq!(dto.historical.y, views.historical.y);
        assert_eq!(dto.predicted.y, views.predicted.y);
        assert_eq!(dto.map_highlight.x, views.map_highlight.x);
    }

    #[test]
    fn test_selection_dto_carries_label() {
        let dto = selection_dto(1075, 2);
        assert_eq!(dto.region, 1075);
        assert_eq!(dto.horizon_label, "Hour +3");
    }
}
