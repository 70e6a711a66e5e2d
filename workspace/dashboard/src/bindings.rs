//! Selective refresh of the rendering sinks.
//!
//! A selection change becomes a [`ViewEvent`]. The event's dispatch table
//! ([`ViewEvent::targets`]) names the views that depend on what changed; only
//! those are re-derived and pushed.
//!
//! | event             | targets                          |
//! |-------------------|----------------------------------|
//! | `RegionChanged`   | historical, predicted, map       |
//! | `HorizonChanged`  | predicted                        |

use std::fmt;

use tracing::{debug, trace};

use crate::error::Result;
use crate::query::{
    derive_historical, derive_map_highlight, derive_predicted, DerivedViews, HistoricalView,
    MapHighlight, PredictedView,
};
use crate::selection::{Change, SelectionState};
use crate::store::{DatasetStore, RegionId};

/// A rendering surface fed by the bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewTarget {
    Historical,
    Predicted,
    MapHighlight,
}

impl ViewTarget {
    pub const ALL: [ViewTarget; 3] = [
        ViewTarget::Historical,
        ViewTarget::Predicted,
        ViewTarget::MapHighlight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewTarget::Historical => "historical",
            ViewTarget::Predicted => "predicted",
            ViewTarget::MapHighlight => "map_highlight",
        }
    }
}

impl fmt::Display for ViewTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, effective selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    RegionChanged(Change<RegionId>),
    HorizonChanged(Change<usize>),
}

impl ViewEvent {
    /// Views that must be refreshed for this kind of event.
    pub fn targets(&self) -> &'static [ViewTarget] {
        match self {
            ViewEvent::RegionChanged(_) => &ViewTarget::ALL,
            ViewEvent::HorizonChanged(_) => &[ViewTarget::Predicted],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ViewEvent::RegionChanged(_) => "region_changed",
            ViewEvent::HorizonChanged(_) => "horizon_changed",
        }
    }
}

/// Receives derived view data. Each call replaces the previous value for that
/// target wholesale.
pub trait ViewSink {
    fn push_historical(&mut self, view: &HistoricalView);
    fn push_predicted(&mut self, view: &PredictedView);
    fn push_map_highlight(&mut self, view: &MapHighlight);
}

/// Views re-derived for one event, ready to be pushed.
///
/// Deriving and pushing are separate steps so a derivation failure leaves every
/// sink untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewUpdate {
    pub historical: Option<HistoricalView>,
    pub predicted: Option<PredictedView>,
    pub map_highlight: Option<MapHighlight>,
}

impl ViewUpdate {
    /// Derives the views `event` targets, reading region and horizon from the
    /// already-updated `selection`.
    pub fn for_event(
        store: &DatasetStore,
        selection: &SelectionState,
        event: &ViewEvent,
    ) -> Result<Self> {
        trace!(kind = event.kind(), "Deriving views for event");
        Self::for_targets(store, selection, event.targets())
    }

    /// Derives every view, used for the initial render of a session.
    pub fn full(store: &DatasetStore, selection: &SelectionState) -> Result<Self> {
        Self::for_targets(store, selection, &ViewTarget::ALL)
    }

    fn for_targets(
        store: &DatasetStore,
        selection: &SelectionState,
        targets: &[ViewTarget],
    ) -> Result<Self> {
        let region = selection.region();
        let mut update = Self::default();
        for target in targets {
            match target {
                ViewTarget::Historical => {
                    update.historical = Some(derive_historical(store, region)?);
                }
                ViewTarget::Predicted => {
                    update.predicted =
                        Some(derive_predicted(store, selection.horizon(), region)?);
                }
                ViewTarget::MapHighlight => {
                    update.map_highlight = Some(derive_map_highlight(store, region)?);
                }
            }
        }
        Ok(update)
    }

    /// Targets present in this update, in [`ViewTarget::ALL`] order.
    pub fn targets(&self) -> Vec<ViewTarget> {
        let mut targets = Vec::with_capacity(3);
        if self.historical.is_some() {
            targets.push(ViewTarget::Historical);
        }
        if self.predicted.is_some() {
            targets.push(ViewTarget::Predicted);
        }
        if self.map_highlight.is_some() {
            targets.push(ViewTarget::MapHighlight);
        }
        targets
    }

    pub fn is_empty(&self) -> bool {
        self.historical.is_none() && self.predicted.is_none() && self.map_highlight.is_none()
    }

    pub fn push_to<S: ViewSink + ?Sized>(&self, sink: &mut S) {
        if let Some(view) = &self.historical {
            sink.push_historical(view);
        }
        if let Some(view) = &self.predicted {
            sink.push_predicted(view);
        }
        if let Some(view) = &self.map_highlight {
            sink.push_map_highlight(view);
        }
        debug!(targets = ?self.targets(), "Pushed view update");
    }
}

/// A sink that keeps the last-pushed value of every view.
///
/// Push counters let callers tell which views were touched by an event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSnapshot {
    views: DerivedViews,
    historical_pushes: u64,
    predicted_pushes: u64,
    map_highlight_pushes: u64,
}

impl ViewSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn views(&self) -> &DerivedViews {
        &self.views
    }

    pub fn historical(&self) -> &HistoricalView {
        &self.views.historical
    }

    pub fn predicted(&self) -> &PredictedView {
        &self.views.predicted
    }

    pub fn map_highlight(&self) -> &MapHighlight {
        &self.views.map_highlight
    }

    /// Number of pushes received by `target`.
    pub fn pushes(&self, target: ViewTarget) -> u64 {
        match target {
            ViewTarget::Historical => self.historical_pushes,
            ViewTarget::Predicted => self.predicted_pushes,
            ViewTarget::MapHighlight => self.map_highlight_pushes,
        }
    }
}

impl ViewSink for ViewSnapshot {
    fn push_historical(&mut self, view: &HistoricalView) {
        self.views.historical = view.clone();
        self.historical_pushes += 1;
    }

    fn push_predicted(&mut self, view: &PredictedView) {
        self.views.predicted = view.clone();
        self.predicted_pushes += 1;
    }

    fn push_map_highlight(&mut self, view: &MapHighlight) {
        self.views.map_highlight = *view;
        self.map_highlight_pushes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_store;

    #[test]
    fn test_dispatch_table() {
        let region = ViewEvent::RegionChanged(Change { old: 1075, new: 1282 });
        let horizon = ViewEvent::HorizonChanged(Change { old: 0, new: 2 });
        assert_eq!(region.targets(), &ViewTarget::ALL);
        assert_eq!(horizon.targets(), &[ViewTarget::Predicted]);
    }

    #[test]
    fn test_horizon_update_only_carries_predicted_view() {
        let store = fixture_store();
        let mut selection = SelectionState::for_store(&store, 1075, 0).unwrap();
        let change = selection.set_horizon(2).unwrap();

        let update =
            ViewUpdate::for_event(&store, &selection, &ViewEvent::HorizonChanged(change)).unwrap();

        assert_eq!(update.targets(), vec![ViewTarget::Predicted]);
        assert!(update.historical.is_none());
        assert!(update.map_highlight.is_none());
    }

    #[test]
    fn test_push_to_only_touches_present_views() {
        let store = fixture_store();
        let selection = SelectionState::for_store(&store, 1075, 0).unwrap();
        let mut sink = ViewSnapshot::new();
        ViewUpdate::full(&store, &selection).unwrap().push_to(&mut sink);

        let update = ViewUpdate {
            predicted: Some(PredictedView::default()),
            ..Default::default()
        };
        update.push_to(&mut sink);

        assert_eq!(sink.pushes(ViewTarget::Historical), 1);
        assert_eq!(sink.pushes(ViewTarget::Predicted), 2);
        assert_eq!(sink.pushes(ViewTarget::MapHighlight), 1);
        assert!(sink.predicted().x.is_empty());
    }

    #[test]
    fn test_target_names() {
        let names: Vec<String> = ViewTarget::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["historical", "predicted", "map_highlight"]);
    }
}
