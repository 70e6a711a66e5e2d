use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::bindings::{ViewEvent, ViewSink, ViewSnapshot, ViewUpdate};
use crate::error::Result;
use crate::selection::SelectionState;
use crate::store::{DatasetStore, RegionId};

/// Outcome of a selection call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Refresh {
    /// The event that was dispatched, `None` when the call re-selected the
    /// current value.
    pub event: Option<ViewEvent>,
    /// Views pushed to the sink.
    pub update: ViewUpdate,
}

impl Refresh {
    pub fn is_noop(&self) -> bool {
        self.event.is_none()
    }
}

/// One user's dashboard: a selection over a shared store, plus the sink its
/// views are pushed to.
///
/// Every call is all-or-nothing. The candidate selection and its views are
/// computed first; the selection is committed and the sink touched only when
/// both succeed.
#[derive(Debug)]
pub struct Session<S: ViewSink = ViewSnapshot> {
    store: Arc<DatasetStore>,
    selection: SelectionState,
    sink: S,
}

impl<S: ViewSink> Session<S> {
    /// Opens a session at `region`/`horizon` and pushes every view once.
    #[instrument(skip(store, sink))]
    pub fn open(store: Arc<DatasetStore>, region: RegionId, horizon: usize, mut sink: S) -> Result<Self> {
        let selection = SelectionState::for_store(&store, region, horizon)?;
        ViewUpdate::full(&store, &selection)?.push_to(&mut sink);
        info!(region, horizon, "Session opened");
        Ok(Self {
            store,
            selection,
            sink,
        })
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn store(&self) -> &Arc<DatasetStore> {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[instrument(skip(self), fields(current = self.selection.region()))]
    pub fn set_region(&mut self, region: RegionId) -> Result<Refresh> {
        let mut next = self.selection.clone();
        let change = next.set_region(region)?;
        if change.is_noop() {
            debug!("Region unchanged, nothing to refresh");
            return Ok(Refresh::default());
        }
        self.apply(next, ViewEvent::RegionChanged(change))
    }

    #[instrument(skip(self), fields(current = self.selection.horizon()))]
    pub fn set_horizon(&mut self, horizon: usize) -> Result<Refresh> {
        let mut next = self.selection.clone();
        let change = next.set_horizon(horizon)?;
        if change.is_noop() {
            debug!("Horizon unchanged, nothing to refresh");
            return Ok(Refresh::default());
        }
        self.apply(next, ViewEvent::HorizonChanged(change))
    }

    /// Re-pushes every view for the current selection.
    pub fn refresh_all(&mut self) -> Result<ViewUpdate> {
        let update = ViewUpdate::full(&self.store, &self.selection)?;
        update.push_to(&mut self.sink);
        Ok(update)
    }

    fn apply(&mut self, next: SelectionState, event: ViewEvent) -> Result<Refresh> {
        let update = ViewUpdate::for_event(&self.store, &next, &event)?;
        self.selection = next;
        update.push_to(&mut self.sink);
        Ok(Refresh {
            event: Some(event),
            update,
        })
    }
}
