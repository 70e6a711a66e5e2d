//! State synchronization engine of the taxi demand dashboard.
//!
//! A [`Session`] owns the user's [`SelectionState`] (region and forecast
//! horizon). Every accepted change becomes a [`ViewEvent`]; the bindings derive
//! only the views that event affects from the shared [`DatasetStore`] and push
//! them to a [`ViewSink`].

pub mod bindings;
pub mod error;
pub mod loader;
pub mod query;
pub mod selection;
pub mod session;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bindings::{ViewEvent, ViewSink, ViewSnapshot, ViewTarget, ViewUpdate};
pub use error::{DashboardError, LoadError, StoreError};
pub use query::{DerivedViews, HistoricalView, MapHighlight, PredictedView};
pub use selection::{horizon_label, Change, SelectionState};
pub use session::{Refresh, Session};
pub use store::{Coordinate, DatasetStore, RegionId, TimePoint, Timestamp, HORIZON_COUNT};

/// Region selected when a session opens.
pub const DEFAULT_REGION: RegionId = 1075;

/// Horizon index selected when a session opens (one hour ahead).
pub const DEFAULT_HORIZON: usize = 0;
