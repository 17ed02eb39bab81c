use std::sync::Arc;

use crate::analysis::aggregate::{build_view, DashboardView};
use crate::analysis::decompose::{ClassicalAdditive, Decomposer};
use crate::color::ChoroplethScale;
use crate::config::AppConfig;
use crate::data::filter::{FilterSelection, StateSelection, YearRange};
use crate::data::model::Snapshot;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Loaded dataset (None when loading failed).
    pub snapshot: Option<Arc<Snapshot>>,

    /// Current filter widgets' values.
    pub selection: Option<FilterSelection>,

    /// Aggregations for `selection` (cached until the selection changes).
    pub view: Option<DashboardView>,

    /// Colour scale for the current view's map.
    pub scale: Option<ChoroplethScale>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    decomposer: Box<dyn Decomposer>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            snapshot: None,
            selection: None,
            view: None,
            scale: None,
            status_message: None,
            decomposer: Box::new(ClassicalAdditive),
        }
    }

    /// Ingest the loaded snapshot, initialise filters and build the first view.
    pub fn set_snapshot(&mut self, snapshot: Arc<Snapshot>) {
        self.selection = Some(FilterSelection::initial(&snapshot, &self.config.filters));
        self.snapshot = Some(snapshot);
        self.status_message = None;
        self.rebuild_view();
    }

    /// Record a load failure; the dashboard is not shown.
    pub fn set_load_error(&mut self, message: String) {
        self.snapshot = None;
        self.selection = None;
        self.view = None;
        self.scale = None;
        self.status_message = Some(message);
    }

    /// Recompute the view after a filter change.
    pub fn rebuild_view(&mut self) {
        let (Some(snapshot), Some(selection)) = (&self.snapshot, &self.selection) else {
            return;
        };
        let view = build_view(
            snapshot,
            selection,
            self.decomposer.as_ref(),
            &self.config.analysis,
        );
        self.scale = ChoroplethScale::new(
            view.joined.value_range(),
            self.config.map.bins,
            self.config.map.fill_opacity,
        );
        self.view = Some(view);
    }

    /// Change the state selector.
    pub fn select_state(&mut self, state: StateSelection) {
        if let Some(sel) = &mut self.selection {
            if sel.state != state {
                sel.state = state;
                self.rebuild_view();
            }
        }
    }

    /// Change the year sliders. A reversed pair is reordered.
    pub fn select_years(&mut self, lo: i32, hi: i32) {
        let Some(years) = YearRange::new(lo.min(hi), lo.max(hi)) else {
            return;
        };
        if let Some(sel) = &mut self.selection {
            if sel.years != years {
                sel.years = years;
                self.rebuild_view();
            }
        }
    }
}
