use serde::Serialize;

use crate::analysis::aggregate::{build_view, DashboardView};
use crate::analysis::decompose::Decomposer;
use crate::config::AnalysisConfig;
use crate::data::filter::{FilterSelection, StateSelection};
use crate::data::model::Snapshot;
use crate::error::DashboardError;

/// Filter values given on the command line; unset fields fall back to the
/// initial selection.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub state: Option<String>,
    pub from: Option<i32>,
    pub to: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub state: String,
    pub year_from: i32,
    pub year_to: i32,
    #[serde(flatten)]
    pub view: DashboardView,
}

/// Build the view for a command-line selection.
pub fn build_report(
    snapshot: &Snapshot,
    initial: &FilterSelection,
    request: &ReportRequest,
    decomposer: &dyn Decomposer,
    config: &AnalysisConfig,
) -> Result<Report, DashboardError> {
    let state = request
        .state
        .as_deref()
        .map(StateSelection::parse)
        .unwrap_or_else(|| initial.state.clone());
    let lo = request.from.unwrap_or(initial.years.lo());
    let hi = request.to.unwrap_or(initial.years.hi());
    let selection = FilterSelection::validated(snapshot, state, lo, hi)?;

    let view = build_view(snapshot, &selection, decomposer, config);
    Ok(Report {
        state: selection.state.to_string(),
        year_from: selection.years.lo(),
        year_to: selection.years.hi(),
        view,
    })
}
