use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use super::decompose::{Components, Decomposer};
use crate::config::AnalysisConfig;
use crate::data::filter::{filter, FilterSelection};
use crate::data::model::{month_start, AccidentRecord, BoundaryPolygon, Snapshot};

// ---------------------------------------------------------------------------
// Aggregated outputs
// ---------------------------------------------------------------------------

/// Scalar totals over the filtered subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub accidents: u64,
    pub injuries: u64,
    pub deaths: u64,
}

/// One month of the trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    pub date: NaiveDate,
    pub accidents: u64,
}

/// State name → accident total.
pub type SpatialTotals = BTreeMap<String, u64>;

/// Totals attached to boundary polygons by exact name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinedTotals {
    /// `(index into Snapshot::boundaries, accident total)`.
    pub matched: Vec<(usize, u64)>,
    /// States with a total but no boundary of the same name.
    pub unmatched: Vec<String>,
}

impl JoinedTotals {
    /// Smallest and largest matched total, `None` when nothing matched.
    pub fn value_range(&self) -> Option<(u64, u64)> {
        let values = self.matched.iter().map(|&(_, v)| v);
        Some((values.clone().min()?, values.max()?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Decomposition {
    Ready(Components),
    /// Too few monthly points; shown as a warning instead of the plot.
    Insufficient { points: usize, required: usize },
}

/// Everything the presentation layer draws for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub record_count: usize,
    pub summary: Summary,
    pub monthly: Vec<MonthlyPoint>,
    pub spatial: SpatialTotals,
    pub joined: JoinedTotals,
    pub decomposition: Decomposition,
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

// Sums saturate at `u64::MAX` rather than wrap or panic.

pub fn summarize(subset: &[&AccidentRecord]) -> Summary {
    subset.iter().fold(Summary::default(), |acc, rec| Summary {
        accidents: acc.accidents.saturating_add(rec.accidents),
        injuries: acc.injuries.saturating_add(rec.injuries),
        deaths: acc.deaths.saturating_add(rec.deaths),
    })
}

/// Accidents per (year, month), oldest first. Months with no rows are absent,
/// not zero.
pub fn monthly_series(subset: &[&AccidentRecord]) -> Vec<MonthlyPoint> {
    let mut by_month: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for rec in subset {
        let total = by_month.entry(rec.date).or_default();
        *total = total.saturating_add(rec.accidents);
    }
    by_month
        .into_iter()
        .map(|(date, accidents)| MonthlyPoint { date, accidents })
        .collect()
}

/// Accidents per state.
pub fn spatial_totals(subset: &[&AccidentRecord]) -> SpatialTotals {
    let mut totals = SpatialTotals::new();
    for rec in subset {
        let total = totals.entry(rec.state.clone()).or_default();
        *total = total.saturating_add(rec.accidents);
    }
    totals
}

/// Attach totals to boundaries by exact state-name match. Boundaries without
/// a total are left out of `matched`; totals without a boundary are listed in
/// `unmatched` and otherwise dropped.
pub fn join_boundaries(boundaries: &[BoundaryPolygon], totals: &SpatialTotals) -> JoinedTotals {
    let by_name: HashMap<&str, usize> = boundaries
        .iter()
        .enumerate()
        .map(|(i, b)| (b.name.as_str(), i))
        .collect();

    let mut joined = JoinedTotals::default();
    for (i, boundary) in boundaries.iter().enumerate() {
        if let Some(&total) = totals.get(&boundary.name) {
            joined.matched.push((i, total));
        }
    }
    for name in totals.keys() {
        if !by_name.contains_key(name.as_str()) {
            joined.unmatched.push(name.clone());
        }
    }

    if !joined.unmatched.is_empty() {
        log::warn!(
            "{} state(s) have no matching boundary and are left off the map: {:?}",
            joined.unmatched.len(),
            joined.unmatched
        );
    }
    joined
}

/// Run the decomposer only when the series is long enough.
pub fn decompose_monthly(
    monthly: &[MonthlyPoint],
    decomposer: &dyn Decomposer,
    config: &AnalysisConfig,
) -> Decomposition {
    if monthly.len() < config.min_points {
        return Decomposition::Insufficient {
            points: monthly.len(),
            required: config.min_points,
        };
    }

    let values: Vec<f64> = monthly.iter().map(|p| p.accidents as f64).collect();
    match decomposer.decompose(&values, config.period) {
        Ok(components) => Decomposition::Ready(components),
        Err(e) => {
            log::warn!("Decomposition skipped: {e}");
            Decomposition::Insufficient {
                points: monthly.len(),
                required: config.min_points.max(2 * config.period),
            }
        }
    }
}

/// filter → aggregate → join → decompose for one selection.
pub fn build_view(
    snapshot: &Snapshot,
    selection: &FilterSelection,
    decomposer: &dyn Decomposer,
    config: &AnalysisConfig,
) -> DashboardView {
    let subset = filter(&snapshot.records, selection);
    let summary = summarize(&subset);
    let monthly = monthly_series(&subset);
    let spatial = spatial_totals(&subset);
    let joined = join_boundaries(&snapshot.boundaries, &spatial);
    let decomposition = decompose_monthly(&monthly, decomposer, config);

    log::debug!(
        "View for {} {}..={}: {} rows, {} months, {} states",
        selection.state,
        selection.years.lo(),
        selection.years.hi(),
        subset.len(),
        monthly.len(),
        spatial.len()
    );

    DashboardView {
        record_count: subset.len(),
        summary,
        monthly,
        spatial,
        joined,
        decomposition,
    }
}

/// Month index used as the x coordinate of time plots (`year * 12 + month - 1`).
pub fn month_ordinal(date: NaiveDate) -> f64 {
    use chrono::Datelike;
    (date.year() as f64) * 12.0 + date.month0() as f64
}

/// Inverse of [`month_ordinal`], for axis labels. `None` off the grid.
pub fn ordinal_to_month(ordinal: f64) -> Option<NaiveDate> {
    if ordinal.fract().abs() > 1e-6 {
        return None;
    }
    let n = ordinal.round() as i64;
    month_start(0, n.div_euclid(12), n.rem_euclid(12) + 1).ok()
}
