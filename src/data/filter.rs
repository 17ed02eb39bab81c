use std::fmt;

use super::model::{AccidentRecord, Snapshot};
use crate::config::FilterConfig;
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Filter selection: which state and which years
// ---------------------------------------------------------------------------

/// Label the state selector uses for "no state constraint".
pub const ALL_STATES: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StateSelection {
    #[default]
    All,
    Named(String),
}

impl StateSelection {
    /// `"All"` maps to [`StateSelection::All`], anything else to a named state.
    pub fn parse(label: &str) -> Self {
        if label == ALL_STATES {
            StateSelection::All
        } else {
            StateSelection::Named(label.to_string())
        }
    }

    pub fn matches(&self, state: &str) -> bool {
        match self {
            StateSelection::All => true,
            StateSelection::Named(name) => name == state,
        }
    }
}

impl fmt::Display for StateSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateSelection::All => write!(f, "{ALL_STATES}"),
            StateSelection::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Inclusive year bounds, always `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    lo: i32,
    hi: i32,
}

impl YearRange {
    pub fn new(lo: i32, hi: i32) -> Option<Self> {
        (lo <= hi).then_some(YearRange { lo, hi })
    }

    pub fn lo(&self) -> i32 {
        self.lo
    }

    pub fn hi(&self) -> i32 {
        self.hi
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.lo..=self.hi).contains(&year)
    }

    /// Clamp both ends into `bounds`, keeping the range ordered.
    pub fn clamped(&self, bounds: (i32, i32)) -> Self {
        let (min, max) = bounds;
        let lo = self.lo.clamp(min, max);
        let hi = self.hi.clamp(lo, max);
        YearRange { lo, hi }
    }
}

/// The per-interaction filter: rebuilt from the widgets on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub state: StateSelection,
    pub years: YearRange,
}

impl FilterSelection {
    /// First selection shown after load: every state, the configured default
    /// years clamped into the years actually present.
    pub fn initial(snapshot: &Snapshot, config: &FilterConfig) -> Self {
        let (lo, hi) = config.default_years;
        let wanted = YearRange::new(lo, hi).unwrap_or(YearRange { lo: hi, hi: lo });
        let years = match snapshot.year_bounds {
            Some(bounds) => wanted.clamped(bounds),
            None => wanted,
        };
        FilterSelection {
            state: StateSelection::All,
            years,
        }
    }

    /// Build a selection from outside input, rejecting values the selector
    /// widgets could never produce.
    pub fn validated(
        snapshot: &Snapshot,
        state: StateSelection,
        lo: i32,
        hi: i32,
    ) -> Result<Self, DashboardError> {
        if let StateSelection::Named(name) = &state {
            if !snapshot.has_state(name) {
                return Err(DashboardError::InvalidSelection(format!(
                    "unknown state '{name}'"
                )));
            }
        }
        let years = YearRange::new(lo, hi).ok_or_else(|| {
            DashboardError::InvalidSelection(format!("year range {lo}..={hi} is reversed"))
        })?;
        if let Some((min, max)) = snapshot.year_bounds {
            if lo < min || hi > max {
                return Err(DashboardError::InvalidSelection(format!(
                    "year range {lo}..={hi} outside available {min}..={max}"
                )));
            }
        }
        Ok(FilterSelection { state, years })
    }

    pub fn matches(&self, record: &AccidentRecord) -> bool {
        self.years.contains(record.year) && self.state.matches(&record.state)
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Indices of records passing the selection, in source order.
pub fn filtered_indices(records: &[AccidentRecord], selection: &FilterSelection) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// The records passing the selection. An empty result is valid.
pub fn filter<'a>(
    records: &'a [AccidentRecord],
    selection: &FilterSelection,
) -> Vec<&'a AccidentRecord> {
    filtered_indices(records, selection)
        .into_iter()
        .map(|i| &records[i])
        .collect()
}
