use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use geo::MultiPolygon;
use serde::Serialize;

use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Month date – the derived first-of-month timestamp
// ---------------------------------------------------------------------------

/// First calendar day of (`year`, `month`).
///
/// Fails with [`DashboardError::InvalidDate`] for a month outside 1–12 or a
/// year `chrono` cannot represent. `row` is only used for the error message.
pub fn month_start(row: usize, year: i64, month: i64) -> Result<NaiveDate, DashboardError> {
    let invalid = || DashboardError::InvalidDate { row, year, month };
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    let y = i32::try_from(year).map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(y, month as u32, 1).ok_or_else(invalid)
}

// ---------------------------------------------------------------------------
// AccidentRecord – one row of the accident table
// ---------------------------------------------------------------------------

/// One (State, Year, Month) row. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccidentRecord {
    pub state: String,
    pub year: i32,
    /// 1–12.
    pub month: u32,
    pub accidents: u64,
    pub injuries: u64,
    pub deaths: u64,
    /// Always the first day of (`year`, `month`).
    pub date: NaiveDate,
}

/// Untyped row as it comes out of a reader, before the date is derived.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub state: String,
    pub year: i64,
    pub month: i64,
    pub accidents: u64,
    pub injuries: u64,
    pub deaths: u64,
}

impl RawRecord {
    pub fn into_record(self, row: usize) -> Result<AccidentRecord, DashboardError> {
        let date = month_start(row, self.year, self.month)?;
        Ok(AccidentRecord {
            state: self.state,
            year: date.year(),
            month: self.month as u32,
            accidents: self.accidents,
            injuries: self.injuries,
            deaths: self.deaths,
            date,
        })
    }
}

// ---------------------------------------------------------------------------
// BoundaryPolygon – one state outline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BoundaryPolygon {
    /// Value of the join property (state name).
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

// ---------------------------------------------------------------------------
// Snapshot – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Everything loaded at startup. Built once and shared read-only
/// (behind an `Arc`) with every filter/aggregation call.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<AccidentRecord>,
    pub boundaries: Vec<BoundaryPolygon>,
    /// Distinct state names in first-appearance order.
    pub states: Vec<String>,
    /// `(min, max)` year present, `None` when there are no records.
    pub year_bounds: Option<(i32, i32)>,
}

impl Snapshot {
    /// Build the state and year indices from the loaded rows.
    pub fn new(records: Vec<AccidentRecord>, boundaries: Vec<BoundaryPolygon>) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut states = Vec::new();
        let mut year_bounds: Option<(i32, i32)> = None;

        for rec in &records {
            if seen.insert(rec.state.as_str()) {
                states.push(rec.state.clone());
            }
            year_bounds = Some(match year_bounds {
                None => (rec.year, rec.year),
                Some((lo, hi)) => (lo.min(rec.year), hi.max(rec.year)),
            });
        }

        Snapshot {
            records,
            boundaries,
            states,
            year_bounds,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.iter().any(|s| s == name)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn month_start_is_first_of_month() {
        let d = month_start(0, 2021, 7).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2021, 7, 1).unwrap());
    }

    #[test]
    fn month_out_of_range_is_invalid_date() {
        for month in [0, 13, -1] {
            let err = month_start(4, 2020, month).unwrap_err();
            assert!(matches!(
                err,
                DashboardError::InvalidDate { row: 4, year: 2020, .. }
            ));
        }
    }

    #[test]
    fn raw_record_derives_date() {
        let raw = RawRecord {
            state: "Goa".into(),
            year: 2019,
            month: 11,
            accidents: 4,
            injuries: 2,
            deaths: 1,
        };
        let rec = raw.into_record(0).unwrap();
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2019, 11, 1).unwrap());
        assert_eq!(rec.year, 2019);
        assert_eq!(rec.month, 11);
    }

    #[test]
    fn snapshot_indexes_states_in_appearance_order() {
        let mut records = sample_records();
        records.push(record("KA", 2017, 3, 1));
        let snap = Snapshot::new(records, Vec::new());

        assert_eq!(snap.states, vec!["MH", "DL", "KA"]);
        assert_eq!(snap.year_bounds, Some((2017, 2020)));
        assert!(snap.has_state("DL"));
        assert!(!snap.has_state("All"));
    }

    #[test]
    fn empty_snapshot_has_no_year_bounds() {
        let snap = Snapshot::new(Vec::new(), Vec::new());
        assert!(snap.is_empty());
        assert_eq!(snap.year_bounds, None);
    }
}
