/// Aggregation pipeline over a filtered subset.
///
/// ```text
///   filtered subset
///     ├── summarize        → Summary (accidents, injuries, deaths)
///     ├── monthly_series   → Vec<MonthlyPoint> ──► decompose (≥ min_points)
///     └── spatial_totals   → state → total ──► join_boundaries
/// ```

pub mod aggregate;
pub mod decompose;
