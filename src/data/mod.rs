/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet      .geojson / .shp
///        │                            │
///        ▼                            ▼
///   ┌──────────────────────────────────────┐
///   │  loader    parse files → Snapshot    │
///   └──────────────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Snapshot  │  Vec<AccidentRecord>, Vec<BoundaryPolygon>, state/year index
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  state + year range → filtered subset
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
