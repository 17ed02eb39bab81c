use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use arrow::array::{
    Array, ArrayRef, AsArray, Int16Array, Int32Array, Int64Array, Int8Array, StringArray, UInt16Array,
    UInt32Array, UInt64Array, UInt8Array,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use geo::MultiPolygon;
use geojson::GeoJson;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{AccidentRecord, BoundaryPolygon, RawRecord, Snapshot};
use crate::config::DataConfig;
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load records and boundaries named by the config into one [`Snapshot`].
///
/// Called once at startup; the caller keeps the result for the whole
/// process lifetime. There is no reload path.
pub fn load_snapshot(config: &DataConfig) -> Result<Snapshot, DashboardError> {
    let records = load_records(&config.records)?;
    let boundaries = load_boundaries(&config.boundaries, &config.join_property)?;
    let snapshot = Snapshot::new(records, boundaries);
    if snapshot.is_empty() {
        log::warn!("No accident records in {}", config.records.display());
    }

    log::info!(
        "Loaded {} accident records for {} states ({:?}) and {} boundary polygons",
        snapshot.len(),
        snapshot.states.len(),
        snapshot.year_bounds,
        snapshot.boundaries.len()
    );
    Ok(snapshot)
}

/// Load the accident table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `State,Year,Month,Accidents,Injuries,Deaths`
/// * `.json`    – `[{ "State": "...", "Year": 2020, ... }, ...]`
/// * `.parquet` – one column per field, integer columns of any signed or unsigned width
pub fn load_records(path: &Path) -> Result<Vec<AccidentRecord>, DashboardError> {
    let raw = read_raw_records(path)
        .map_err(|e| DashboardError::unavailable("accident records", path, e))?;

    raw.into_iter()
        .enumerate()
        .map(|(row, rec)| rec.into_record(row))
        .collect()
}

/// Load state outlines from a `.geojson`/`.json` FeatureCollection or a `.shp`
/// shapefile. `name_property` is the attribute holding the state name.
pub fn load_boundaries(
    path: &Path,
    name_property: &str,
) -> Result<Vec<BoundaryPolygon>, DashboardError> {
    let result = match extension(path).as_str() {
        "geojson" | "json" => load_geojson(path, name_property),
        "shp" => load_shapefile(path, name_property),
        other => Err(anyhow!("Unsupported boundary file extension: .{other}")),
    };
    result.map_err(|e| DashboardError::unavailable("state boundaries", path, e))
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn read_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    match extension(path).as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV / JSON loaders (serde rows)
// ---------------------------------------------------------------------------

/// Column layout shared by the CSV and JSON sources. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct SourceRow {
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Year")]
    year: i64,
    #[serde(rename = "Month")]
    month: i64,
    #[serde(rename = "Accidents")]
    accidents: u64,
    #[serde(rename = "Injuries")]
    injuries: u64,
    #[serde(rename = "Deaths")]
    deaths: u64,
}

impl From<SourceRow> for RawRecord {
    fn from(row: SourceRow) -> Self {
        RawRecord {
            state: row.state,
            year: row.year,
            month: row.month,
            accidents: row.accidents,
            injuries: row.injuries,
            deaths: row.deaths,
        }
    }
}

fn load_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.deserialize::<SourceRow>().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(row.into());
    }
    Ok(rows)
}

fn load_json(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path).context("opening JSON file")?;
    let rows: Vec<SourceRow> =
        serde_json::from_reader(BufReader::new(file)).context("parsing JSON records")?;
    Ok(rows.into_iter().map(RawRecord::from).collect())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`), which differ in integer widths and
/// string encodings.
fn load_parquet(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;
    records_from_batches(reader)
}

/// Row numbers in error messages count from the start of the file, not the batch.
fn records_from_batches<I, E>(batches: I) -> Result<Vec<RawRecord>>
where
    I: IntoIterator<Item = std::result::Result<RecordBatch, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut rows = Vec::new();
    let mut offset = 0;

    for batch_result in batches {
        let batch = batch_result.context("reading parquet record batch")?;

        let state = column(&batch, "State")?;
        let year = column(&batch, "Year")?;
        let month = column(&batch, "Month")?;
        let accidents = column(&batch, "Accidents")?;
        let injuries = column(&batch, "Injuries")?;
        let deaths = column(&batch, "Deaths")?;

        for row in 0..batch.num_rows() {
            let n = offset + row;
            let rec = RawRecord {
                state: extract_string(state, row).with_context(|| format!("Row {n}: 'State'"))?,
                year: extract_i64(year, row).with_context(|| format!("Row {n}: 'Year'"))?,
                month: extract_i64(month, row).with_context(|| format!("Row {n}: 'Month'"))?,
                accidents: extract_count(accidents, row)
                    .with_context(|| format!("Row {n}: 'Accidents'"))?,
                injuries: extract_count(injuries, row)
                    .with_context(|| format!("Row {n}: 'Injuries'"))?,
                deaths: extract_count(deaths, row)
                    .with_context(|| format!("Row {n}: 'Deaths'"))?,
            };
            rows.push(rec);
        }
        offset += batch.num_rows();
    }

    Ok(rows)
}

// -- Arrow helpers --

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow!("Parquet file missing '{name}' column"))?;
    Ok(batch.column(idx))
}

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => bail!("expected a string column, got {other:?}"),
    }
}

fn extract_i64(col: &Arc<dyn Array>, row: usize) -> Result<i64> {
    if col.is_null(row) {
        bail!("null value");
    }
    let value = match col.data_type() {
        DataType::Int8 => downcast::<Int8Array>(col)?.value(row) as i64,
        DataType::Int16 => downcast::<Int16Array>(col)?.value(row) as i64,
        DataType::Int32 => downcast::<Int32Array>(col)?.value(row) as i64,
        DataType::Int64 => downcast::<Int64Array>(col)?.value(row),
        DataType::UInt8 => downcast::<UInt8Array>(col)?.value(row) as i64,
        DataType::UInt16 => downcast::<UInt16Array>(col)?.value(row) as i64,
        DataType::UInt32 => downcast::<UInt32Array>(col)?.value(row) as i64,
        DataType::UInt64 => i64::try_from(downcast::<UInt64Array>(col)?.value(row))
            .context("value does not fit in i64")?,
        other => bail!("expected an integer column, got {other:?}"),
    };
    Ok(value)
}

fn extract_count(col: &Arc<dyn Array>, row: usize) -> Result<u64> {
    let value = extract_i64(col, row)?;
    u64::try_from(value).map_err(|_| anyhow!("negative count {value}"))
}

fn downcast<T: 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array type {:?}", col.data_type()))
}

// ---------------------------------------------------------------------------
// Boundary loaders
// ---------------------------------------------------------------------------

fn load_geojson(path: &Path, name_property: &str) -> Result<Vec<BoundaryPolygon>> {
    let file = File::open(path).context("opening GeoJSON file")?;
    let geojson = GeoJson::from_reader(BufReader::new(file)).context("parsing GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => bail!("GeoJSON must be a FeatureCollection"),
    };

    let mut boundaries = Vec::new();

    for (i, feature) in collection.features.into_iter().enumerate() {
        let name = match feature
            .properties
            .as_ref()
            .and_then(|props| props.get(name_property))
        {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                log::debug!("Feature {i}: no '{name_property}' property, skipped");
                continue;
            }
        };

        let Some(geometry) = feature.geometry else {
            log::debug!("Feature {i} ({name}): no geometry, skipped");
            continue;
        };

        let geometry: geo::Geometry<f64> = geometry
            .value
            .try_into()
            .map_err(|e| anyhow!("Feature {i} ({name}): invalid geometry: {e:?}"))?;

        let geometry = match geometry {
            geo::Geometry::MultiPolygon(mp) => mp,
            geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
            _ => {
                log::debug!("Feature {i} ({name}): not a polygon, skipped");
                continue;
            }
        };

        boundaries.push(BoundaryPolygon { name, geometry });
    }

    Ok(boundaries)
}

fn load_shapefile(path: &Path, name_property: &str) -> Result<Vec<BoundaryPolygon>> {
    use shapefile::dbase::FieldValue;
    use shapefile::Shape;

    let mut reader = shapefile::Reader::from_path(path).context("opening shapefile")?;

    let mut boundaries = Vec::new();

    for (i, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result.with_context(|| format!("shape {i}"))?;

        let name = match record.get(name_property) {
            Some(FieldValue::Character(Some(s))) => s.trim().to_string(),
            Some(FieldValue::Numeric(Some(n))) => n.to_string(),
            _ => {
                log::debug!("Shape {i}: no '{name_property}' field, skipped");
                continue;
            }
        };

        let geometry: MultiPolygon<f64> = match shape {
            Shape::Polygon(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Shape {i} ({name}): invalid polygon: {e:?}"))?,
            Shape::PolygonM(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Shape {i} ({name}): invalid polygonM: {e:?}"))?,
            Shape::PolygonZ(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Shape {i} ({name}): invalid polygonZ: {e:?}"))?,
            _ => {
                log::debug!("Shape {i} ({name}): not a polygon, skipped");
                continue;
            }
        };

        boundaries.push(BoundaryPolygon { name, geometry });
    }

    Ok(boundaries)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use arrow::datatypes::{Field, Schema};
    use chrono::NaiveDate;
    use parquet::arrow::ArrowWriter;
    use shapefile::dbase::{FieldValue, Record, TableWriterBuilder};
    use shapefile::{Point, Polygon, PolygonRing};

    use super::*;

    const CSV: &str = "State,Year,Month,Accidents,Injuries,Deaths,Source\n\
                       MH,2020,1,10,20,2,police\n\
                       MH,2020,2,5,9,1,police\n\
                       DL,2020,1,3,4,0,police\n";

    const GEOJSON: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "properties": {"st_nm": "MH"},
         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
        {"type": "Feature", "properties": {"st_nm": "DL"},
         "geometry": {"type": "MultiPolygon", "coordinates": [[[[2,2],[3,2],[3,3],[2,2]]]]}},
        {"type": "Feature", "properties": {"other": "x"},
         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}},
        {"type": "Feature", "properties": {"st_nm": "Pin"},
         "geometry": {"type": "Point", "coordinates": [5,5]}}
      ]
    }"#;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn write_parquet(path: &Path, batch: &RecordBatch) {
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
    }

    fn square(x: f64, y: f64) -> PolygonRing<Point> {
        PolygonRing::Outer(vec![
            Point::new(x, y),
            Point::new(x, y + 1.0),
            Point::new(x + 1.0, y + 1.0),
            Point::new(x + 1.0, y),
            Point::new(x, y),
        ])
    }

    fn named(name: Option<&str>) -> Record {
        let mut record = Record::default();
        record.insert(
            "st_nm".to_string(),
            FieldValue::Character(name.map(str::to_string)),
        );
        record
    }

    #[test]
    fn loads_csv_and_derives_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "acc.csv", CSV);

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].state, "MH");
        assert_eq!(records[0].accidents, 10);
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2020, 2, 1).unwrap());
        assert_eq!(records[2].deaths, 0);
    }

    #[test]
    fn missing_column_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "acc.csv", "State,Year,Month,Accidents\nMH,2020,1,10\n");

        let err = load_records(&path).unwrap_err();
        assert!(matches!(err, DashboardError::DataUnavailable { .. }));
    }

    #[test]
    fn negative_count_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "acc.csv",
            "State,Year,Month,Accidents,Injuries,Deaths\nMH,2020,1,-1,0,0\n",
        );
        assert!(matches!(
            load_records(&path),
            Err(DashboardError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn bad_month_is_invalid_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "acc.csv",
            "State,Year,Month,Accidents,Injuries,Deaths\nMH,2020,1,1,0,0\nMH,2020,13,1,0,0\n",
        );

        let err = load_records(&path).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::InvalidDate { row: 1, year: 2020, month: 13 }
        ));
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_records(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DashboardError::DataUnavailable { .. }));

        let err = load_boundaries(&dir.path().join("absent.geojson"), "st_nm").unwrap_err();
        assert!(matches!(err, DashboardError::DataUnavailable { .. }));
    }

    #[test]
    fn unsupported_extension_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "acc.xlsx", "");
        assert!(matches!(
            load_records(&path),
            Err(DashboardError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn loads_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "acc.json",
            r#"[{"State": "KA", "Year": 2018, "Month": 6, "Accidents": 7, "Injuries": 3, "Deaths": 1}]"#,
        );

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, "KA");
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2018, 6, 1).unwrap());
    }

    #[test]
    fn loads_parquet_records_with_mixed_int_widths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acc.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("State", DataType::Utf8, false),
            Field::new("Year", DataType::Int64, false),
            Field::new("Month", DataType::Int32, false),
            Field::new("Accidents", DataType::Int64, false),
            Field::new("Injuries", DataType::Int64, false),
            Field::new("Deaths", DataType::Int32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["MH", "DL"])),
                Arc::new(Int64Array::from(vec![2020, 2021])),
                Arc::new(Int32Array::from(vec![1, 12])),
                Arc::new(Int64Array::from(vec![10, 3])),
                Arc::new(Int64Array::from(vec![20, 4])),
                Arc::new(Int32Array::from(vec![2, 0])),
            ],
        )
        .unwrap();
        write_parquet(&path, &batch);

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].state, "DL");
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2021, 12, 1).unwrap());
        assert_eq!(records[0].deaths, 2);
    }

    #[test]
    fn loads_parquet_records_with_narrow_int_widths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acc.parquet");

        // Polars writes small integers this narrow.
        let schema = Arc::new(Schema::new(vec![
            Field::new("State", DataType::Utf8, false),
            Field::new("Year", DataType::UInt16, false),
            Field::new("Month", DataType::UInt8, false),
            Field::new("Accidents", DataType::UInt16, false),
            Field::new("Injuries", DataType::Int16, false),
            Field::new("Deaths", DataType::Int8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["KA", "TN"])),
                Arc::new(UInt16Array::from(vec![2019, 2022])),
                Arc::new(UInt8Array::from(vec![3, 11])),
                Arc::new(UInt16Array::from(vec![40_000, 7])),
                Arc::new(Int16Array::from(vec![12, 5])),
                Arc::new(Int8Array::from(vec![4, 1])),
            ],
        )
        .unwrap();
        write_parquet(&path, &batch);

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2019, 3, 1).unwrap());
        assert_eq!(records[0].accidents, 40_000);
        assert_eq!(records[0].deaths, 4);
        assert_eq!(records[1].month, 11);
        assert_eq!(records[1].injuries, 5);
    }

    #[test]
    fn batch_errors_name_the_row_in_the_file() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("State", DataType::Utf8, false),
            Field::new("Year", DataType::Int32, false),
            Field::new("Month", DataType::Int32, false),
            Field::new("Accidents", DataType::Int32, false),
            Field::new("Injuries", DataType::Int32, false),
            Field::new("Deaths", DataType::Int32, false),
        ]));
        let batch = |months: Vec<i32>, accidents: Vec<i32>| {
            let n = months.len();
            RecordBatch::try_new(
                schema.clone(),
                vec![
                    Arc::new(StringArray::from(vec!["MH"; n])),
                    Arc::new(Int32Array::from(vec![2020; n])),
                    Arc::new(Int32Array::from(months)),
                    Arc::new(Int32Array::from(accidents)),
                    Arc::new(Int32Array::from(vec![0; n])),
                    Arc::new(Int32Array::from(vec![0; n])),
                ],
            )
        };

        let batches = vec![
            batch(vec![1, 2, 3], vec![1, 1, 1]),
            batch(vec![4, 5], vec![1, -1]),
        ];
        let err = records_from_batches(batches).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Row 4: 'Accidents'"), "{message}");

        let batches = vec![batch(vec![1, 2], vec![1, 1]), batch(vec![3], vec![2])];
        assert_eq!(records_from_batches(batches).unwrap().len(), 3);
    }

    #[test]
    fn loads_geojson_polygons_and_skips_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "states.geojson", GEOJSON);

        let boundaries = load_boundaries(&path, "st_nm").unwrap();
        let names: Vec<&str> = boundaries.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["MH", "DL"]);
        assert_eq!(boundaries[0].geometry.0.len(), 1);
    }

    #[test]
    fn loads_shapefile_polygons_by_name_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.shp");

        {
            let table = TableWriterBuilder::new()
                .add_character_field("st_nm".try_into().unwrap(), 50);
            let mut writer = shapefile::Writer::from_path(&path, table).unwrap();
            writer
                .write_shape_and_record(&Polygon::new(square(0.0, 0.0)), &named(Some("Kerala")))
                .unwrap();
            writer
                .write_shape_and_record(
                    &Polygon::with_rings(vec![square(2.0, 2.0), square(5.0, 5.0)]),
                    &named(Some("Goa")),
                )
                .unwrap();
            writer
                .write_shape_and_record(&Polygon::new(square(8.0, 8.0)), &named(None))
                .unwrap();
        }

        let boundaries = load_boundaries(&path, "st_nm").unwrap();
        let names: Vec<&str> = boundaries.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Kerala", "Goa"]);
        assert_eq!(boundaries[0].geometry.0.len(), 1);
        assert_eq!(boundaries[1].geometry.0.len(), 2);
    }

    #[test]
    fn corrupt_geojson_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "states.geojson", "{ not json");
        assert!(matches!(
            load_boundaries(&path, "st_nm"),
            Err(DashboardError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn snapshot_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = DataConfig {
            records: write(&dir, "acc.csv", CSV),
            boundaries: write(&dir, "states.geojson", GEOJSON),
            join_property: "st_nm".to_string(),
        };

        let snap = load_snapshot(&config).unwrap();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.states, vec!["MH", "DL"]);
        assert_eq!(snap.year_bounds, Some((2020, 2020)));
        assert_eq!(snap.boundaries.len(), 2);
    }
}
