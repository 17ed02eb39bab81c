use std::sync::Arc;

use arrow::array::{Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// (name, monthly base accidents, lon min, lat min, lon max, lat max)
const STATES: [(&str, f64, f64, f64, f64, f64); 10] = [
    ("Maharashtra", 2700.0, 73.0, 16.0, 80.5, 21.5),
    ("Tamil Nadu", 4200.0, 76.5, 8.5, 80.0, 13.5),
    ("Madhya Pradesh", 4000.0, 74.5, 21.5, 82.5, 26.5),
    ("Karnataka", 3400.0, 74.5, 12.0, 78.5, 18.0),
    ("Uttar Pradesh", 3100.0, 78.0, 24.0, 84.5, 30.0),
    ("Kerala", 3300.0, 75.0, 8.3, 77.0, 12.5),
    ("Rajasthan", 1800.0, 69.5, 23.5, 78.0, 30.0),
    ("Gujarat", 1300.0, 68.5, 20.5, 74.5, 24.5),
    ("Delhi", 450.0, 76.8, 28.4, 77.3, 28.9),
    ("West Bengal", 1100.0, 86.0, 21.5, 89.0, 27.0),
];

const YEARS: std::ops::RangeInclusive<i32> = 2015..=2023;

#[derive(Serialize)]
struct Row {
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Month")]
    month: i32,
    #[serde(rename = "Accidents")]
    accidents: i64,
    #[serde(rename = "Injuries")]
    injuries: i64,
    #[serde(rename = "Deaths")]
    deaths: i64,
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for &(name, base, ..) in &STATES {
        for year in YEARS {
            // Slow decline over the years, sharp dip in 2020.
            let yearly = 1.0 - 0.015 * (year - YEARS.start()) as f64
                - if year == 2020 { 0.2 } else { 0.0 };
            for month in 1..=12 {
                let seasonal = 1.0 + 0.12 * (2.0 * std::f64::consts::PI * (month - 1) as f64 / 12.0).cos();
                let accidents = (base * yearly * seasonal + rng.gauss(0.0, base * 0.04)).max(0.0);
                let injuries = accidents * (0.9 + 0.2 * rng.next_f64());
                let deaths = accidents * (0.25 + 0.1 * rng.next_f64());

                rows.push(Row {
                    state: name.to_string(),
                    year,
                    month,
                    accidents: accidents.round() as i64,
                    injuries: injuries.round() as i64,
                    deaths: deaths.round() as i64,
                });
            }
        }
    }
    rows
}

fn write_csv(path: &str, rows: &[Row]) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create CSV file");
    for row in rows {
        writer.serialize(row).expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV");
}

fn write_parquet(path: &str, rows: &[Row]) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("State", DataType::Utf8, false),
        Field::new("Year", DataType::Int32, false),
        Field::new("Month", DataType::Int32, false),
        Field::new("Accidents", DataType::Int64, false),
        Field::new("Injuries", DataType::Int64, false),
        Field::new("Deaths", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.state.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Int32Array::from(rows.iter().map(|r| r.year).collect::<Vec<_>>())),
            Arc::new(Int32Array::from(rows.iter().map(|r| r.month).collect::<Vec<_>>())),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.accidents).collect::<Vec<_>>())),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.injuries).collect::<Vec<_>>())),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.deaths).collect::<Vec<_>>())),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

/// Boxes stand in for real outlines; enough to exercise the join and the map.
fn write_boundaries(path: &str) {
    let features = STATES
        .iter()
        .map(|&(name, _, x0, y0, x1, y1)| {
            let ring = vec![vec![x0, y0], vec![x1, y0], vec![x1, y1], vec![x0, y1], vec![x0, y0]];
            let mut properties = serde_json::Map::new();
            properties.insert("st_nm".to_string(), serde_json::Value::from(name));
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    std::fs::write(path, collection.to_string()).expect("Failed to write GeoJSON");
}

fn main() {
    let mut rng = SimpleRng::new(42);
    std::fs::create_dir_all("data").expect("Failed to create data directory");

    let rows = generate_rows(&mut rng);

    write_csv("data/accidents_2015_2023.csv", &rows);
    write_parquet("data/accidents_2015_2023.parquet", &rows);
    write_boundaries("data/india_states.geojson");

    println!(
        "Wrote {} rows for {} states ({}–{}) and {} boundaries to data/",
        rows.len(),
        STATES.len(),
        YEARS.start(),
        YEARS.end(),
        STATES.len()
    );
}
