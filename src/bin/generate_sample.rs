//! Writes a deterministic synthetic chronic disease indicator dataset.
//!
//! Usage: `generate_sample [--seed N] [OUTPUT]` where OUTPUT ends in `.csv`
//! (default) or `.parquet`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

const DEFAULT_OUTPUT: &str = "dataset/U.S._Chronic_Disease_Indicators.csv";

const HEADER: [&str; 8] = [
    "YearStart",
    "LocationDesc",
    "Topic",
    "Question",
    "DataValue",
    "DataValueUnit",
    "StratificationCategory1",
    "Stratification1",
];

/// (topic, question, unit, baseline value)
const TOPICS: [(&str, &str, &str, f64); 4] = [
    ("Asthma", "Current asthma prevalence among adults", "%", 9.5),
    ("Diabetes", "Diagnosed diabetes among adults", "%", 11.0),
    (
        "Cardiovascular Disease",
        "Mortality from heart failure",
        "cases per 100,000",
        85.0,
    ),
    ("Alcohol", "Binge drinking prevalence among adults", "%", 16.5),
];

const LOCATIONS: [&str; 6] = [
    "United States",
    "Alabama",
    "Alaska",
    "California",
    "New York",
    "Texas",
];

const STRATA: [(&str, &[&str]); 4] = [
    ("Overall", &["Overall"]),
    ("Sex", &["Male", "Female"]),
    ("Age Group", &["18-44", "45-64", "65+"]),
    (
        "Race/Ethnicity",
        &["Hispanic", "White, non-Hispanic", "Black, non-Hispanic"],
    ),
];

/// SplitMix64 stream. The generator only needs reproducible noise for a
/// given `--seed`, so identical seeds produce byte-identical files.
struct SampleRng(u64);

impl SampleRng {
    fn next_unit(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Normally distributed value around `mean` (Box-Muller).
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_unit().max(f64::MIN_POSITIVE);
        let u2 = self.next_unit();
        mean + std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

struct Row {
    year: i64,
    location: &'static str,
    topic: &'static str,
    question: &'static str,
    /// `None` is a suppressed value; `Some(Err)` a footnote marker instead of a number.
    value: Option<Result<f64, &'static str>>,
    unit: &'static str,
    category: &'static str,
    stratum: &'static str,
}

fn generate(rng: &mut SampleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for year in 2015..=2022 {
        for &(topic, question, unit, base) in &TOPICS {
            for (loc_idx, &location) in LOCATIONS.iter().enumerate() {
                for &(category, strata) in &STRATA {
                    for (s_idx, &stratum) in strata.iter().enumerate() {
                        let trend = (year - 2015) as f64 * base * 0.01;
                        let offset = (loc_idx as f64 - 2.5) * base * 0.03
                            + s_idx as f64 * base * 0.05;
                        let roll = rng.next_unit();
                        let value = if roll < 0.04 {
                            None
                        } else if roll < 0.05 {
                            Some(Err("~"))
                        } else {
                            let v = rng.normal(base + trend + offset, base * 0.08).max(0.0);
                            Some(Ok((v * 10.0).round() / 10.0))
                        };
                        rows.push(Row {
                            year,
                            location,
                            topic,
                            question,
                            value,
                            unit,
                            category,
                            stratum,
                        });
                    }
                }
            }
        }
    }
    rows
}

fn write_csv(rows: &[Row], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(HEADER)?;
    for r in rows {
        let value = match r.value {
            Some(Ok(v)) => v.to_string(),
            Some(Err(marker)) => marker.to_string(),
            None => String::new(),
        };
        writer.write_record([
            r.year.to_string().as_str(),
            r.location,
            r.topic,
            r.question,
            value.as_str(),
            r.unit,
            r.category,
            r.stratum,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &Path) -> Result<()> {
    let strings = |f: fn(&Row) -> &'static str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADER[0], DataType::Int64, false),
        Field::new(HEADER[1], DataType::Utf8, false),
        Field::new(HEADER[2], DataType::Utf8, false),
        Field::new(HEADER[3], DataType::Utf8, false),
        // Footnote markers have no numeric form and are written as null.
        Field::new(HEADER[4], DataType::Float64, true),
        Field::new(HEADER[5], DataType::Utf8, false),
        Field::new(HEADER[6], DataType::Utf8, false),
        Field::new(HEADER[7], DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(rows.iter().map(|r| r.year).collect::<Vec<_>>())),
            strings(|r| r.location),
            strings(|r| r.topic),
            strings(|r| r.question),
            Arc::new(Float64Array::from(
                rows.iter()
                    .map(|r| r.value.and_then(|v| v.ok()))
                    .collect::<Vec<_>>(),
            )),
            strings(|r| r.unit),
            strings(|r| r.category),
            strings(|r| r.stratum),
        ],
    )?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

#[derive(Debug, Parser)]
#[command(name = "generate_sample", about = "Write a synthetic chronic disease indicator dataset")]
struct Args {
    /// Output file; a `.parquet` extension selects Parquet, anything else CSV
    #[arg(default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    let Args { output, seed } = Args::parse();

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut rng = SampleRng(seed);
    let rows = generate(&mut rng);

    let is_parquet = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_parquet(&rows, &output)?;
    } else {
        write_csv(&rows, &output)?;
    }

    println!("Wrote {} records to {}", rows.len(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_default_output_and_seed() {
        let args = Args::try_parse_from(["generate_sample"]).unwrap();
        assert_eq!(args.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(args.seed, 42);

        let args =
            Args::try_parse_from(["generate_sample", "--seed", "7", "out/cdi.parquet"]).unwrap();
        assert_eq!(args.output, PathBuf::from("out/cdi.parquet"));
        assert_eq!(args.seed, 7);
    }

    #[test]
    fn same_seed_same_rows() {
        let a = generate(&mut SampleRng(3));
        let b = generate(&mut SampleRng(3));
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(&b).all(|(x, y)| x.value == y.value));
        assert!(a.iter().all(|r| r.value.map_or(true, |v| v.map_or(true, |x| x >= 0.0))));
    }

    #[test]
    fn csv_output_has_header_and_rows() {
        let rows = generate(&mut SampleRng(42));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        write_csv(&rows, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), rows.len() + 1);
        assert!(text.starts_with(&HEADER.join(",")));
    }
}
