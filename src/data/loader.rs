use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{CellValue, Dataset, Record};

/// Errors raised while reading the indicator dataset. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("malformed dataset: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the indicator dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row + one record per line (the published format)
/// * `.json`    – `[{ "YearStart": 2019, "Topic": "Asthma", ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let started = Instant::now();
    let dataset = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
                path: path.display().to_string(),
                source,
            })?;
            read_csv(file)?
        }
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} records with {} columns from {} in {:?}",
        dataset.len(),
        dataset.columns.len(),
        path.display(),
        started.elapsed()
    );
    for missing in dataset.missing_core_columns() {
        log::warn!("Column '{missing}' not present; dependent views are disabled");
    }

    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse a CSV stream (UTF-8, header row). Cell types are inferred per field.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let cells = row
            .iter()
            .take(columns.len())
            .map(CellValue::parse)
            .collect();
        records.push(Record { cells });
    }

    Ok(Dataset::from_records(columns, records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `to_json(orient='records')` layout.
/// Columns are the union of object keys in order of first appearance.
fn load_json(path: &Path) -> Result<Dataset, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<Dataset, LoadError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let rows = root
        .as_array()
        .ok_or_else(|| LoadError::Malformed("expected top-level JSON array".into()))?;

    let mut columns: Vec<String> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .ok_or_else(|| LoadError::Malformed(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let records = rows
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| Record {
            cells: columns
                .iter()
                .map(|col| obj.get(col).map_or(CellValue::Null, json_to_cell))
                .collect(),
        })
        .collect();

    Ok(Dataset::from_records(columns, records))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        // Exports that quote every field still carry numeric years and values.
        JsonValue::String(s) => CellValue::parse(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::from_f64(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns (strings, ints, floats, bools).
/// Works with files written by both Pandas and Polars.
fn load_parquet(path: &Path) -> Result<Dataset, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect();
            records.push(Record { cells });
        }
    }

    Ok(Dataset::from_records(columns, records))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map_or(CellValue::Null, |a| CellValue::parse(a.value(row))),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map_or(CellValue::Null, |a| CellValue::parse(a.value(row))),
        DataType::Int16 => any
            .downcast_ref::<Int16Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(CellValue::Null, |a| CellValue::from_f64(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Null, |a| CellValue::from_f64(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Null, |a| CellValue::Bool(a.value(row))),
        other => {
            log::debug!("Unsupported parquet column type {other:?}; reading as null");
            CellValue::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::data::aggregate;
    use crate::data::export::to_csv_bytes;
    use crate::data::filter::{apply, default_years, FilterState};
    use crate::data::model::columns;
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    const SAMPLE: &str = "\
YearStart,LocationDesc,Topic,Question,DataValue,DataValueUnit,StratificationCategory1,Stratification1
2019,United States,Asthma,Current asthma,10,%,Sex,Male
2020,United States,Asthma,Current asthma,~,%,Sex,Female
2020,\"Washington, DC\",Diabetes,Diabetes prevalence,,%,Overall,Overall
";

    #[test]
    fn csv_reads_rows_and_types() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.columns.len(), 8);

        let year = ds.column_index(columns::YEAR_START).unwrap();
        let value = ds.column_index(columns::DATA_VALUE).unwrap();
        let loc = ds.column_index(columns::LOCATION_DESC).unwrap();
        assert_eq!(ds.cell(0, year), &CellValue::Integer(2019));
        assert_eq!(ds.cell(0, value).as_f64(), Some(10.0));
        // Non-numeric and empty values are not numbers.
        assert_eq!(ds.cell(1, value).as_f64(), None);
        assert!(ds.cell(2, value).is_null());
        assert_eq!(ds.cell(2, loc).as_str(), Some("Washington, DC"));
    }

    #[test]
    fn csv_tolerates_ragged_rows() {
        let ds = read_csv("Topic,DataValue\nAsthma\nDiabetes,4,extra\n".as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.records[0].cells[1].is_null());
        assert_eq!(ds.records[1].cells.len(), 2);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("data.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_file(Path::new("/nonexistent/cdi.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn json_records_collect_union_of_keys() {
        let ds = parse_json(
            r#"[{"Topic": "Asthma", "DataValue": 1.5},
                {"Topic": "Diabetes", "YearStart": 2020}]"#,
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns.len(), 3);
        assert!(ds.has_column(columns::TOPIC) && ds.has_column(columns::DATA_VALUE));
        let year = ds.column_index(columns::YEAR_START).unwrap();
        assert!(ds.cell(0, year).is_null());
        assert_eq!(ds.cell(1, year).as_i64(), Some(2020));
    }

    #[test]
    fn json_must_be_an_array() {
        assert!(matches!(
            parse_json(r#"{"Topic": "Asthma"}"#),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn parquet_flat_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("YearStart", DataType::Int64, false),
            Field::new("Topic", DataType::Utf8, false),
            Field::new("DataValue", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![2019, 2020])),
                Arc::new(StringArray::from(vec!["Asthma", "Asthma"])),
                Arc::new(Float64Array::from(vec![Some(10.0), None])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cdi.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns, vec!["YearStart", "Topic", "DataValue"]);
        assert_eq!(ds.records[0].cells[2], CellValue::Float(10.0));
        assert!(ds.records[1].cells[2].is_null());
    }

    #[test]
    fn json_text_fields_are_typed() {
        let ds = parse_json(
            r#"[{"YearStart": "2019", "Topic": "Asthma", "DataValue": "10"},
                {"YearStart": "2020", "Topic": "Asthma", "DataValue": "20"},
                {"YearStart": "2020", "Topic": "Asthma", "DataValue": "~"},
                {"YearStart": "2020", "Topic": "Diabetes", "DataValue": ""}]"#,
        )
        .unwrap();
        let year = ds.column_index(columns::YEAR_START).unwrap();
        let value = ds.column_index(columns::DATA_VALUE).unwrap();
        assert_eq!(ds.cell(0, year), &CellValue::Integer(2019));
        assert_eq!(ds.cell(1, value).as_f64(), Some(20.0));
        assert_eq!(ds.cell(2, value), &CellValue::String("~".into()));
        assert!(ds.cell(3, value).is_null());

        let subset = apply(&ds, &FilterState::for_topic("Asthma"));
        assert_eq!(aggregate::mean_value(&subset), Some(15.0));
        assert_eq!(aggregate::count_by_year(&subset), vec![(2019, 1), (2020, 2)]);
        assert_eq!(default_years(&ds, 3), BTreeSet::from([2019, 2020]));

        // What was loaded is what an export reads back.
        let reparsed = read_csv(to_csv_bytes(&subset).unwrap().as_slice()).unwrap();
        for (exported, loaded) in reparsed.records.iter().zip(subset.records()) {
            assert_eq!(exported, loaded);
        }
    }

    #[test]
    fn parquet_text_columns_are_typed() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("YearStart", DataType::Utf8, false),
            Field::new("Topic", DataType::Utf8, false),
            Field::new("DataValue", DataType::LargeUtf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["2019", "2020"])),
                Arc::new(StringArray::from(vec!["Asthma", "Asthma"])),
                Arc::new(LargeStringArray::from(vec![Some("12.5"), Some("~")])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cdi_text.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.records[0].cells[0], CellValue::Integer(2019));
        assert_eq!(ds.records[0].cells[2], CellValue::Float(12.5));
        assert_eq!(ds.records[1].cells[2], CellValue::String("~".into()));
        assert_eq!(default_years(&ds, 3), BTreeSet::from([2019, 2020]));
    }
}
