use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Column names of the chronic disease indicator schema used by the dashboard.
pub mod columns {
    pub const YEAR_START: &str = "YearStart";
    pub const LOCATION_DESC: &str = "LocationDesc";
    pub const TOPIC: &str = "Topic";
    pub const QUESTION: &str = "Question";
    pub const DATA_VALUE: &str = "DataValue";
    pub const DATA_VALUE_UNIT: &str = "DataValueUnit";
    pub const STRATIFICATION_CATEGORY: &str = "StratificationCategory1";
    pub const STRATIFICATION: &str = "Stratification1";

    /// Columns the pipeline reads. Missing ones degrade features, never loading.
    pub const CORE: [&str; 8] = [
        YEAR_START,
        LOCATION_DESC,
        TOPIC,
        QUESTION,
        DATA_VALUE,
        DATA_VALUE_UNIT,
        STRATIFICATION_CATEGORY,
        STRATIFICATION,
    ];
}

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, inferred from the source text.
/// Using `BTreeMap` / `BTreeSet` downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    /// Always finite; `NaN`/`inf` text is kept as `String`.
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Sort rank across variants: nulls first, text last.
    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Integer(_) => 2,
            CellValue::Float(_) => 3,
            CellValue::String(_) => 4,
        }
    }
}

// `Float` never holds NaN, so `total_cmp` gives a lawful total order.
impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
            (CellValue::Float(a), CellValue::Float(b)) => a.total_cmp(b),
            (CellValue::String(a), CellValue::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Display form used by tables and selectors. Export uses [`CellValue::to_field`].
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.2}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, ""),
        }
    }
}

impl CellValue {
    /// Infer a typed cell from raw text (CSV field).
    pub fn parse(s: &str) -> CellValue {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() {
                return CellValue::Float(f);
            }
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }

    /// Wrap an `f64`, keeping non-finite values out of the `Float` variant.
    pub fn from_f64(v: f64) -> CellValue {
        if v.is_finite() {
            CellValue::Float(v)
        } else {
            CellValue::Null
        }
    }

    /// Numeric view of the cell. Text, booleans and nulls are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integer view, accepting whole floats (`2019.0`) as Parquet/JSON often store them.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text written to CSV. Re-parsing it with [`CellValue::parse`] yields `self`.
    pub fn to_field(&self) -> String {
        match self {
            CellValue::String(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            // `{}` on f64 is the shortest representation that round-trips.
            CellValue::Float(v) => {
                let text = v.to_string();
                if text.contains(['.', 'e', 'E']) {
                    text
                } else {
                    // Keep whole floats as floats: "3" would come back as Integer.
                    format!("{text}.0")
                }
            }
            CellValue::Bool(b) => b.to_string(),
            CellValue::Null => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the dataset
// ---------------------------------------------------------------------------

/// One row; `cells[i]` belongs to `Dataset::columns[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cells: Vec<CellValue>,
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed column indices. Immutable after load.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All rows, in file order.
    pub records: Vec<Record>,
    /// Column names in source order.
    pub columns: Vec<String>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<CellValue>>,
    index: HashMap<String, usize>,
}

impl Dataset {
    /// Build column indices from loaded rows. Short rows are padded with `Null`.
    pub fn from_records(columns: Vec<String>, mut records: Vec<Record>) -> Self {
        let width = columns.len();
        let index: HashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        let mut unique_values: BTreeMap<String, BTreeSet<CellValue>> = columns
            .iter()
            .map(|name| (name.clone(), BTreeSet::new()))
            .collect();

        for record in &mut records {
            record.cells.resize(width, CellValue::Null);
            for (name, value) in columns.iter().zip(&record.cells) {
                if let Some(set) = unique_values.get_mut(name) {
                    set.insert(value.clone());
                }
            }
        }

        Dataset {
            records,
            columns,
            unique_values,
            index,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a column, `None` when the schema lacks it.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Cell of `row` in column `col` (a position from [`Dataset::column_index`]).
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.records
            .get(row)
            .and_then(|r| r.cells.get(col))
            .unwrap_or(&CellValue::Null)
    }

    /// Core columns that are absent from this dataset.
    pub fn missing_core_columns(&self) -> Vec<&'static str> {
        columns::CORE
            .iter()
            .copied()
            .filter(|name| !self.has_column(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_infers_types() {
        assert_eq!(CellValue::parse(""), CellValue::Null);
        assert_eq!(CellValue::parse("2019"), CellValue::Integer(2019));
        assert_eq!(CellValue::parse("12.5"), CellValue::Float(12.5));
        assert_eq!(CellValue::parse("true"), CellValue::Bool(true));
        assert_eq!(
            CellValue::parse("Asthma"),
            CellValue::String("Asthma".into())
        );
    }

    #[test]
    fn non_finite_text_stays_text() {
        assert_eq!(CellValue::parse("NaN"), CellValue::String("NaN".into()));
        assert_eq!(CellValue::parse("inf"), CellValue::String("inf".into()));
        assert_eq!(CellValue::parse("NaN").as_f64(), None);
    }

    #[test]
    fn to_field_reparses_to_same_value() {
        for v in [
            CellValue::Float(3.0),
            CellValue::Float(0.1),
            CellValue::Float(1e-12),
            CellValue::Integer(-7),
            CellValue::String("Age Group".into()),
            CellValue::Bool(false),
            CellValue::Null,
        ] {
            assert_eq!(CellValue::parse(&v.to_field()), v);
        }
    }

    #[test]
    fn short_rows_are_padded() {
        let ds = Dataset::from_records(
            vec!["a".into(), "b".into()],
            vec![Record {
                cells: vec![CellValue::Integer(1)],
            }],
        );
        assert_eq!(ds.records[0].cells.len(), 2);
        let b = ds.column_index("b").unwrap();
        assert!(ds.cell(0, b).is_null());
        assert!(ds.unique_values["b"].contains(&CellValue::Null));
    }

    #[test]
    fn reports_missing_core_columns() {
        let ds = Dataset::from_records(vec![columns::TOPIC.into()], Vec::new());
        let missing = ds.missing_core_columns();
        assert!(!missing.contains(&columns::TOPIC));
        assert!(missing.contains(&columns::DATA_VALUE));
        assert_eq!(missing.len(), columns::CORE.len() - 1);
    }

    #[test]
    fn cells_sort_nulls_first_text_last() {
        let mut cells = vec![
            CellValue::String("Alabama".into()),
            CellValue::Float(2.5),
            CellValue::Null,
            CellValue::Integer(2020),
            CellValue::Integer(2019),
        ];
        cells.sort();
        assert_eq!(
            cells,
            vec![
                CellValue::Null,
                CellValue::Integer(2019),
                CellValue::Integer(2020),
                CellValue::Float(2.5),
                CellValue::String("Alabama".into()),
            ]
        );
    }
}
