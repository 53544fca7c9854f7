use std::collections::BTreeSet;

use super::model::{columns, CellValue, Dataset, Record};

// ---------------------------------------------------------------------------
// Filter predicate: topic + sidebar selections
// ---------------------------------------------------------------------------

/// User selections feeding the pipeline.
///
/// An absent or empty topic and an empty year/location set all mean
/// "no restriction" for that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub topic: Option<String>,
    pub years: BTreeSet<i64>,
    pub locations: BTreeSet<String>,
}

impl FilterState {
    pub fn for_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Self::default()
        }
    }

    /// The topic, if one is actually selected.
    pub fn active_topic(&self) -> Option<&str> {
        self.topic.as_deref().filter(|t| !t.is_empty())
    }
}

// ---------------------------------------------------------------------------
// WorkingSubset – rows of the dataset selected by the active filters
// ---------------------------------------------------------------------------

/// A view over the dataset: row indices in dataset order. Never copies or
/// mutates the underlying records.
#[derive(Debug, Clone)]
pub struct WorkingSubset<'a> {
    dataset: &'a Dataset,
    rows: Vec<usize>,
}

impl<'a> WorkingSubset<'a> {
    /// Every row of the dataset.
    pub fn all(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            rows: (0..dataset.len()).collect(),
        }
    }

    /// No rows at all.
    pub fn empty(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            rows: Vec::new(),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Indices into `dataset().records`.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let dataset = self.dataset;
        self.rows.iter().map(move |&i| &dataset.records[i])
    }

    /// Values of one column over the subset. `None` when the column is absent.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &'a CellValue> + '_> {
        let col = self.dataset.column_index(name)?;
        let dataset = self.dataset;
        Some(self.rows.iter().map(move |&i| dataset.cell(i, col)))
    }

    /// Keep only rows whose value in `name` satisfies `pred`.
    /// An absent column leaves the subset untouched.
    pub fn retain_by(self, name: &str, pred: impl Fn(&CellValue) -> bool) -> Self {
        let Some(col) = self.dataset.column_index(name) else {
            return self;
        };
        let dataset = self.dataset;
        let rows = self
            .rows
            .into_iter()
            .filter(|&i| pred(dataset.cell(i, col)))
            .collect();
        Self { dataset, rows }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Apply topic, year and location predicates (conjunctive) to the dataset.
pub fn apply<'a>(dataset: &'a Dataset, filters: &FilterState) -> WorkingSubset<'a> {
    let by_topic = filter_topic(dataset, filters.active_topic());
    filter_sidebar(by_topic, &filters.years, &filters.locations)
}

/// First stage: topic equality. `None` keeps every row.
pub fn filter_topic<'a>(dataset: &'a Dataset, topic: Option<&str>) -> WorkingSubset<'a> {
    let subset = WorkingSubset::all(dataset);
    match topic {
        Some(topic) => subset.retain_by(columns::TOPIC, |cell| text_eq(cell, topic)),
        None => subset,
    }
}

/// Second stage: year-set and location-set membership. Empty sets pass everything.
pub fn filter_sidebar<'a>(
    subset: WorkingSubset<'a>,
    years: &BTreeSet<i64>,
    locations: &BTreeSet<String>,
) -> WorkingSubset<'a> {
    let mut subset = subset;
    if !years.is_empty() {
        subset = subset.retain_by(columns::YEAR_START, |cell| {
            cell.as_i64().is_some_and(|y| years.contains(&y))
        });
    }
    if !locations.is_empty() {
        subset = subset.retain_by(columns::LOCATION_DESC, |cell| {
            locations.iter().any(|loc| text_eq(cell, loc))
        });
    }
    subset
}

fn text_eq(cell: &CellValue, expected: &str) -> bool {
    match cell {
        CellValue::String(s) => s == expected,
        CellValue::Null => false,
        other => other.to_field() == expected,
    }
}

// ---------------------------------------------------------------------------
// Selector options and sidebar defaults
// ---------------------------------------------------------------------------

/// Distinct topics in order of first appearance.
pub fn topic_options(dataset: &Dataset) -> Vec<String> {
    let Some(col) = dataset.column_index(columns::TOPIC) else {
        return Vec::new();
    };
    let mut seen = BTreeSet::new();
    let mut topics = Vec::new();
    for record in &dataset.records {
        let cell = &record.cells[col];
        if cell.is_null() {
            continue;
        }
        let topic = cell.to_field();
        if seen.insert(topic.clone()) {
            topics.push(topic);
        }
    }
    topics
}

/// Sorted distinct years of the full dataset.
pub fn year_options(dataset: &Dataset) -> Vec<i64> {
    dataset
        .unique_values
        .get(columns::YEAR_START)
        .map(|vals| {
            vals.iter()
                .filter_map(CellValue::as_i64)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
        .unwrap_or_default()
}

/// Sorted distinct locations of the full dataset.
pub fn location_options(dataset: &Dataset) -> Vec<String> {
    dataset
        .unique_values
        .get(columns::LOCATION_DESC)
        .map(|vals| {
            vals.iter()
                .filter(|v| !v.is_null())
                .map(CellValue::to_field)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
        .unwrap_or_default()
}

/// The `n` most recent distinct years present in the dataset.
pub fn default_years(dataset: &Dataset, n: usize) -> BTreeSet<i64> {
    let years = year_options(dataset);
    let skip = years.len().saturating_sub(n);
    years.into_iter().skip(skip).collect()
}

/// The configured default location, taken literally. When the dataset has no
/// such location the subset is simply empty.
pub fn default_locations(dataset: &Dataset, name: &str) -> BTreeSet<String> {
    if !name.is_empty() && !location_options(dataset).iter().any(|l| l == name) {
        log::warn!("Default location '{name}' not found in dataset");
    }
    std::iter::once(name.to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

/// Sidebar defaults for a freshly loaded dataset.
pub fn default_filter_state(dataset: &Dataset, recent_years: usize, location: &str) -> FilterState {
    FilterState {
        topic: topic_options(dataset).into_iter().next(),
        years: default_years(dataset, recent_years),
        locations: default_locations(dataset, location),
    }
}
