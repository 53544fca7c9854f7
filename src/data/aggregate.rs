//! Reducers over a [`WorkingSubset`].
//!
//! None of these fail. Empty input, all-null `DataValue` columns and absent
//! columns produce neutral results: `0`, `None` or an empty table. `None` is the
//! sentinel for "no numeric value" in every `Option<f64>` below.

use std::collections::{BTreeMap, BTreeSet};

use super::filter::WorkingSubset;
use super::model::{columns, CellValue};

/// Stratification categories shown on the heatmap. Any other category
/// (`Overall`, `Gender`, ...) is left out.
pub const STRATIFICATION_CATEGORIES: [&str; 3] = ["Sex", "Age Group", "Race/Ethnicity"];

/// Mean `DataValue` of one `(category, stratum)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct StratificationMean {
    pub category: String,
    pub stratum: String,
    pub mean: f64,
}

/// One equal-width histogram bin, `[lower, upper)` except the last which is closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DescriptiveStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
}

/// Headline metrics with deltas against the rows before the latest year.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kpis {
    pub total_records: usize,
    pub records_delta: i64,
    pub average_value: Option<f64>,
    pub average_delta: f64,
    pub distinct_locations: usize,
}

/// Data for the first chart slot.
#[derive(Debug, Clone, PartialEq)]
pub enum FirstChart {
    Heatmap(Vec<StratificationMean>),
    /// Fallback when the topic has no stratified breakdown.
    YearCounts(Vec<(i64, usize)>),
    /// Stratification columns are missing from the dataset.
    Unavailable,
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Row count, null `DataValue` rows included.
pub fn count(subset: &WorkingSubset<'_>) -> usize {
    subset.len()
}

/// Non-null numeric `DataValue`s of the subset, in row order.
pub fn values(subset: &WorkingSubset<'_>) -> Vec<f64> {
    subset
        .column(columns::DATA_VALUE)
        .map(|cells| cells.filter_map(CellValue::as_f64).collect())
        .unwrap_or_default()
}

pub fn mean_value(subset: &WorkingSubset<'_>) -> Option<f64> {
    mean(&values(subset))
}

pub fn median_value(subset: &WorkingSubset<'_>) -> Option<f64> {
    median(values(subset))
}

/// Sample standard deviation (`n - 1` denominator).
pub fn stddev_value(subset: &WorkingSubset<'_>) -> Option<f64> {
    std_dev(&values(subset))
}

pub fn descriptive_stats(subset: &WorkingSubset<'_>) -> DescriptiveStats {
    DescriptiveStats {
        mean: mean_value(subset),
        median: median_value(subset),
        std_dev: stddev_value(subset),
    }
}

/// Number of distinct non-null `LocationDesc` values.
pub fn distinct_locations(subset: &WorkingSubset<'_>) -> usize {
    subset
        .column(columns::LOCATION_DESC)
        .map(|cells| {
            cells
                .filter(|c| !c.is_null())
                .collect::<BTreeSet<_>>()
                .len()
        })
        .unwrap_or(0)
}

fn mean(vals: &[f64]) -> Option<f64> {
    if vals.is_empty() {
        return None;
    }
    Some(vals.iter().sum::<f64>() / vals.len() as f64)
}

fn median(mut vals: Vec<f64>) -> Option<f64> {
    if vals.is_empty() {
        return None;
    }
    vals.sort_by(f64::total_cmp);
    let n = vals.len();
    if n % 2 == 1 {
        Some(vals[n / 2])
    } else {
        Some((vals[n / 2 - 1] + vals[n / 2]) / 2.0)
    }
}

fn std_dev(vals: &[f64]) -> Option<f64> {
    if vals.len() < 2 {
        return None;
    }
    let m = mean(vals)?;
    let var = vals.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (vals.len() - 1) as f64;
    Some(var.sqrt())
}

// ---------------------------------------------------------------------------
// Grouped tables
// ---------------------------------------------------------------------------

/// Mean `DataValue` per `(StratificationCategory1, Stratification1)`, restricted to
/// [`STRATIFICATION_CATEGORIES`]. Pairs without a numeric value are omitted.
pub fn group_mean_by_stratification(subset: &WorkingSubset<'_>) -> Vec<StratificationMean> {
    let ds = subset.dataset();
    let (Some(cat_col), Some(strat_col), Some(val_col)) = (
        ds.column_index(columns::STRATIFICATION_CATEGORY),
        ds.column_index(columns::STRATIFICATION),
        ds.column_index(columns::DATA_VALUE),
    ) else {
        return Vec::new();
    };

    let mut groups: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();
    for &row in subset.rows() {
        let Some(category) = ds.cell(row, cat_col).as_str() else {
            continue;
        };
        if !STRATIFICATION_CATEGORIES.contains(&category) {
            continue;
        }
        let stratum = ds.cell(row, strat_col);
        if stratum.is_null() {
            continue;
        }
        let Some(v) = ds.cell(row, val_col).as_f64() else {
            continue;
        };
        let entry = groups
            .entry((category.to_string(), stratum.to_field()))
            .or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((category, stratum), (sum, n))| StratificationMean {
            category,
            stratum,
            mean: sum / n as f64,
        })
        .collect()
}

/// Row count per `YearStart`, ascending. Rows without a year are skipped.
pub fn count_by_year(subset: &WorkingSubset<'_>) -> Vec<(i64, usize)> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    if let Some(years) = subset.column(columns::YEAR_START) {
        for year in years.filter_map(CellValue::as_i64) {
            *counts.entry(year).or_default() += 1;
        }
    }
    counts.into_iter().collect()
}

/// Mean `DataValue` per `YearStart`, ascending. Years with no numeric value are omitted.
pub fn mean_by_year(subset: &WorkingSubset<'_>) -> Vec<(i64, f64)> {
    let ds = subset.dataset();
    let (Some(year_col), Some(val_col)) = (
        ds.column_index(columns::YEAR_START),
        ds.column_index(columns::DATA_VALUE),
    ) else {
        return Vec::new();
    };

    let mut sums: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for &row in subset.rows() {
        let (Some(year), Some(v)) = (
            ds.cell(row, year_col).as_i64(),
            ds.cell(row, val_col).as_f64(),
        ) else {
            continue;
        };
        let entry = sums.entry(year).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(year, (sum, n))| (year, sum / n as f64))
        .collect()
}

/// `n` equal-width buckets over `[min, max]` of the numeric values.
/// When every value is equal a single bucket holds them all.
pub fn value_histogram(subset: &WorkingSubset<'_>, n: usize) -> Vec<HistogramBucket> {
    let vals = values(subset);
    if vals.is_empty() || n == 0 {
        return Vec::new();
    }
    let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
    let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // A span wider than f64::MAX has no finite bucket width.
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return vec![HistogramBucket {
            lower: min,
            upper: max,
            count: vals.len(),
        }];
    }

    let width = range / n as f64;
    let mut buckets: Vec<HistogramBucket> = (0..n)
        .map(|i| HistogramBucket {
            lower: min + i as f64 * width,
            upper: if i + 1 == n {
                max
            } else {
                min + (i + 1) as f64 * width
            },
            count: 0,
        })
        .collect();
    for v in vals {
        let idx = (((v - min) / width).floor() as usize).min(n - 1);
        buckets[idx].count += 1;
    }
    buckets
}

// ---------------------------------------------------------------------------
// KPIs and chart selection
// ---------------------------------------------------------------------------

/// Headline metrics. "Previous" means rows with `YearStart` before the latest
/// year in the subset; each delta is the whole-subset value minus the
/// previous-slice value.
///
/// The average delta is reported as 0 when the previous mean is missing or not
/// positive, while the records delta is never clamped.
pub fn kpis(subset: &WorkingSubset<'_>) -> Kpis {
    let latest = subset
        .column(columns::YEAR_START)
        .and_then(|years| years.filter_map(CellValue::as_i64).max());

    let previous = match latest {
        Some(latest) => subset.clone().retain_by(columns::YEAR_START, |cell| {
            cell.as_i64().is_some_and(|y| y < latest)
        }),
        None => WorkingSubset::empty(subset.dataset()),
    };

    let total_records = count(subset);
    let average_value = mean_value(subset);
    let average_delta = match (average_value, mean_value(&previous)) {
        (Some(current), Some(prev)) if prev > 0.0 => current - prev,
        _ => 0.0,
    };

    Kpis {
        total_records,
        records_delta: total_records as i64 - count(&previous) as i64,
        average_value,
        average_delta,
        distinct_locations: distinct_locations(subset),
    }
}

/// Heatmap when the stratified means have at least one row, otherwise counts per year.
pub fn first_chart(subset: &WorkingSubset<'_>) -> FirstChart {
    let ds = subset.dataset();
    if !ds.has_column(columns::STRATIFICATION_CATEGORY) || !ds.has_column(columns::STRATIFICATION)
    {
        return FirstChart::Unavailable;
    }
    let heat = group_mean_by_stratification(subset);
    if heat.is_empty() {
        FirstChart::YearCounts(count_by_year(subset))
    } else {
        FirstChart::Heatmap(heat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::tests::{dataset, scenario};
    use crate::data::filter::{apply, FilterState};
    use crate::data::loader::read_csv;
    use crate::data::model::{Dataset, Record};

    fn strat_dataset(rows: &[(&str, &str, Option<f64>, i64)]) -> Dataset {
        let cols = vec![
            columns::STRATIFICATION_CATEGORY.to_string(),
            columns::STRATIFICATION.to_string(),
            columns::DATA_VALUE.to_string(),
            columns::YEAR_START.to_string(),
        ];
        let records = rows
            .iter()
            .map(|(cat, strat, v, year)| Record {
                cells: vec![
                    CellValue::String(cat.to_string()),
                    CellValue::String(strat.to_string()),
                    v.map_or(CellValue::Null, CellValue::Float),
                    CellValue::Integer(*year),
                ],
            })
            .collect();
        Dataset::from_records(cols, records)
    }

    #[test]
    fn scenario_mean_and_year_counts() {
        let ds = scenario();
        let subset = apply(&ds, &FilterState::for_topic("Asthma"));
        assert_eq!(count(&subset), 2);
        assert_eq!(mean_value(&subset), Some(15.0));
        assert_eq!(count_by_year(&subset), vec![(2019, 1), (2020, 1)]);
    }

    #[test]
    fn empty_subset_is_neutral() {
        let ds = scenario();
        let subset = apply(&ds, &FilterState::for_topic("Nothing"));
        assert_eq!(count(&subset), 0);
        assert_eq!(mean_value(&subset), None);
        assert_eq!(distinct_locations(&subset), 0);
        assert!(count_by_year(&subset).is_empty());
        assert!(mean_by_year(&subset).is_empty());
        assert!(value_histogram(&subset, 30).is_empty());
        assert_eq!(kpis(&subset), Kpis::default());
    }

    #[test]
    fn all_null_values_are_neutral() {
        let ds = dataset(&[("Asthma", 2019, "US", None), ("Asthma", 2020, "US", None)]);
        let subset = apply(&ds, &FilterState::default());
        assert_eq!(count(&subset), 2);
        assert_eq!(mean_value(&subset), None);
        assert_eq!(stddev_value(&subset), None);
        assert_eq!(median_value(&subset), None);
        assert!(value_histogram(&subset, 10).is_empty());
    }

    #[test]
    fn distinct_locations_counts_unique() {
        let ds = dataset(&[
            ("Asthma", 2019, "US", None),
            ("Asthma", 2019, "US", None),
            ("Asthma", 2019, "CA", None),
        ]);
        assert_eq!(distinct_locations(&apply(&ds, &FilterState::default())), 2);
    }

    #[test]
    fn descriptive_stats_basic() {
        let ds = dataset(&[
            ("A", 2019, "US", Some(2.0)),
            ("A", 2019, "US", Some(4.0)),
            ("A", 2019, "US", None),
            ("A", 2019, "US", Some(4.0)),
            ("A", 2019, "US", Some(6.0)),
        ]);
        let stats = descriptive_stats(&apply(&ds, &FilterState::default()));
        assert_eq!(stats.mean, Some(4.0));
        assert_eq!(stats.median, Some(4.0));
        let sd = stats.std_dev.unwrap();
        assert!((sd - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_no_std_dev() {
        let ds = dataset(&[("A", 2019, "US", Some(3.0))]);
        let subset = apply(&ds, &FilterState::default());
        assert_eq!(stddev_value(&subset), None);
        assert_eq!(median_value(&subset), Some(3.0));
    }

    #[test]
    fn stratification_means_only_known_categories() {
        let ds = strat_dataset(&[
            ("Sex", "Male", Some(10.0), 2019),
            ("Sex", "Male", Some(20.0), 2020),
            ("Sex", "Female", None, 2020),
            ("Age Group", "18-24", Some(5.0), 2020),
            ("Overall", "Overall", Some(99.0), 2020),
            ("Race/Ethnicity", "Hispanic", Some(7.0), 2020),
        ]);
        let heat = group_mean_by_stratification(&WorkingSubset::all(&ds));
        assert_eq!(heat.len(), 3);
        for cell in &heat {
            assert!(STRATIFICATION_CATEGORIES.contains(&cell.category.as_str()));
        }
        let male = heat.iter().find(|c| c.stratum == "Male").unwrap();
        assert_eq!(male.mean, 15.0);
        assert!(!heat.iter().any(|c| c.stratum == "Female"));
    }

    #[test]
    fn first_chart_falls_back_to_year_counts() {
        let ds = strat_dataset(&[
            ("Overall", "Overall", Some(1.0), 2019),
            ("Overall", "Overall", Some(2.0), 2020),
            ("Overall", "Overall", Some(3.0), 2020),
        ]);
        assert_eq!(
            first_chart(&WorkingSubset::all(&ds)),
            FirstChart::YearCounts(vec![(2019, 1), (2020, 2)])
        );

        let ds = strat_dataset(&[("Sex", "Male", Some(1.0), 2019)]);
        assert!(matches!(
            first_chart(&WorkingSubset::all(&ds)),
            FirstChart::Heatmap(ref h) if h.len() == 1
        ));
    }

    #[test]
    fn first_chart_unavailable_without_columns() {
        let ds = scenario();
        assert_eq!(first_chart(&WorkingSubset::all(&ds)), FirstChart::Unavailable);
    }

    #[test]
    fn mean_by_year_skips_null_values() {
        let ds = dataset(&[
            ("A", 2019, "US", Some(1.0)),
            ("A", 2019, "US", Some(3.0)),
            ("A", 2020, "US", None),
            ("A", 2021, "US", Some(5.0)),
        ]);
        assert_eq!(
            mean_by_year(&WorkingSubset::all(&ds)),
            vec![(2019, 2.0), (2021, 5.0)]
        );
    }

    #[test]
    fn histogram_buckets_cover_range() {
        let ds = dataset(&[
            ("A", 2019, "US", Some(0.0)),
            ("A", 2019, "US", Some(2.5)),
            ("A", 2019, "US", Some(5.0)),
            ("A", 2019, "US", Some(10.0)),
            ("A", 2019, "US", None),
        ]);
        let buckets = value_histogram(&WorkingSubset::all(&ds), 4);
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0].lower, 0.0);
        assert_eq!(buckets[3].upper, 10.0);
        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 1]);
    }

    #[test]
    fn histogram_degenerate_range() {
        let ds = dataset(&[("A", 2019, "US", Some(4.0)), ("A", 2020, "US", Some(4.0))]);
        let buckets = value_histogram(&WorkingSubset::all(&ds), 30);
        assert_eq!(
            buckets,
            vec![HistogramBucket {
                lower: 4.0,
                upper: 4.0,
                count: 2
            }]
        );
    }

    #[test]
    fn histogram_overflowing_range_is_one_bucket() {
        let ds = dataset(&[
            ("A", 2019, "US", Some(-f64::MAX)),
            ("A", 2019, "US", Some(0.0)),
            ("A", 2020, "US", Some(f64::MAX)),
        ]);
        let buckets = value_histogram(&WorkingSubset::all(&ds), 10);
        assert_eq!(
            buckets,
            vec![HistogramBucket {
                lower: -f64::MAX,
                upper: f64::MAX,
                count: 3
            }]
        );
    }

    #[test]
    fn non_numeric_values_are_ignored() {
        let ds = read_csv(
            "YearStart,Topic,DataValue\n\
             2019,Asthma,10\n\
             2019,Asthma,~\n\
             2020,Asthma,NaN\n\
             2020,Asthma,30\n\
             2020,Asthma,\n"
                .as_bytes(),
        )
        .unwrap();
        let subset = WorkingSubset::all(&ds);
        assert_eq!(count(&subset), 5);
        assert_eq!(values(&subset), vec![10.0, 30.0]);
        assert_eq!(mean_value(&subset), Some(20.0));
        assert_eq!(median_value(&subset), Some(20.0));
        let buckets = value_histogram(&subset, 2);
        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1]);
        assert_eq!(mean_by_year(&subset), vec![(2019, 10.0), (2020, 30.0)]);
    }

    #[test]
    fn kpi_deltas() {
        let ds = dataset(&[
            ("A", 2019, "US", Some(10.0)),
            ("A", 2019, "CA", Some(10.0)),
            ("A", 2020, "US", Some(40.0)),
        ]);
        let k = kpis(&WorkingSubset::all(&ds));
        assert_eq!(k.total_records, 3);
        assert_eq!(k.records_delta, 1);
        assert_eq!(k.average_value, Some(20.0));
        assert_eq!(k.average_delta, 10.0);
        assert_eq!(k.distinct_locations, 2);
    }

    #[test]
    fn average_delta_zeroed_for_non_positive_previous() {
        let ds = dataset(&[("A", 2019, "US", Some(-5.0)), ("A", 2020, "US", Some(5.0))]);
        let k = kpis(&WorkingSubset::all(&ds));
        assert_eq!(k.average_delta, 0.0);
        assert_eq!(k.records_delta, 1);

        // A single year has no previous slice.
        let ds = dataset(&[("A", 2020, "US", Some(5.0))]);
        let k = kpis(&WorkingSubset::all(&ds));
        assert_eq!(k.average_delta, 0.0);
        assert_eq!(k.records_delta, 1);
    }
}
