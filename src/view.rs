//! Pure view-model construction.
//!
//! [`render`] turns the shared dataset and the current selections into
//! everything the UI draws. The UI calls it whenever a selection changes and
//! keeps no derived data of its own.

use crate::config::Variant;
use crate::data::aggregate::{self, DescriptiveStats, FirstChart, HistogramBucket, Kpis};
use crate::data::filter::{self, FilterState, WorkingSubset};
use crate::data::model::{columns, Dataset};

/// Columns of the detail / preview table, in display order, when present.
pub const DISPLAY_COLUMNS: [&str; 8] = [
    columns::YEAR_START,
    columns::LOCATION_DESC,
    columns::TOPIC,
    columns::QUESTION,
    columns::DATA_VALUE,
    columns::DATA_VALUE_UNIT,
    columns::STRATIFICATION_CATEGORY,
    columns::STRATIFICATION,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOptions {
    pub variant: Variant,
    pub histogram_bins: usize,
    pub detail_rows: usize,
    pub preview_rows: usize,
    pub show_stats: bool,
}

impl From<&crate::config::DashboardConfig> for ViewOptions {
    fn from(cfg: &crate::config::DashboardConfig) -> Self {
        Self {
            variant: cfg.variant,
            histogram_bins: cfg.histogram_bins,
            detail_rows: cfg.detail_rows,
            preview_rows: cfg.preview_rows,
            show_stats: false,
        }
    }
}

/// One metric tile: label, formatted value and formatted delta.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: String,
    pub delta: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistogramView {
    Buckets(Vec<HistogramBucket>),
    /// The column exists but holds no numeric value for this selection.
    NoNumericData,
    ColumnMissing,
}

/// A table already formatted for display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FullView {
    pub kpis: Kpis,
    pub cards: Vec<KpiCard>,
    pub first_chart: FirstChart,
    pub histogram: HistogramView,
    pub detail: TableView,
    pub stats: Option<DescriptiveStats>,
    /// Rows in the working subset, i.e. rows an export would contain.
    pub row_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleView {
    pub line: Vec<(i64, f64)>,
    pub preview: TableView,
    pub row_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    Full(FullView),
    Simple(SimpleView),
}

/// Build the view model for the current selections.
///
/// The full dashboard uses topic, years and locations. The simple dashboard
/// only honours the topic.
pub fn render(dataset: &Dataset, filters: &FilterState, options: &ViewOptions) -> DashboardView {
    match options.variant {
        Variant::Full => DashboardView::Full(render_full(dataset, filters, options)),
        Variant::Simple => DashboardView::Simple(render_simple(dataset, filters, options)),
    }
}

/// The rows a view (and an export) is built from.
pub fn working_subset<'a>(
    dataset: &'a Dataset,
    filters: &FilterState,
    variant: Variant,
) -> WorkingSubset<'a> {
    match variant {
        Variant::Full => filter::apply(dataset, filters),
        Variant::Simple => filter::filter_topic(dataset, filters.active_topic()),
    }
}

fn render_full(dataset: &Dataset, filters: &FilterState, options: &ViewOptions) -> FullView {
    let subset = working_subset(dataset, filters, Variant::Full);
    let kpis = aggregate::kpis(&subset);

    let histogram = if !dataset.has_column(columns::DATA_VALUE) {
        HistogramView::ColumnMissing
    } else {
        match aggregate::value_histogram(&subset, options.histogram_bins) {
            buckets if buckets.is_empty() => HistogramView::NoNumericData,
            buckets => HistogramView::Buckets(buckets),
        }
    };

    FullView {
        cards: kpi_cards(&kpis),
        kpis,
        first_chart: aggregate::first_chart(&subset),
        histogram,
        detail: table(&subset, options.detail_rows),
        stats: options
            .show_stats
            .then(|| aggregate::descriptive_stats(&subset)),
        row_count: subset.len(),
    }
}

fn render_simple(dataset: &Dataset, filters: &FilterState, options: &ViewOptions) -> SimpleView {
    let subset = working_subset(dataset, filters, Variant::Simple);
    SimpleView {
        line: aggregate::mean_by_year(&subset),
        preview: table(&subset, options.preview_rows),
        row_count: subset.len(),
    }
}

/// First `limit` rows of the subset, restricted to the display columns present.
pub fn table(subset: &WorkingSubset<'_>, limit: usize) -> TableView {
    let ds = subset.dataset();
    let present: Vec<(&str, usize)> = DISPLAY_COLUMNS
        .iter()
        .filter_map(|&name| ds.column_index(name).map(|idx| (name, idx)))
        .collect();

    TableView {
        columns: present.iter().map(|(name, _)| name.to_string()).collect(),
        rows: subset
            .rows()
            .iter()
            .take(limit)
            .map(|&row| {
                present
                    .iter()
                    .map(|&(_, col)| ds.cell(row, col).to_string())
                    .collect()
            })
            .collect(),
    }
}

pub fn kpi_cards(kpis: &Kpis) -> Vec<KpiCard> {
    vec![
        KpiCard {
            label: "Total records",
            value: group_thousands(kpis.total_records as i64),
            delta: signed_thousands(kpis.records_delta),
        },
        KpiCard {
            label: "Average value",
            value: format!("{:.2}", kpis.average_value.unwrap_or(0.0)),
            delta: format!("{:+.2}", kpis.average_delta),
        },
        KpiCard {
            label: "States / locations",
            value: kpis.distinct_locations.to_string(),
            delta: "Active".to_string(),
        },
    ]
}

/// `None` renders as `0.00`.
pub fn format_stat(value: Option<f64>) -> String {
    format!("{:.2}", value.unwrap_or(0.0))
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn signed_thousands(n: i64) -> String {
    if n < 0 {
        group_thousands(n)
    } else {
        format!("+{}", group_thousands(n))
    }
}
