use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints, Points, Polygon};

use crate::color::{ColorScale, HISTOGRAM_COLOR};
use crate::data::aggregate::{FirstChart, HistogramBucket, StratificationMean};
use crate::view::HistogramView;

const CHART_HEIGHT: f32 = 400.0;

// ---------------------------------------------------------------------------
// First chart: stratification heatmap or counts per year
// ---------------------------------------------------------------------------

pub fn first_chart(ui: &mut Ui, chart: &FirstChart) {
    match chart {
        FirstChart::Heatmap(cells) => stratification_heatmap(ui, cells),
        FirstChart::YearCounts(counts) if counts.is_empty() => {
            warning(ui, "No data for the current selection");
        }
        FirstChart::YearCounts(counts) => year_bars(ui, counts),
        FirstChart::Unavailable => info(ui, "No stratification data available"),
    }
}

/// Heatmap of mean value: categories on x, strata on y.
fn stratification_heatmap(ui: &mut Ui, cells: &[StratificationMean]) {
    let mut categories: Vec<String> = cells.iter().map(|c| c.category.clone()).collect();
    categories.dedup();
    let mut strata: Vec<String> = cells.iter().map(|c| c.stratum.clone()).collect();
    strata.sort();
    strata.dedup();

    let min = cells.iter().map(|c| c.mean).fold(f64::INFINITY, f64::min);
    let max = cells.iter().map(|c| c.mean).fold(f64::NEG_INFINITY, f64::max);
    let scale = ColorScale::plasma();

    let x_labels = categories.clone();
    let y_labels = strata.clone();

    Plot::new("stratification_heatmap")
        .height(CHART_HEIGHT)
        .x_axis_label("Category")
        .y_axis_label("Stratification")
        .x_axis_formatter(move |mark, _range| axis_label(&x_labels, mark.value))
        .y_axis_formatter(move |mark, _range| axis_label(&y_labels, mark.value))
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for cell in cells {
                let (Some(x), Some(y)) = (
                    categories.iter().position(|c| *c == cell.category),
                    strata.iter().position(|s| *s == cell.stratum),
                ) else {
                    continue;
                };
                let (x, y) = (x as f64, y as f64);
                let rect = vec![
                    [x - 0.5, y - 0.5],
                    [x + 0.5, y - 0.5],
                    [x + 0.5, y + 0.5],
                    [x - 0.5, y + 0.5],
                ];
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(rect))
                        .name(format!("{} / {}: {:.2}", cell.category, cell.stratum, cell.mean))
                        .fill_color(scale.color_for(cell.mean, min, max))
                        .stroke(Stroke::NONE),
                );
            }
        });

    ui.label(
        RichText::new(format!("Mean value: {min:.2} (dark) to {max:.2} (bright)"))
            .small()
            .weak(),
    );
}

/// Label for an integer grid mark, blank between categories.
fn axis_label(labels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

fn year_bars(ui: &mut Ui, counts: &[(i64, usize)]) {
    let max = counts.iter().map(|&(_, n)| n).max().unwrap_or(0) as f64;
    let scale = ColorScale::blues();
    let bars: Vec<Bar> = counts
        .iter()
        .map(|&(year, n)| {
            Bar::new(year as f64, n as f64)
                .width(0.8)
                .fill(scale.color_for(n as f64, 0.0, max))
                .name(format!("{year}: {n}"))
        })
        .collect();

    Plot::new("year_counts")
        .height(CHART_HEIGHT)
        .x_axis_label("YearStart")
        .y_axis_label("Records")
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars)));
}

// ---------------------------------------------------------------------------
// Second chart: value histogram
// ---------------------------------------------------------------------------

pub fn histogram(ui: &mut Ui, histogram: &HistogramView) {
    match histogram {
        HistogramView::Buckets(buckets) => histogram_bars(ui, buckets),
        HistogramView::NoNumericData => warning(ui, "No numeric data to display"),
        HistogramView::ColumnMissing => info(ui, "DataValue column not available"),
    }
}

fn histogram_bars(ui: &mut Ui, buckets: &[HistogramBucket]) {
    let bars: Vec<Bar> = buckets
        .iter()
        .map(|b| {
            let width = if b.upper > b.lower { b.upper - b.lower } else { 1.0 };
            Bar::new((b.lower + b.upper) / 2.0, b.count as f64)
                .width(width)
                .fill(HISTOGRAM_COLOR)
                .name(format!("{:.2} – {:.2}", b.lower, b.upper))
        })
        .collect();

    Plot::new("value_histogram")
        .height(CHART_HEIGHT)
        .x_axis_label("Data value")
        .y_axis_label("Frequency")
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars)));
}

// ---------------------------------------------------------------------------
// Simple dashboard: mean value per year
// ---------------------------------------------------------------------------

pub fn time_series(ui: &mut Ui, line: &[(i64, f64)]) {
    if line.is_empty() {
        warning(ui, "No numeric data to display");
        return;
    }
    let points: Vec<[f64; 2]> = line.iter().map(|&(y, v)| [y as f64, v]).collect();

    Plot::new("mean_by_year")
        .height(CHART_HEIGHT)
        .x_axis_label("YearStart")
        .y_axis_label("Mean value")
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .color(HISTOGRAM_COLOR)
                    .width(2.0),
            );
            plot_ui.points(Points::new(PlotPoints::from(points)).radius(3.0));
        });
}

fn warning(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(format!("⚠ {text}")).color(Color32::from_rgb(0xE0, 0xA0, 0x00)));
}

fn info(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(format!("ℹ {text}")).color(Color32::LIGHT_BLUE));
}
