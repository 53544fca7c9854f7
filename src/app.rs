use std::sync::Arc;

use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::config::DashboardConfig;
use crate::data::model::Dataset;
use crate::state::AppState;
use crate::ui::{charts, panels, table};
use crate::view::{DashboardView, FullView, SimpleView};

const TABLE_HEIGHT: f32 = 400.0;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(dataset: Arc<Dataset>, config: &DashboardConfig) -> Self {
        Self {
            state: AppState::new(dataset, config),
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar + topic selector ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: sidebar filters (full dashboard only) ----
        if matches!(self.state.view, DashboardView::Full(_)) {
            egui::SidePanel::left("filter_panel")
                .default_width(240.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: metrics, charts, table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| match &self.state.view {
                    DashboardView::Full(view) => full_dashboard(ui, view),
                    DashboardView::Simple(view) => simple_dashboard(ui, view),
                });
        });
    }
}

fn full_dashboard(ui: &mut Ui, view: &FullView) {
    ui.columns(view.cards.len(), |cols| {
        for (col, card) in cols.iter_mut().zip(&view.cards) {
            col.vertical(|ui: &mut Ui| {
                ui.label(RichText::new(card.label).weak());
                ui.heading(&card.value);
                ui.label(RichText::new(&card.delta).small());
            });
        }
    });
    ui.separator();

    ui.columns(2, |cols| {
        cols[0].strong("Stratification heatmap");
        charts::first_chart(&mut cols[0], &view.first_chart);
        cols[1].strong("Value histogram");
        charts::histogram(&mut cols[1], &view.histogram);
    });
    ui.separator();

    ui.heading("Detailed data");
    table::data_table(ui, "detail_table", &view.detail, TABLE_HEIGHT);
}

fn simple_dashboard(ui: &mut Ui, view: &SimpleView) {
    ui.heading("Mean value per year");
    charts::time_series(ui, &view.line);
    ui.separator();

    ui.heading(format!("Data preview ({} rows)", view.row_count));
    table::data_table(ui, "preview_table", &view.preview, TABLE_HEIGHT);
}
