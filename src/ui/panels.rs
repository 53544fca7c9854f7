use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::config::Variant;
use crate::state::AppState;
use crate::view::{self, DashboardView};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar with the topic selector.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Export CSV…").clicked() {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for (variant, label) in [(Variant::Full, "Full"), (Variant::Simple, "Simple")] {
            if ui
                .selectable_label(state.options.variant == variant, label)
                .clicked()
            {
                state.set_variant(variant);
            }
        }

        ui.separator();

        ui.label(format!("{} records loaded", state.dataset.len()));

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::GRAY
            };
            ui.separator();
            ui.label(RichText::new(msg).color(color));
        }
    });

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Health indicator");
        topic_selector(ui, state);
    });
}

fn topic_selector(ui: &mut Ui, state: &mut AppState) {
    let current = state.filters.topic.clone().unwrap_or_default();
    let mut chosen = None;
    egui::ComboBox::from_id_salt("topic")
        .selected_text(&current)
        .width(320.0)
        .show_ui(ui, |ui: &mut Ui| {
            for topic in &state.topic_options {
                if ui.selectable_label(current == *topic, topic).clicked() {
                    chosen = Some(topic.clone());
                }
            }
        });
    if let Some(topic) = chosen {
        state.set_topic(&topic);
    }
}

// ---------------------------------------------------------------------------
// Left side panel – advanced filters, export, statistics
// ---------------------------------------------------------------------------

/// Render the sidebar of the full dashboard.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Advanced filters");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            year_filter(ui, state);
            location_filter(ui, state);

            ui.separator();
            ui.strong("Export data");
            if ui.button("Download CSV").clicked() {
                export_dialog(state);
            }

            ui.separator();
            let mut show = state.options.show_stats;
            if ui.checkbox(&mut show, "Show statistics").changed() {
                state.set_show_stats(show);
            }
            if let DashboardView::Full(full) = &state.view {
                if let Some(stats) = &full.stats {
                    egui::Grid::new("stats").show(ui, |ui: &mut Ui| {
                        ui.strong("Mean:");
                        ui.label(view::format_stat(stats.mean));
                        ui.end_row();
                        ui.strong("Median:");
                        ui.label(view::format_stat(stats.median));
                        ui.end_row();
                        ui.strong("Std. dev.:");
                        ui.label(view::format_stat(stats.std_dev));
                        ui.end_row();
                    });
                }
            }
        });
}

fn year_filter(ui: &mut Ui, state: &mut AppState) {
    let header = format!(
        "Year(s)  ({}/{})",
        state.filters.years.len(),
        state.year_options.len()
    );
    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt("years")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("Any year").clicked() {
                state.clear_years();
            }
            let mut toggled = None;
            for &year in &state.year_options {
                let mut checked = state.filters.years.contains(&year);
                if ui.checkbox(&mut checked, year.to_string()).changed() {
                    toggled = Some(year);
                }
            }
            if let Some(year) = toggled {
                state.toggle_year(year);
            }
        });
}

fn location_filter(ui: &mut Ui, state: &mut AppState) {
    let header = format!(
        "Location(s)  ({}/{})",
        state.filters.locations.len(),
        state.location_options.len()
    );
    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt("locations")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("Any location").clicked() {
                state.clear_locations();
            }
            let mut toggled = None;
            for location in &state.location_options {
                let mut checked = state.filters.locations.contains(location);
                if ui.checkbox(&mut checked, location).changed() {
                    toggled = Some(location.clone());
                }
            }
            if let Some(location) = toggled {
                state.toggle_location(&location);
            }
        });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export working data")
        .set_file_name(state.export_file_name())
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        state.export_to(&path);
    }
}
