use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::view::TableView;

const ROW_HEIGHT: f32 = 18.0;

/// Scrollable, striped table of pre-formatted cells.
pub fn data_table(ui: &mut Ui, id: &str, table: &TableView, max_height: f32) {
    if table.columns.is_empty() {
        ui.label("No displayable columns in this dataset.");
        return;
    }
    if table.rows.is_empty() {
        ui.label("No rows match the current filters.");
        return;
    }

    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(60.0).clip(true), table.columns.len())
            .max_scroll_height(max_height)
            .header(ROW_HEIGHT + 4.0, |mut header| {
                for name in &table.columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, table.rows.len(), |mut row| {
                    let cells = &table.rows[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}
