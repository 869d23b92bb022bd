use eframe::egui::{self, Align, Layout, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::MaintenanceRecord;

const ROW_HEIGHT: f32 = 18.0;

/// All columns of the given records, one table row each.
pub fn detail_table(ui: &mut Ui, columns: &[String], rows: &[&MaintenanceRecord]) {
    if rows.is_empty() {
        ui.label("Sin registros para el equipo seleccionado.");
        return;
    }

    egui::ScrollArea::horizontal()
        .id_salt("detail_table_scroll")
        .show(ui, |ui: &mut Ui| {
            ui.push_id("detail_table", |ui: &mut Ui| {
                TableBuilder::new(ui)
                    .striped(true)
                    .resizable(true)
                    .vscroll(false)
                    .cell_layout(Layout::left_to_right(Align::Center))
                    .columns(Column::auto().at_least(60.0), columns.len())
                    .header(ROW_HEIGHT + 4.0, |mut header| {
                        for name in columns {
                            header.col(|ui: &mut Ui| {
                                ui.strong(name);
                            });
                        }
                    })
                    .body(|mut body| {
                        for record in rows {
                            body.row(ROW_HEIGHT, |mut row| {
                                for name in columns {
                                    row.col(|ui: &mut Ui| {
                                        ui.label(record.value(name).to_string());
                                    });
                                }
                            });
                        }
                    });
            });
        });
}
