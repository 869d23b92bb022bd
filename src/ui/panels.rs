use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::config::TOP_N_RANGE;
use crate::data::model::Category;
use crate::state::AppState;
use crate::ui::{plot, table};

// ---------------------------------------------------------------------------
// Left side panel – analysis options
// ---------------------------------------------------------------------------

/// Render the left options panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("⚙ Opciones de análisis");
    ui.separator();

    let equipos: Vec<String> = match &state.dataset {
        Some(ds) => ds.equipos().into_iter().map(str::to_string).collect(),
        None => {
            ui.label("No hay datos cargados.");
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Equipment selector ----
            ui.strong("Seleccione un equipo:");
            let current = state.selected_equipo.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("equipo")
                .selected_text(&current)
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for equipo in &equipos {
                        if ui.selectable_label(current == *equipo, equipo).clicked() {
                            state.select_equipo(equipo.clone());
                        }
                    }
                });
            ui.separator();

            // ---- Category multi-selection ----
            ui.strong("Seleccione tipos de gasto a comparar:");
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("Todos").clicked() {
                    state.select_all_categories();
                }
                if ui.small_button("Ninguno").clicked() {
                    state.clear_categories();
                }
            });
            for category in Category::ALL {
                let mut checked = state.categories.contains(category);
                let text = RichText::new(category.column_name()).color(state.colors.color_for(category));
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_category(category);
                }
            }
            ui.separator();

            // ---- Ranking size ----
            let mut top_n = state.top_n;
            if ui
                .add(egui::Slider::new(&mut top_n, TOP_N_RANGE).text("equipos en el ranking"))
                .changed()
            {
                state.set_top_n(top_n);
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Archivo", |ui: &mut Ui| {
            if ui.button("Abrir…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.data_path.is_some(), egui::Button::new("Recargar"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(path)) = (&state.dataset, &state.data_path) {
            ui.label(format!("{} registros · {}", ds.len(), path.display()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel – the report
// ---------------------------------------------------------------------------

/// Render the whole report, top to bottom.
pub fn report(ui: &mut Ui, state: &AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            header_images(ui, state);

            ui.heading("📊 Análisis de gastos de mantenimiento (2020-2023)");
            ui.label(
                "Gastos de mantenimiento por equipo: reactivos, fallas, mejoras, \
                 preventivos y CBM, con estadística descriptiva básica.",
            );
            ui.add_space(8.0);

            let Some(dataset) = &state.dataset else {
                ui.centered_and_justified(|ui: &mut Ui| {
                    let msg = state
                        .status_message
                        .as_deref()
                        .unwrap_or("Abra un archivo para ver el análisis  (Archivo → Abrir…)");
                    ui.heading(RichText::new(msg).color(Color32::RED));
                });
                return;
            };

            ui.heading("📌 Estadística básica del gasto total (todos los equipos)");
            match &state.report.stats {
                Some(stats) => {
                    egui::Grid::new("summary_stats").striped(true).show(ui, |ui: &mut Ui| {
                        for (label, value) in [
                            ("Promedio", stats.mean),
                            ("Mediana", stats.median),
                            ("Desviación estándar", stats.std_dev),
                            ("Máximo", stats.max),
                            ("Mínimo", stats.min),
                        ] {
                            ui.label(label);
                            ui.monospace(format!("{} USD", format_usd(value)));
                            ui.end_row();
                        }
                    });
                }
                None => {
                    ui.label("Sin registros.");
                }
            }
            ui.add_space(12.0);

            ui.heading(format!("🏆 Top {} equipos con mayor gasto total", state.top_n));
            plot::top_chart(ui, &state.report.top);
            ui.add_space(12.0);

            ui.heading("📊 Distribución de gastos por tipo (global)");
            if state.categories.is_empty() {
                ui.label("Seleccione al menos un tipo de gasto.");
            } else {
                plot::category_chart(ui, &state.report.category_totals, &state.colors);
            }
            ui.add_space(12.0);

            ui.heading("📈 Evolución temporal de los gastos (según año de instalación)");
            plot::year_chart(ui, &state.report.by_year);
            ui.add_space(12.0);

            let selected = state.selected_equipo.as_deref().unwrap_or("-");
            ui.heading(format!("📋 Detalle del equipo seleccionado: {selected}"));
            table::detail_table(ui, dataset.column_names(), &state.detail_rows());
            ui.add_space(12.0);

            ui.heading("✅ Conclusiones");
            for line in CONCLUSIONS {
                ui.label(*line);
            }
        });
}

const CONCLUSIONS: &[&str] = &[
    "1. El gasto total se compone de 5 categorías: Reactivas, Fallas, Mejoras, Preventivo y CBM.",
    "2. Algunos equipos presentan un gasto acumulado mucho mayor que otros (ver el ranking).",
    "3. El mantenimiento preventivo y las fallas representan la mayor parte del gasto global.",
    "4. Promedio, mediana y desviación estándar dan un panorama inicial del gasto.",
];

/// Configured header images side by side, each with its caption.
fn header_images(ui: &mut Ui, state: &AppState) {
    let images = &state.config.header_images;
    if images.is_empty() {
        return;
    }
    ui.columns(images.len(), |cols: &mut [Ui]| {
        for (col, image) in cols.iter_mut().zip(images) {
            col.vertical_centered(|ui: &mut Ui| {
                let uri = format!("file://{}", image.path.display());
                ui.add(
                    egui::Image::new(uri)
                        .max_width(ui.available_width())
                        .max_height(140.0),
                );
                if !image.caption.is_empty() {
                    ui.small(&image.caption);
                }
            });
        }
    });
    ui.separator();
}

/// `1234567.891` → `"1,234,567.89"`.
pub fn format_usd(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Abrir gastos de mantenimiento")
        .add_filter("Archivos compatibles", &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "json", "parquet", "pq"])
        .add_filter("Excel / ODS", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
