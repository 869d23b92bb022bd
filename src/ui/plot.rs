use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points, Polygon};

use crate::color::{shade_ramp, CategoryColors, RANKING_HUE};
use crate::data::model::Category;

const CHART_HEIGHT: f32 = 320.0;

/// Axis formatter that shows `labels[i]` at integer position `i`.
fn label_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Ranking: horizontal bars, largest on top
// ---------------------------------------------------------------------------

pub fn top_chart(ui: &mut Ui, top: &[(String, f64)]) {
    if top.is_empty() {
        ui.label("Sin descripciones para comparar.");
        return;
    }

    let n = top.len();
    let shades = shade_ramp(RANKING_HUE, n);
    // Position 0 is the bottom of the chart.
    let bars: Vec<Bar> = top
        .iter()
        .zip(shades)
        .enumerate()
        .map(|(rank, ((desc, total), color))| {
            Bar::new((n - 1 - rank) as f64, *total)
                .name(desc)
                .fill(color)
                .width(0.7)
        })
        .collect();
    let labels: Vec<String> = top.iter().rev().map(|(desc, _)| desc.clone()).collect();

    Plot::new("top_chart")
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .x_axis_label("Gasto total (USD)")
        .y_axis_formatter(label_formatter(labels))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Gasto total").horizontal());
        });
}

// ---------------------------------------------------------------------------
// Category distribution: one coloured bar per selected category
// ---------------------------------------------------------------------------

pub fn category_chart(ui: &mut Ui, totals: &[(Category, f64)], colors: &CategoryColors) {
    let labels: Vec<String> = totals.iter().map(|(c, _)| c.column_name().to_string()).collect();

    Plot::new("category_chart")
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .legend(Legend::default())
        .y_axis_label("Monto total (USD)")
        .x_axis_formatter(label_formatter(labels))
        .show(ui, |plot_ui| {
            for (i, (category, total)) in totals.iter().enumerate() {
                let color = colors.color_for(*category);
                let bar = Bar::new(i as f64, *total).fill(color).width(0.6);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(category.column_name()).color(color));
            }
        });
}

// ---------------------------------------------------------------------------
// Time series by installation year, with a ±10 % band
// ---------------------------------------------------------------------------

/// Band segments between consecutive years, each a convex quad.
pub fn band_segments(series: &[[f64; 2]], spread: f64) -> Vec<Vec<[f64; 2]>> {
    series
        .windows(2)
        .map(|w| {
            let [x0, y0] = w[0];
            let [x1, y1] = w[1];
            vec![
                [x0, y0 * (1.0 - spread)],
                [x1, y1 * (1.0 - spread)],
                [x1, y1 * (1.0 + spread)],
                [x0, y0 * (1.0 + spread)],
            ]
        })
        .collect()
}

pub fn year_chart(ui: &mut Ui, by_year: &BTreeMap<i32, f64>) {
    if by_year.is_empty() {
        ui.label("Sin fechas de instalación válidas.");
        return;
    }

    let series: Vec<[f64; 2]> = by_year.iter().map(|(y, v)| [*y as f64, *v]).collect();
    let line_color = Color32::from_rgb(0, 0, 139);
    let band_color = Color32::from_rgba_unmultiplied(0, 0, 255, 50);

    Plot::new("year_chart")
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .x_axis_label("Año de instalación")
        .y_axis_label("Gasto total (USD)")
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
            if mark.value.fract() == 0.0 {
                format!("{}", mark.value as i64)
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            for quad in band_segments(&series, 0.1) {
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(quad))
                        .fill_color(band_color)
                        .stroke(eframe::egui::Stroke::NONE),
                );
            }
            plot_ui.line(
                Line::new(PlotPoints::from(series.clone()))
                    .color(line_color)
                    .width(2.0)
                    .name("Gasto total"),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(series.clone()))
                    .color(line_color)
                    .radius(4.0),
            );
        });
}
