use std::collections::{BTreeMap, HashMap};

use super::filter::CategorySelection;
use super::model::{Category, MaintenanceDataset};

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation (ddof = 0).
    pub std_dev: f64,
    pub max: f64,
    pub min: f64,
}

impl SummaryStats {
    /// `None` when there is no finite value.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(SummaryStats {
            mean,
            median,
            std_dev: variance.sqrt(),
            max: sorted[sorted.len() - 1],
            min: sorted[0],
        })
    }
}

// ---------------------------------------------------------------------------
// Group-and-sum aggregations
// ---------------------------------------------------------------------------

/// Sum of `Gasto_Total` per description, largest first, at most `n` entries.
/// Rows without a description are left out; ties sort by description.
pub fn top_by_descripcion(dataset: &MaintenanceDataset, n: usize) -> Vec<(String, f64)> {
    let mut sums: HashMap<&str, f64> = HashMap::new();
    for r in dataset.records() {
        if let Some(desc) = r.descripcion.as_deref() {
            *sums.entry(desc).or_insert(0.0) += r.gasto_total;
        }
    }

    let mut ranked: Vec<(String, f64)> = sums.into_iter().map(|(d, v)| (d.to_string(), v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

/// Sum of `Gasto_Total` per installation year; rows without a year are left out.
pub fn totals_by_year(dataset: &MaintenanceDataset) -> BTreeMap<i32, f64> {
    let mut sums = BTreeMap::new();
    for r in dataset.records() {
        if let Some(year) = r.anio {
            *sums.entry(year).or_insert(0.0) += r.gasto_total;
        }
    }
    sums
}

/// Dataset-wide total of each selected category, in selection order.
pub fn category_totals(dataset: &MaintenanceDataset, selection: &CategorySelection) -> Vec<(Category, f64)> {
    selection
        .iter()
        .map(|cat| (cat, dataset.category_values(cat).iter().sum::<f64>()))
        .collect()
}
