use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::color::CategoryColors;
use crate::config::{AppConfig, TOP_N_RANGE};
use crate::data::cache::DatasetCache;
use crate::data::filter::{records_for_equipo, CategorySelection};
use crate::data::model::{Category, MaintenanceDataset, MaintenanceRecord};
use crate::data::stats::{category_totals, top_by_descripcion, totals_by_year, SummaryStats};

// ---------------------------------------------------------------------------
// Derived report figures
// ---------------------------------------------------------------------------

/// Everything the central panel draws, recomputed only when inputs change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportView {
    pub stats: Option<SummaryStats>,
    pub top: Vec<(String, f64)>,
    pub by_year: BTreeMap<i32, f64>,
    pub category_totals: Vec<(Category, f64)>,
}

impl ReportView {
    pub fn build(dataset: &MaintenanceDataset, categories: &CategorySelection, top_n: usize) -> Self {
        ReportView {
            stats: SummaryStats::from_values(&dataset.gasto_totals()),
            top: top_by_descripcion(dataset, top_n),
            by_year: totals_by_year(dataset),
            category_totals: category_totals(dataset, categories),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    cache: DatasetCache,

    /// File the current dataset came from.
    pub data_path: Option<PathBuf>,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Arc<MaintenanceDataset>>,

    /// Equipment shown in the detail table.
    pub selected_equipo: Option<String>,

    /// Categories compared in the distribution chart.
    pub categories: CategorySelection,

    /// How many descriptions the ranking chart shows.
    pub top_n: usize,

    pub colors: CategoryColors,

    /// Figures for the current dataset and selections.
    pub report: ReportView,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            cache: DatasetCache::new(config.load_options()),
            data_path: None,
            dataset: None,
            selected_equipo: None,
            categories: CategorySelection::from_categories(config.default_categories.iter().copied()),
            top_n: config.top_n,
            colors: CategoryColors::default(),
            report: ReportView::default(),
            status_message: None,
            config,
        }
    }

    /// Load the configured data file.
    pub fn load_configured(&mut self) {
        let path = self.config.data_file.clone();
        self.load_path(&path);
    }

    /// Load (or fetch from cache) a dataset and make it current.
    ///
    /// On failure the previous dataset is dropped so no stale report is shown.
    pub fn load_path(&mut self, path: &Path) {
        self.data_path = Some(path.to_path_buf());
        match self.cache.get_or_load(path) {
            Ok(dataset) => {
                self.cache.retain_only(path);
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                self.dataset = None;
                self.selected_equipo = None;
                self.report = ReportView::default();
            }
        }
    }

    /// Re-read the current file from disk, bypassing the cache.
    pub fn reload(&mut self) {
        if let Some(path) = self.data_path.clone() {
            self.cache.invalidate(&path);
            self.load_path(&path);
        }
    }

    /// Ingest a dataset and reset the selections that depend on it.
    pub fn set_dataset(&mut self, dataset: Arc<MaintenanceDataset>) {
        let keep_selection = self
            .selected_equipo
            .as_deref()
            .is_some_and(|e| dataset.equipos().contains(&e));
        if !keep_selection {
            self.selected_equipo = dataset.equipos().first().map(|e| e.to_string());
        }

        let report = dataset.report();
        self.status_message = if dataset.is_empty() {
            Some("Aviso: el archivo no tiene registros".to_string())
        } else if report.defaulted_categories.is_empty() && report.unparseable_dates.is_empty() {
            None
        } else {
            Some(format!(
                "Aviso: columnas sin datos {:?}, {} fecha(s) no válidas",
                report
                    .defaulted_categories
                    .iter()
                    .map(|c| c.column_name())
                    .collect::<Vec<_>>(),
                report.unparseable_dates.len()
            ))
        };

        self.dataset = Some(dataset);
        self.refresh_report();
    }

    /// Recompute the report figures after a selection change.
    pub fn refresh_report(&mut self) {
        self.report = match &self.dataset {
            Some(ds) => ReportView::build(ds, &self.categories, self.top_n),
            None => ReportView::default(),
        };
    }

    pub fn toggle_category(&mut self, category: Category) {
        self.categories.toggle(category);
        self.refresh_report();
    }

    pub fn select_all_categories(&mut self) {
        self.categories.select_all();
        self.refresh_report();
    }

    pub fn clear_categories(&mut self) {
        self.categories.clear();
        self.refresh_report();
    }

    pub fn set_top_n(&mut self, n: usize) {
        let n = n.clamp(*TOP_N_RANGE.start(), *TOP_N_RANGE.end());
        if n != self.top_n {
            self.top_n = n;
            self.refresh_report();
        }
    }

    pub fn select_equipo(&mut self, equipo: String) {
        self.selected_equipo = Some(equipo);
    }

    /// Rows of the selected equipment.
    pub fn detail_rows(&self) -> Vec<&MaintenanceRecord> {
        match (&self.dataset, &self.selected_equipo) {
            (Some(ds), Some(equipo)) => records_for_equipo(ds, equipo),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CSV: &str = "\
Equipo,Descripción Equipo,Fecha Instal.,GOT Reactivas. (USD),GOT A Falla (USD),GOT Mejoras (USD),GOT Preven. (USD),GOT CBM (USD)
EQ-1,Bomba,2020-03-01,100,50,0,25,0
EQ-2,Compresor,2022-07-15,0,0,200,0,10
";

    fn loaded_state() -> (tempfile::TempDir, AppState) {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("gastos.csv");
        std::fs::write(&path, CSV).expect("write");
        let mut state = AppState::new(AppConfig::default());
        state.load_path(&path);
        (dir, state)
    }

    #[test]
    fn loading_selects_first_equipment_and_builds_report() {
        let (_dir, state) = loaded_state();
        assert!(state.status_message.is_none());
        assert_eq!(state.selected_equipo.as_deref(), Some("EQ-1"));
        assert_eq!(state.detail_rows().len(), 1);
        assert_eq!(state.report.top[0], ("Compresor".to_string(), 210.0));
        assert_eq!(state.report.by_year, BTreeMap::from([(2020, 175.0), (2022, 210.0)]));
        assert_eq!(
            state.report.category_totals,
            vec![(Category::Falla, 50.0), (Category::Preventivo, 25.0)]
        );
        let stats = state.report.stats.expect("stats");
        assert_eq!(stats.mean, 192.5);
    }

    #[test]
    fn selections_update_the_report() {
        let (_dir, mut state) = loaded_state();
        state.toggle_category(Category::Cbm);
        assert_eq!(state.report.category_totals.last(), Some(&(Category::Cbm, 10.0)));

        state.set_top_n(1);
        assert_eq!(state.report.top.len(), 1);
        state.set_top_n(0);
        assert_eq!(state.top_n, 1);

        state.select_equipo("EQ-2".into());
        assert_eq!(state.detail_rows()[0].gasto_total, 210.0);
        state.select_equipo("EQ-404".into());
        assert!(state.detail_rows().is_empty());
    }

    #[test]
    fn failed_load_clears_the_report() {
        let (dir, mut state) = loaded_state();
        state.load_path(&dir.path().join("missing.xlsx"));
        assert!(state.dataset.is_none());
        assert_eq!(state.report, ReportView::default());
        let msg = state.status_message.expect("error message");
        assert!(msg.starts_with("Error:"), "{msg}");
    }

    #[test]
    fn reload_keeps_a_still_valid_selection() {
        let (_dir, mut state) = loaded_state();
        state.select_equipo("EQ-2".into());
        state.reload();
        assert_eq!(state.selected_equipo.as_deref(), Some("EQ-2"));
    }

    #[test]
    fn reload_picks_up_a_rewritten_file() {
        let (dir, mut state) = loaded_state();
        let before = state.dataset.clone().expect("dataset");
        std::fs::write(dir.path().join("gastos.csv"), CSV).expect("rewrite");
        state.reload();
        let after = state.dataset.clone().expect("dataset");
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);
    }

    #[test]
    fn configured_category_order_drives_the_totals() {
        let (_dir, mut state) = loaded_state();
        state.clear_categories();
        assert!(state.report.category_totals.is_empty());
        state.toggle_category(Category::Cbm);
        state.toggle_category(Category::Reactivas);
        assert_eq!(
            state.report.category_totals,
            vec![(Category::Cbm, 10.0), (Category::Reactivas, 100.0)]
        );
        state.select_all_categories();
        assert_eq!(state.report.category_totals.len(), 5);
        assert_eq!(state.report.category_totals[0].0, Category::Cbm);
    }

    #[test]
    fn header_only_file_warns_about_no_records() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("vacio.csv");
        std::fs::write(&path, "Equipo,GOT CBM (USD)\n").expect("write");
        let mut state = AppState::new(AppConfig::default());
        state.load_path(&path);
        assert!(state.dataset.is_some());
        assert!(state.selected_equipo.is_none());
        assert_eq!(state.report.stats, None);
        assert!(state.status_message.expect("warning").contains("no tiene registros"));
    }
}
