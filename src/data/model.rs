use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source sheet
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as read from the source file.
/// Pass-through columns keep this representation; the known columns are
/// converted into typed record fields during normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.2}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Null => write!(f, ""),
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text content of the cell, `None` for null/blank cells.
    pub fn as_text(&self) -> Option<String> {
        if self.is_null() {
            return None;
        }
        match self {
            CellValue::String(s) => Some(s.trim().to_string()),
            // Spreadsheet numbers arrive as floats; codes like 10004567 keep no decimals.
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                Some(format!("{}", *v as i64))
            }
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Category – the five expenditure types
// ---------------------------------------------------------------------------

/// Expenditure category. Declaration order is the canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub enum Category {
    Reactivas,
    Falla,
    Mejoras,
    Preventivo,
    #[serde(rename = "CBM")]
    Cbm,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Reactivas,
        Category::Falla,
        Category::Mejoras,
        Category::Preventivo,
        Category::Cbm,
    ];

    /// Canonical column name after renaming.
    pub fn column_name(self) -> &'static str {
        match self {
            Category::Reactivas => "Reactivas",
            Category::Falla => "Falla",
            Category::Mejoras => "Mejoras",
            Category::Preventivo => "Preventivo",
            Category::Cbm => "CBM",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.column_name() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// The five category amounts of one record, in USD.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryAmounts {
    pub reactivas: f64,
    pub falla: f64,
    pub mejoras: f64,
    pub preventivo: f64,
    pub cbm: f64,
}

impl CategoryAmounts {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Reactivas => self.reactivas,
            Category::Falla => self.falla,
            Category::Mejoras => self.mejoras,
            Category::Preventivo => self.preventivo,
            Category::Cbm => self.cbm,
        }
    }

    pub fn set(&mut self, category: Category, amount: f64) {
        let slot = match category {
            Category::Reactivas => &mut self.reactivas,
            Category::Falla => &mut self.falla,
            Category::Mejoras => &mut self.mejoras,
            Category::Preventivo => &mut self.preventivo,
            Category::Cbm => &mut self.cbm,
        };
        *slot = amount;
    }

    /// Sum in canonical order; `Gasto_Total` is always this value.
    pub fn total(&self) -> f64 {
        self.reactivas + self.falla + self.mejoras + self.preventivo + self.cbm
    }
}

// ---------------------------------------------------------------------------
// MaintenanceRecord – one row of the normalized sheet
// ---------------------------------------------------------------------------

pub const COL_EQUIPO: &str = "Equipo";
pub const COL_DESCRIPCION: &str = "Descripcion";
pub const COL_FECHA_INSTALACION: &str = "Fecha_Instalacion";
pub const COL_GASTO_TOTAL: &str = "Gasto_Total";
pub const COL_ANIO: &str = "Año";

/// One equipment's cumulative expenditure entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceRecord {
    pub equipo: Option<String>,
    pub descripcion: Option<String>,
    pub fecha_instalacion: Option<NaiveDate>,
    pub amounts: CategoryAmounts,
    pub gasto_total: f64,
    pub anio: Option<i32>,
    /// Columns that are not part of the typed model, by normalized header.
    pub extra: BTreeMap<String, CellValue>,
}

impl MaintenanceRecord {
    /// Build a record, deriving `gasto_total` and `anio`.
    pub fn new(
        equipo: Option<String>,
        descripcion: Option<String>,
        fecha_instalacion: Option<NaiveDate>,
        amounts: CategoryAmounts,
        extra: BTreeMap<String, CellValue>,
    ) -> Self {
        MaintenanceRecord {
            equipo,
            descripcion,
            fecha_instalacion,
            gasto_total: amounts.total(),
            anio: fecha_instalacion.map(|d| d.year()),
            amounts,
            extra,
        }
    }

    pub fn amount(&self, category: Category) -> f64 {
        self.amounts.get(category)
    }

    /// Value of any output column, typed fields included.
    pub fn value(&self, column: &str) -> CellValue {
        if let Some(cat) = Category::from_column_name(column) {
            return CellValue::Float(self.amount(cat));
        }
        match column {
            COL_EQUIPO => text_cell(&self.equipo),
            COL_DESCRIPCION => text_cell(&self.descripcion),
            COL_FECHA_INSTALACION => self
                .fecha_instalacion
                .map(CellValue::Date)
                .unwrap_or(CellValue::Null),
            COL_GASTO_TOTAL => CellValue::Float(self.gasto_total),
            COL_ANIO => self
                .anio
                .map(|y| CellValue::Integer(y as i64))
                .unwrap_or(CellValue::Null),
            other => self.extra.get(other).cloned().unwrap_or(CellValue::Null),
        }
    }
}

fn text_cell(value: &Option<String>) -> CellValue {
    value
        .as_ref()
        .map(|s| CellValue::String(s.clone()))
        .unwrap_or(CellValue::Null)
}

// ---------------------------------------------------------------------------
// LoadReport – what normalization had to default
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Categories whose column was missing and were filled with zeros.
    pub defaulted_categories: Vec<Category>,
    /// Zero-based row indices whose installation date could not be parsed.
    pub unparseable_dates: Vec<usize>,
    /// Amount cells holding non-numeric text, counted as 0.
    pub non_numeric_amounts: usize,
}

// ---------------------------------------------------------------------------
// MaintenanceDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The normalized dataset. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceDataset {
    records: Vec<MaintenanceRecord>,
    /// Output column names in display order.
    column_names: Vec<String>,
    report: LoadReport,
}

impl MaintenanceDataset {
    pub fn new(records: Vec<MaintenanceRecord>, column_names: Vec<String>, report: LoadReport) -> Self {
        MaintenanceDataset {
            records,
            column_names,
            report,
        }
    }

    pub fn records(&self) -> &[MaintenanceRecord] {
        &self.records
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct equipment identifiers in first-appearance order.
    pub fn equipos(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .filter_map(|r| r.equipo.as_deref())
            .filter(|e| seen.insert(*e))
            .collect()
    }

    /// The `Gasto_Total` column.
    pub fn gasto_totals(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.gasto_total).collect()
    }

    /// One category column over the whole dataset.
    pub fn category_values(&self, category: Category) -> Vec<f64> {
        self.records.iter().map(|r| r.amount(category)).collect()
    }
}
