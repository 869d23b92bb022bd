use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};

use super::header::{resolve_headers, source_header};
use super::model::{
    CategoryAmounts, Category, CellValue, LoadReport, MaintenanceDataset, MaintenanceRecord,
    COL_ANIO, COL_DESCRIPCION, COL_EQUIPO, COL_FECHA_INSTALACION, COL_GASTO_TOTAL,
};

// ---------------------------------------------------------------------------
// RawTable – what a file reader hands to the normalizer
// ---------------------------------------------------------------------------

/// Header row plus data rows exactly as read, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

// ---------------------------------------------------------------------------
// Per-cell interpretation
// ---------------------------------------------------------------------------

/// Outcome of reading the installation date of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallDate {
    Parsed(NaiveDate),
    /// Empty cell.
    Missing,
    /// Something was there but it is not a date.
    Unparseable,
}

impl InstallDate {
    pub fn date(self) -> Option<NaiveDate> {
        match self {
            InstallDate::Parsed(d) => Some(d),
            InstallDate::Missing | InstallDate::Unparseable => None,
        }
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

pub fn parse_install_date(cell: &CellValue) -> InstallDate {
    if cell.is_null() {
        return InstallDate::Missing;
    }
    match cell {
        CellValue::Date(d) => InstallDate::Parsed(*d),
        CellValue::String(s) => {
            let s = s.trim();
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .or_else(|| {
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                        .map(|dt| dt.date())
                })
                .map(InstallDate::Parsed)
                .unwrap_or(InstallDate::Unparseable)
        }
        // Bare numbers are not dates: only typed date cells or date text count.
        _ => InstallDate::Unparseable,
    }
}

/// Outcome of reading one category amount.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Amount {
    Value(f64),
    Blank,
    NonNumeric,
}

fn parse_amount(cell: &CellValue) -> Amount {
    if cell.is_null() {
        return Amount::Blank;
    }
    let value = match cell {
        CellValue::Float(v) => Some(*v),
        CellValue::Integer(i) => Some(*i as f64),
        CellValue::String(s) => {
            let cleaned: String = s.chars().filter(|c| !matches!(c, ',' | '$' | ' ')).collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };
    match value {
        Some(v) if v.is_finite() => Amount::Value(v),
        Some(_) => Amount::Blank,
        None => Amount::NonNumeric,
    }
}

// ---------------------------------------------------------------------------
// Table → dataset
// ---------------------------------------------------------------------------

/// Turn a raw table into the normalized dataset.
///
/// Never fails: missing category columns become zeros and bad dates become
/// `None`. Both are recorded in the dataset's [`LoadReport`].
pub fn normalize(raw: RawTable) -> MaintenanceDataset {
    let headers = resolve_headers(&raw.headers);
    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();

    let mut report = LoadReport::default();

    let mut category_cols: Vec<(Category, Option<usize>)> = Vec::with_capacity(Category::ALL.len());
    for cat in Category::ALL {
        let idx = index.get(cat.column_name()).copied();
        if idx.is_none() {
            log::warn!(
                "column {:?} not found, treating {} as 0",
                source_header(cat),
                cat.column_name()
            );
            report.defaulted_categories.push(cat);
        }
        category_cols.push((cat, idx));
    }

    let equipo_idx = index.get(COL_EQUIPO).copied();
    let descripcion_idx = index.get(COL_DESCRIPCION).copied();
    let fecha_idx = index.get(COL_FECHA_INSTALACION).copied();
    if equipo_idx.is_none() {
        log::warn!("column {COL_EQUIPO:?} not found, equipment selection will be empty");
    }

    // Source columns named like a derived column are replaced by it.
    let derived = [COL_GASTO_TOTAL, COL_ANIO];
    let extra_cols: Vec<(usize, &String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            !derived.contains(&h.as_str())
                && Category::from_column_name(h).is_none()
                && ![COL_EQUIPO, COL_DESCRIPCION, COL_FECHA_INSTALACION].contains(&h.as_str())
        })
        .collect();

    let mut column_names: Vec<String> = headers
        .iter()
        .filter(|h| !derived.contains(&h.as_str()))
        .cloned()
        .collect();
    column_names.extend(
        report
            .defaulted_categories
            .iter()
            .map(|c| c.column_name().to_string()),
    );
    column_names.push(COL_GASTO_TOTAL.to_string());
    column_names.push(COL_ANIO.to_string());

    let null = CellValue::Null;
    let mut records = Vec::with_capacity(raw.rows.len());

    for (row_idx, row) in raw.rows.iter().enumerate() {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or(&null);

        let mut amounts = CategoryAmounts::default();
        for (cat, idx) in &category_cols {
            match parse_amount(cell(*idx)) {
                Amount::Value(v) => amounts.set(*cat, v),
                Amount::Blank => {}
                Amount::NonNumeric => {
                    log::debug!("row {row_idx}: non-numeric {} amount {:?}", cat, cell(*idx));
                    report.non_numeric_amounts += 1;
                }
            }
        }

        let install = parse_install_date(cell(fecha_idx));
        if install == InstallDate::Unparseable {
            log::debug!("row {row_idx}: unreadable installation date {:?}", cell(fecha_idx));
            report.unparseable_dates.push(row_idx);
        }
        let fecha = install.date();

        let extra: BTreeMap<String, CellValue> = extra_cols
            .iter()
            .map(|(i, name)| ((*name).clone(), row.get(*i).cloned().unwrap_or(CellValue::Null)))
            .collect();

        records.push(MaintenanceRecord::new(
            cell(equipo_idx).as_text(),
            cell(descripcion_idx).as_text(),
            fecha,
            amounts,
            extra,
        ));
    }

    if !report.unparseable_dates.is_empty() {
        log::warn!(
            "{} row(s) with an unreadable installation date, year left empty",
            report.unparseable_dates.len()
        );
    }
    if report.non_numeric_amounts > 0 {
        log::warn!(
            "{} non-numeric amount cell(s) counted as 0",
            report.non_numeric_amounts
        );
    }

    MaintenanceDataset::new(records, column_names, report)
}
