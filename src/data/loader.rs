use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::LoadError;
use super::model::{CellValue, MaintenanceDataset};
use super::normalize::{normalize, RawTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Knobs for reading the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Worksheet to read; the first sheet when `None`.
    pub sheet: Option<String>,
}

/// Load and normalize a maintenance expenditure file. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – first (or configured) worksheet
/// * `.csv`     – header row followed by data rows
/// * `.json`    – `[{ "Equipo": ..., "GOT CBM (USD)": ..., ... }, ...]`
/// * `.parquet` – one column per header
pub fn load_file_with(path: &Path, options: &LoadOptions) -> Result<MaintenanceDataset, LoadError> {
    let raw = read_table(path, options)?;
    let dataset = normalize(raw);
    log::info!(
        "Loaded {} records from {} with columns {:?}",
        dataset.len(),
        path.display(),
        dataset.column_names()
    );
    Ok(dataset)
}

/// Read the header row and data rows without interpreting them.
pub fn read_table(path: &Path, options: &LoadOptions) -> Result<RawTable, LoadError> {
    let meta = std::fs::metadata(path).map_err(|e| LoadError::file_access(path, e))?;
    if meta.is_dir() {
        return Err(LoadError::file_access(
            path,
            std::io::Error::other("is a directory"),
        ));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path, options)?,
        "csv" => read_csv(path)?,
        "json" => read_json(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => {
            return Err(LoadError::schema(
                path,
                format!("unsupported file extension: .{other}"),
            ))
        }
    };

    if table.headers.is_empty() {
        return Err(LoadError::schema(path, "no header row"));
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Spreadsheet reader
// ---------------------------------------------------------------------------

fn read_workbook(path: &Path, options: &LoadOptions) -> Result<RawTable, LoadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| match e {
        calamine::Error::Io(io) => LoadError::file_access(path, io),
        other => LoadError::schema(path, format!("opening workbook: {other}")),
    })?;

    let sheet_names = workbook.sheet_names();
    let sheet = match &options.sheet {
        Some(name) if sheet_names.iter().any(|s| s == name) => name.clone(),
        Some(name) => {
            return Err(LoadError::schema(
                path,
                format!("sheet {name:?} not found, available: {sheet_names:?}"),
            ))
        }
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| LoadError::schema(path, "workbook has no worksheets"))?,
    };
    log::debug!("reading sheet {sheet:?} of {}", path.display());

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| LoadError::schema(path, format!("reading sheet {sheet:?}: {e}")))?;

    // The range starts at the first used cell. Blank leading columns are put
    // back so they keep their position; blank rows above the header are skipped.
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    if first_row > 0 {
        log::debug!("sheet {sheet:?}: header found at row {}, {first_row} blank row(s) skipped", first_row + 1);
    }
    let lead = first_col as usize;
    if lead > 0 {
        log::debug!("sheet {sheet:?}: {lead} blank leading column(s)");
    }

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => std::iter::repeat(String::new())
            .take(lead)
            .chain(header_row.iter().map(|c| c.to_string()))
            .collect(),
        None => return Err(LoadError::schema(path, format!("sheet {sheet:?} is empty"))),
    };
    let rows = rows
        .map(|row| {
            std::iter::repeat(CellValue::Null)
                .take(lead)
                .chain(row.iter().map(data_to_cell))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| CellValue::Date(d.date()))
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<RawTable, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::file_access(path, e))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::schema(path, format!("reading CSV headers: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| LoadError::schema(path, format!("CSV row {row_no}: {e}")))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok(RawTable { headers, rows })
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.trim().is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn read_json(path: &Path) -> Result<RawTable, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::file_access(path, e))?;
    let root: JsonValue = serde_json::from_str(&text)
        .map_err(|e| LoadError::schema(path, format!("parsing JSON: {e}")))?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::schema(path, "expected a top-level JSON array"))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::schema(path, format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Works with files written by both Pandas (`df.to_parquet()`) and Polars.
fn read_parquet(path: &Path) -> Result<RawTable, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::file_access(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| LoadError::schema(path, format!("reading parquet metadata: {e}")))?;

    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    let reader = builder
        .build()
        .map_err(|e| LoadError::schema(path, format!("building parquet reader: {e}")))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| LoadError::schema(path, format!("reading parquet record batch: {e}")))?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable { headers, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => Some(CellValue::String(col.as_string::<i32>().value(row).to_string())),
        DataType::LargeUtf8 => Some(CellValue::String(col.as_string::<i64>().value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        DataType::Date32 => any
            .downcast_ref::<Date32Array>()
            .and_then(|a| a.value_as_date(row))
            .map(CellValue::Date),
        _ => None,
    };
    value.unwrap_or_else(|| {
        array_value_to_string(col.as_ref(), row)
            .map(CellValue::String)
            .unwrap_or(CellValue::Null)
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{Date32Builder, Float64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDate;
    use parquet::arrow::ArrowWriter;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
    use tempfile::tempdir;

    use super::*;
    use crate::data::model::Category;

    fn load_file(path: &Path) -> Result<MaintenanceDataset, LoadError> {
        load_file_with(path, &LoadOptions::default())
    }

    const CSV_FIXTURE: &str = "\
Equipo,Descripción Equipo,\"  Fecha Instal.\n\",GOT Reactivas. (USD),GOT A Falla (USD),GOT Mejoras (USD),GOT Preven. (USD),GOT CBM (USD),Planta
EQ-1,Bomba,2020-03-01,100,50,0,25,0,Norte
EQ-2,Compresor,2022-07-15,0,0,200,0,10,Sur
";

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).expect("create fixture");
        f.write_all(contents.as_bytes()).expect("write fixture");
        path
    }

    #[test]
    fn csv_loads_and_normalizes() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(dir.path(), "gastos.csv", CSV_FIXTURE);

        let ds = load_file(&path).expect("load csv");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.gasto_totals(), vec![175.0, 210.0]);
        assert_eq!(
            ds.records().iter().map(|r| r.anio).collect::<Vec<_>>(),
            vec![Some(2020), Some(2022)]
        );
        assert!(ds.column_names().iter().any(|c| c == "Fecha_Instalacion"));
        assert_eq!(
            ds.records()[1].extra.get("Planta"),
            Some(&CellValue::String("Sur".into()))
        );
    }

    #[test]
    fn loading_twice_gives_identical_datasets() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(dir.path(), "gastos.csv", CSV_FIXTURE);
        let a = load_file(&path).expect("first load");
        let b = load_file(&path).expect("second load");
        assert_eq!(a, b);
    }

    #[test]
    fn xlsx_with_messy_headers_and_date_cells() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("gastos.xlsx");

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let sheet = workbook.add_worksheet();
        let headers = [
            "Equipo",
            "Descripción  Equipo",
            "  Fecha Instal.\n",
            "GOT Reactivas. (USD)",
            "GOT A Falla (USD)",
            "GOT Mejoras (USD)",
            "GOT Preven. (USD)",
        ];
        for (col, h) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *h).expect("header");
        }
        let rows: [(&str, &str, f64, f64, f64, f64); 2] = [
            ("EQ-1", "Bomba", 100.0, 50.0, 0.0, 25.0),
            ("EQ-2", "Compresor", 0.0, 0.0, 200.0, 0.0),
        ];
        for (i, (eq, desc, r, f, m, p)) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, *eq).expect("equipo");
            sheet.write_string(row, 1, *desc).expect("descripcion");
            sheet.write_number(row, 3, *r).expect("reactivas");
            sheet.write_number(row, 4, *f).expect("falla");
            sheet.write_number(row, 5, *m).expect("mejoras");
            sheet.write_number(row, 6, *p).expect("preventivo");
        }
        let date = ExcelDateTime::from_ymd(2021, 6, 30).expect("date");
        sheet
            .write_datetime_with_format(1, 2, &date, &date_format)
            .expect("date cell");
        sheet.write_string(2, 2, "pendiente").expect("bad date");
        workbook.save(&path).expect("save workbook");

        let ds = load_file(&path).expect("load xlsx");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.report().defaulted_categories, vec![Category::Cbm]);
        assert_eq!(ds.category_values(Category::Cbm), vec![0.0, 0.0]);
        assert_eq!(ds.gasto_totals(), vec![175.0, 200.0]);

        let first = &ds.records()[0];
        assert_eq!(first.descripcion.as_deref(), Some("Bomba"));
        assert_eq!(first.fecha_instalacion, NaiveDate::from_ymd_opt(2021, 6, 30));
        assert_eq!(first.anio, Some(2021));
        assert_eq!(ds.records()[1].anio, None);
        assert_eq!(ds.report().unparseable_dates, vec![1]);
    }

    #[test]
    fn blank_leading_rows_and_columns_keep_header_positions() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("desplazado.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        // Header on row 3, starting at column B.
        sheet.write_string(2, 1, "Equipo").expect("header");
        sheet.write_string(2, 2, "GOT A Falla (USD)").expect("header");
        sheet.write_string(3, 1, "EQ-1").expect("equipo");
        sheet.write_number(3, 2, 40.0).expect("falla");
        workbook.save(&path).expect("save workbook");

        let table = read_table(&path, &LoadOptions::default()).expect("read");
        assert_eq!(table.headers, vec!["", "Equipo", "GOT A Falla (USD)"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], CellValue::Null);

        let ds = load_file(&path).expect("load");
        assert_eq!(ds.column_names()[0], "Unnamed: 0");
        assert_eq!(ds.equipos(), vec!["EQ-1"]);
        assert_eq!(ds.gasto_totals(), vec![40.0]);
    }

    #[test]
    fn unknown_sheet_is_a_schema_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("one.xlsx");
        let mut workbook = Workbook::new();
        workbook
            .add_worksheet()
            .write_string(0, 0, "Equipo")
            .expect("header");
        workbook.save(&path).expect("save workbook");

        let options = LoadOptions {
            sheet: Some("Resumen".into()),
        };
        let err = load_file_with(&path, &options).unwrap_err();
        assert!(matches!(err, LoadError::Schema { .. }), "{err}");
    }

    #[test]
    fn parquet_columns_become_cells() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("gastos.parquet");

        let mut dates = Date32Builder::new();
        // 2020-03-01 and a missing date
        dates.append_value(18322);
        dates.append_null();

        let schema = Arc::new(Schema::new(vec![
            Field::new("Equipo", DataType::Utf8, false),
            Field::new("Fecha Instal.", DataType::Date32, true),
            Field::new("GOT A Falla (USD)", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["EQ-1", "EQ-2"])),
                Arc::new(dates.finish()),
                Arc::new(Float64Array::from(vec![12.5, 7.5])),
            ],
        )
        .expect("batch");
        let file = File::create(&path).expect("create parquet");
        let mut writer = ArrowWriter::try_new(file, schema, None).expect("writer");
        writer.write(&batch).expect("write batch");
        writer.close().expect("close writer");

        let ds = load_file(&path).expect("load parquet");
        assert_eq!(ds.gasto_totals(), vec![12.5, 7.5]);
        assert_eq!(ds.records()[0].anio, Some(2020));
        assert_eq!(ds.records()[1].anio, None);
        assert!(ds.report().unparseable_dates.is_empty());
    }

    #[test]
    fn json_records_keep_first_seen_headers() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(
            dir.path(),
            "gastos.json",
            r#"[{"Equipo": "EQ-1", "GOT CBM (USD)": 10},
                {"Equipo": "EQ-2", "GOT CBM (USD)": 2.5, "Extra": true}]"#,
        );
        let ds = load_file(&path).expect("load json");
        assert_eq!(&ds.column_names()[..3], &["Equipo", "CBM", "Extra"]);
        assert_eq!(ds.gasto_totals(), vec![10.0, 2.5]);
        assert_eq!(ds.records()[0].extra.get("Extra"), Some(&CellValue::Null));
        assert_eq!(ds.records()[1].extra.get("Extra"), Some(&CellValue::Bool(true)));
    }

    #[test]
    fn missing_file_is_a_file_access_error() {
        let dir = tempdir().expect("tempdir");
        let err = load_file(&dir.path().join("nope.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::FileAccess { .. }), "{err}");

        let err = load_file(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::FileAccess { .. }), "{err}");
    }

    #[test]
    fn malformed_inputs_are_schema_errors() {
        let dir = tempdir().expect("tempdir");

        let garbage = write_file(dir.path(), "broken.xlsx", "this is not a zip archive");
        assert!(matches!(load_file(&garbage), Err(LoadError::Schema { .. })));

        let empty = write_file(dir.path(), "empty.csv", "");
        assert!(matches!(load_file(&empty), Err(LoadError::Schema { .. })));

        let txt = write_file(dir.path(), "gastos.txt", "Equipo\nEQ-1\n");
        assert!(matches!(load_file(&txt), Err(LoadError::Schema { .. })));

        let not_array = write_file(dir.path(), "obj.json", r#"{"Equipo": "EQ-1"}"#);
        assert!(matches!(load_file(&not_array), Err(LoadError::Schema { .. })));
    }

    #[test]
    fn header_only_file_loads_empty_dataset() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(dir.path(), "vacio.csv", "Equipo,GOT CBM (USD)\n");
        let ds = load_file(&path).expect("load");
        assert!(ds.is_empty());
        assert!(ds.column_names().iter().any(|c| c == "Gasto_Total"));
    }

    #[test]
    fn csv_cell_types_are_guessed() {
        assert_eq!(guess_cell_type("12"), CellValue::Integer(12));
        assert_eq!(guess_cell_type("12.5"), CellValue::Float(12.5));
        assert_eq!(guess_cell_type(""), CellValue::Null);
        assert_eq!(guess_cell_type("true"), CellValue::Bool(true));
        assert_eq!(guess_cell_type("2020-01-01"), CellValue::String("2020-01-01".into()));
    }
}
