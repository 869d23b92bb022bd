use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Date32Builder, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

/// Headers as they appear in the exported workbook, line breaks and all.
const HEADERS: [&str; 9] = [
    "Equipo",
    "Descripción Equipo",
    "Fecha Instal.\n",
    "GOT Reactivas. (USD)",
    "GOT A Falla (USD)",
    "GOT Mejoras  (USD)",
    "GOT Preven. (USD)",
    " GOT CBM (USD)",
    "Ubicación Técnica",
];

const DESCRIPTIONS: [&str; 12] = [
    "Bomba centrífuga",
    "Compresor de aire",
    "Caldera",
    "Torre de enfriamiento",
    "Generador diésel",
    "Transformador",
    "Banda transportadora",
    "Molino de bolas",
    "Intercambiador de calor",
    "Ventilador industrial",
    "Chiller",
    "Montacargas",
];

const AREAS: [&str; 4] = ["Planta Norte", "Planta Sur", "Servicios", "Bodega"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    /// Amount in USD rounded to cents; zero with probability `p_zero`.
    fn amount(&mut self, scale: f64, p_zero: f64) -> f64 {
        if self.next_f64() < p_zero {
            return 0.0;
        }
        (self.next_f64() * scale * 100.0).round() / 100.0
    }
}

enum InstallDate {
    Date(NaiveDate),
    Text(&'static str),
    Blank,
}

struct SampleRow {
    equipo: String,
    descripcion: &'static str,
    fecha: InstallDate,
    amounts: [f64; 5],
    area: &'static str,
}

fn generate_rows(count: usize, rng: &mut SimpleRng) -> Vec<SampleRow> {
    (0..count)
        .map(|i| {
            let descripcion = DESCRIPTIONS[rng.below(DESCRIPTIONS.len() as u64) as usize];
            let fecha = match i % 17 {
                5 => InstallDate::Blank,
                11 => InstallDate::Text("por confirmar"),
                _ => {
                    let year = 2010 + rng.below(14) as i32;
                    let month = 1 + rng.below(12) as u32;
                    let day = 1 + rng.below(28) as u32;
                    NaiveDate::from_ymd_opt(year, month, day)
                        .map(InstallDate::Date)
                        .unwrap_or(InstallDate::Blank)
                }
            };
            SampleRow {
                equipo: format!("EQ-{:04}", 1000 + i),
                descripcion,
                fecha,
                amounts: [
                    rng.amount(8_000.0, 0.3),
                    rng.amount(15_000.0, 0.4),
                    rng.amount(20_000.0, 0.6),
                    rng.amount(12_000.0, 0.2),
                    rng.amount(5_000.0, 0.7),
                ],
                area: AREAS[rng.below(AREAS.len() as u64) as usize],
            }
        })
        .collect()
}

fn write_xlsx(rows: &[SampleRow], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold().set_text_wrap();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    let money_format = Format::new().set_num_format("#,##0.00");

    let sheet = workbook.add_worksheet();
    sheet.set_name("Gasto x Equipo")?;
    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, row.equipo.as_str())?;
        sheet.write_string(r, 1, row.descripcion)?;
        match &row.fecha {
            InstallDate::Date(d) => {
                let date = ExcelDateTime::parse_from_str(&d.format("%Y-%m-%d").to_string())?;
                sheet.write_datetime_with_format(r, 2, &date, &date_format)?;
            }
            InstallDate::Text(t) => {
                sheet.write_string(r, 2, *t)?;
            }
            InstallDate::Blank => {}
        }
        for (j, amount) in row.amounts.iter().enumerate() {
            sheet.write_number_with_format(r, 3 + j as u16, *amount, &money_format)?;
        }
        sheet.write_string(r, 8, row.area)?;
    }
    sheet.set_column_width(1, 26)?;
    sheet.set_column_width(8, 18)?;

    workbook
        .save(path)
        .with_context(|| format!("saving {}", path.display()))?;
    Ok(())
}

fn write_csv(rows: &[SampleRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(HEADERS)?;
    for row in rows {
        let fecha = match &row.fecha {
            InstallDate::Date(d) => d.format("%Y-%m-%d").to_string(),
            InstallDate::Text(t) => t.to_string(),
            InstallDate::Blank => String::new(),
        };
        let mut record = vec![row.equipo.clone(), row.descripcion.to_string(), fecha];
        record.extend(row.amounts.iter().map(|a| format!("{a:.2}")));
        record.push(row.area.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[SampleRow], path: &Path) -> Result<()> {
    let mut dates = Date32Builder::new();
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch")?;
    for row in rows {
        match &row.fecha {
            InstallDate::Date(d) => dates.append_value((*d - epoch).num_days() as i32),
            InstallDate::Text(_) | InstallDate::Blank => dates.append_null(),
        }
    }

    let mut fields = vec![
        Field::new(HEADERS[0], DataType::Utf8, false),
        Field::new(HEADERS[1], DataType::Utf8, false),
        Field::new(HEADERS[2], DataType::Date32, true),
    ];
    for header in &HEADERS[3..8] {
        fields.push(Field::new(*header, DataType::Float64, false));
    }
    fields.push(Field::new(HEADERS[8], DataType::Utf8, false));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<arrow::array::ArrayRef> = vec![
        Arc::new(StringArray::from(rows.iter().map(|r| r.equipo.as_str()).collect::<Vec<_>>())),
        Arc::new(StringArray::from(rows.iter().map(|r| r.descripcion).collect::<Vec<_>>())),
        Arc::new(dates.finish()),
    ];
    for j in 0..5 {
        columns.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.amounts[j]).collect::<Vec<_>>(),
        )));
    }
    columns.push(Arc::new(StringArray::from(rows.iter().map(|r| r.area).collect::<Vec<_>>())));

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let output_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_gastos.xlsx"));

    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(120, &mut rng);

    let ext = output_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" => write_xlsx(&rows, &output_path)?,
        "csv" => write_csv(&rows, &output_path)?,
        "parquet" | "pq" => write_parquet(&rows, &output_path)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    log::info!("Wrote {} equipment rows to {}", rows.len(), output_path.display());
    println!("Wrote {} equipment rows to {}", rows.len(), output_path.display());
    Ok(())
}
