use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use super::model::{CellValue, Table};
use crate::error::SiftError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Declared format of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Comma-separated text, first row = header names.
    Csv,
    /// Office Open XML spreadsheet, first worksheet, first row = header names.
    Xlsx,
}

impl TableFormat {
    /// Dispatch by file extension. Anything but `.csv` / `.xlsx` is
    /// unsupported.
    pub fn from_name(name: &str) -> Result<TableFormat, SiftError> {
        let ext = name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xlsx" => Ok(TableFormat::Xlsx),
            _ => Err(SiftError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Parse uploaded bytes into a [`Table`] according to the declared format.
///
/// The whole file is materialized in memory; there is no streaming mode and
/// no side effect beyond reading the input.
pub fn load_table(bytes: &[u8], format: TableFormat) -> Result<Table, SiftError> {
    let table = match format {
        TableFormat::Csv => load_csv(bytes)?,
        TableFormat::Xlsx => load_xlsx(bytes)?,
    };
    log::info!(
        "loaded table: {} columns, {} rows",
        table.headers.len(),
        table.len()
    );
    Ok(table)
}

/// Convenience wrapper: dispatch by file name, then parse.
pub fn load_named(bytes: &[u8], name: &str) -> Result<Table, SiftError> {
    load_table(bytes, TableFormat::from_name(name)?)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(bytes: &[u8]) -> Result<Table, SiftError> {
    let mut reader = csv::Reader::from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SiftError::Parse(format!("reading CSV headers: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| SiftError::Parse(format!("CSV row {row_no}: {e}")))?;
        rows.push(record.iter().map(CellValue::parse).collect());
    }

    Table::new(headers, rows)
}

// ---------------------------------------------------------------------------
// XLSX loader
// ---------------------------------------------------------------------------

/// Read the first worksheet of an XLSX workbook. The first row is taken as
/// header names; header cells are stringified whatever their cell type.
fn load_xlsx(bytes: &[u8]) -> Result<Table, SiftError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| SiftError::Parse(format!("opening XLSX workbook: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| SiftError::Parse("XLSX workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| SiftError::Parse(format!("reading sheet '{sheet_name}': {e}")))?;

    let mut row_iter = range.rows();
    let headers: Vec<String> = match row_iter.next() {
        Some(header_row) => header_row.iter().map(data_to_header).collect(),
        None => return Err(SiftError::Parse("XLSX sheet is empty".to_string())),
    };

    let mut rows = Vec::new();
    for raw in row_iter {
        let mut row: Vec<CellValue> = raw.iter().map(data_to_cell).collect();
        // calamine trims trailing empty cells from short rows; pad back out
        // to the header width so the table invariant holds.
        if row.len() < headers.len() {
            row.resize(headers.len(), CellValue::Null);
        }
        rows.push(row);
    }

    Table::new(headers, rows)
}

fn data_to_header(data: &Data) -> String {
    match data {
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::parse(s),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        // Formula error cells (#DIV/0! etc.) carry no usable value.
        Data::Error(_) => CellValue::Null,
    }
}
