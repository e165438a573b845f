use rust_xlsxwriter::Workbook;

use super::model::{CellValue, Table};
use crate::error::SiftError;

// ---------------------------------------------------------------------------
// XLSX export
// ---------------------------------------------------------------------------

/// MIME type for the exported workbook, for the download response.
pub const XLSX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Encode a table as a single-sheet XLSX workbook: header row, data rows,
/// no index column. The input table is not touched.
pub fn export_xlsx(table: &Table) -> Result<Vec<u8>, SiftError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in table.headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, name)
            .map_err(serialization)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                CellValue::Number(v) => worksheet.write_number(r, c, *v),
                CellValue::Text(s) => worksheet.write_string(r, c, s),
                CellValue::Null => continue,
            }
            .map_err(serialization)?;
        }
    }

    let bytes = workbook.save_to_buffer().map_err(serialization)?;
    log::info!("exported {} rows ({} bytes)", table.len(), bytes.len());
    Ok(bytes)
}

/// Download name for a filtered export: `filtered_<stem>.xlsx`.
pub fn export_filename(dataset: &str) -> String {
    let stem = dataset.rsplit_once('.').map_or(dataset, |(s, _)| s);
    format!("filtered_{stem}.xlsx")
}

fn serialization(err: rust_xlsxwriter::XlsxError) -> SiftError {
    SiftError::Serialization(err.to_string())
}
