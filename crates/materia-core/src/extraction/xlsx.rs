use std::io::Cursor;

use calamine::{Data, Reader};

use crate::error::MateriaError;
use crate::extraction::{is_blank, RawTable, TableSource};

/// Spreadsheet backend (xlsx, xls, ods) built on calamine.
///
/// Reads the named sheet, or the first sheet when none is given. The first
/// non-blank row is taken as the header.
#[derive(Debug, Clone, Default)]
pub struct XlsxSource {
    sheet: Option<String>,
}

impl XlsxSource {
    pub fn new(sheet: Option<String>) -> Self {
        XlsxSource { sheet }
    }
}

impl TableSource for XlsxSource {
    fn read_table(&self, bytes: &[u8]) -> Result<RawTable, MateriaError> {
        let cursor = Cursor::new(bytes);
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| MateriaError::unavailable("spreadsheet", format!("failed to open: {e}")))?;

        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| MateriaError::unavailable("spreadsheet", "workbook has no sheets"))?,
        };

        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            MateriaError::unavailable("spreadsheet", format!("sheet '{sheet_name}' not readable: {e}"))
        })?;

        // Range row indices are relative to its start, which may not be A1.
        let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|r| r.iter().map(cell_text).collect())
            .collect();

        let header_idx = rows
            .iter()
            .position(|r| !is_blank(r))
            .ok_or_else(|| MateriaError::unavailable("spreadsheet", format!("sheet '{sheet_name}' is empty")))?;

        let headers = rows[header_idx].iter().map(|h| h.trim().to_string()).collect();
        let data = rows[header_idx + 1..].to_vec();

        Ok(RawTable {
            headers,
            rows: data,
            header_row: first_row + header_idx + 1,
        })
    }

    fn backend_name(&self) -> &str {
        "xlsx"
    }
}

/// Text of a cell. Whole floats print without a trailing ".0".
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format!("{f}"),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => format!("{cell}"),
    }
}
