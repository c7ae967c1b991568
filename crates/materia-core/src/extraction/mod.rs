pub mod delimited;
pub mod xlsx;

use std::path::Path;

use crate::error::MateriaError;

/// A sheet of text cells as read from a source file, before any
/// interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    /// Data rows in source order, blank rows included so row numbers stay
    /// meaningful.
    pub rows: Vec<Vec<String>>,
    /// 1-based row number of the header in the source.
    pub header_row: usize,
}

impl RawTable {
    /// 1-based source row number of data row `idx`.
    pub fn source_row(&self, idx: usize) -> usize {
        self.header_row + 1 + idx
    }
}

pub(crate) fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Trait for tabular input backends.
pub trait TableSource: Send + Sync {
    /// Read the first table of the document in `bytes`.
    fn read_table(&self, bytes: &[u8]) -> Result<RawTable, MateriaError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Pick a backend by file extension.
pub fn source_for_path(
    path: &Path,
    sheet: Option<&str>,
) -> Result<Box<dyn TableSource>, MateriaError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => Ok(Box::new(xlsx::XlsxSource::new(
            sheet.map(str::to_string),
        ))),
        "csv" | "txt" => Ok(Box::new(delimited::CsvSource::default())),
        _ => Err(MateriaError::unavailable(
            path.display().to_string(),
            format!("unsupported file type '.{ext}' (expected .xlsx, .xls or .csv)"),
        )),
    }
}

/// Read a whole file and parse it with the backend matching its extension.
///
/// Either the full table is returned or nothing is: IO and parse failures
/// both surface as `SourceUnavailable`.
pub fn read_table_file(path: &Path, sheet: Option<&str>) -> Result<RawTable, MateriaError> {
    let source = source_for_path(path, sheet)?;
    let bytes = std::fs::read(path)
        .map_err(|e| MateriaError::unavailable(path.display().to_string(), e))?;
    tracing::debug!(
        path = %path.display(),
        backend = source.backend_name(),
        bytes = bytes.len(),
        "reading table"
    );
    source.read_table(&bytes).map_err(|e| match e {
        MateriaError::SourceUnavailable { reason, .. } => {
            MateriaError::unavailable(path.display().to_string(), reason)
        }
        other => other,
    })
}
