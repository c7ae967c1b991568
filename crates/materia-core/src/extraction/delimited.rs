use csv::ReaderBuilder;

use crate::error::MateriaError;
use crate::extraction::{is_blank, RawTable, TableSource};

/// Delimited text backend.
///
/// With no explicit delimiter, `;` is used when the first line has more
/// semicolons than commas (spreadsheet exports in pt-BR locales), `,`
/// otherwise.
#[derive(Debug, Clone, Default)]
pub struct CsvSource {
    delimiter: Option<u8>,
}

impl CsvSource {
    pub fn with_delimiter(delimiter: u8) -> Self {
        CsvSource {
            delimiter: Some(delimiter),
        }
    }
}

impl TableSource for CsvSource {
    fn read_table(&self, bytes: &[u8]) -> Result<RawTable, MateriaError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(bytes));

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| MateriaError::unavailable("csv", e))?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let header_idx = rows
            .iter()
            .position(|r| !is_blank(r))
            .ok_or_else(|| MateriaError::unavailable("csv", "file is empty"))?;

        let headers = rows[header_idx].iter().map(|h| h.trim().to_string()).collect();
        let data = rows.split_off(header_idx + 1);

        Ok(RawTable {
            headers,
            rows: data,
            header_row: header_idx + 1,
        })
    }

    fn backend_name(&self) -> &str {
        "csv"
    }
}

fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|&b| b == b'\n').next().unwrap_or(&[]);
    let semicolons = first_line.iter().filter(|&&b| b == b';').count();
    let commas = first_line.iter().filter(|&&b| b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}
