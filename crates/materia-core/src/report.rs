use std::io::Write;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MateriaError;
use crate::model::ConsolidatedLineItem;

pub const REPORT_HEADERS: [&str; 4] = ["CODIGO", "DESCRIÇÃO", "UNIDADE", "QTD_TOTAL"];

/// The consolidated materials list for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedReport {
    pub project_name: String,
    pub items: Vec<ConsolidatedLineItem>,
    /// Project lines that fed the report.
    pub line_count: usize,
}

impl ConsolidatedReport {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of every item's total, mixed units included.
    pub fn grand_total(&self) -> Decimal {
        self.items.iter().map(|i| i.total_quantity).sum()
    }

    /// Write the report as CSV: one header row, then one row per item.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), MateriaError> {
        let mut w = csv::Writer::from_writer(writer);
        w.write_record(REPORT_HEADERS)?;
        for item in &self.items {
            w.write_record([
                item.item_code.as_str(),
                item.item_description.as_str(),
                item.unit.as_str(),
                &item.total_quantity.to_string(),
            ])?;
        }
        w.flush()?;
        Ok(())
    }

    /// Write the CSV into `dir` under the conventional file name.
    ///
    /// The file only appears once fully written.
    pub fn write_to_dir(&self, dir: &Path, prefix: &str) -> Result<PathBuf, MateriaError> {
        let path = dir.join(report_file_name(prefix, &self.project_name, "csv"));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        self.write_csv(&mut tmp)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| MateriaError::Io(e.error))?;
        tracing::info!(path = %path.display(), items = self.items.len(), "report written");
        Ok(path)
    }
}

/// Keep alphanumerics, spaces, hyphens and underscores; trim the result.
pub fn sanitize_project_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// `"{prefix} - {name}.{ext}"`, or `"{prefix}.{ext}"` when nothing of the
/// name survives sanitizing.
pub fn report_file_name(prefix: &str, project_name: &str, ext: &str) -> String {
    let clean = sanitize_project_name(project_name);
    if clean.is_empty() {
        format!("{prefix}.{ext}")
    } else {
        format!("{prefix} - {clean}.{ext}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(code: &str, desc: &str, qty: Decimal) -> ConsolidatedLineItem {
        ConsolidatedLineItem {
            item_code: code.into(),
            item_description: desc.into(),
            unit: "UN".into(),
            total_quantity: qty,
        }
    }

    fn report() -> ConsolidatedReport {
        ConsolidatedReport {
            project_name: "Rede, Vila Nova".into(),
            items: vec![item("001", "ARRUELA", dec!(4)), item("010", "CABO 4 CAA", dec!(12.5))],
            line_count: 3,
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_project_name("  Obra #12 / Fase_2-A  "), "Obra 12  Fase_2-A");
        assert_eq!(sanitize_project_name("São João"), "São João");
        assert_eq!(sanitize_project_name("../../"), "");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            report_file_name("Ceminas - Materiais", "Vila Nova", "csv"),
            "Ceminas - Materiais - Vila Nova.csv"
        );
        assert_eq!(
            report_file_name("Ceminas - Materiais", " ?! ", "csv"),
            "Ceminas - Materiais.csv"
        );
    }

    #[test]
    fn test_write_csv() {
        let mut buf = Vec::new();
        report().write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "CODIGO,DESCRIÇÃO,UNIDADE,QTD_TOTAL\n001,ARRUELA,UN,4\n010,CABO 4 CAA,UN,12.5\n"
        );
    }

    #[test]
    fn test_counts() {
        let r = report();
        assert_eq!(r.item_count(), 2);
        assert_eq!(r.grand_total(), dec!(16.5));
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = report().write_to_dir(dir.path(), "Materiais").unwrap();
        assert_eq!(path.file_name().unwrap(), "Materiais - Rede Vila Nova.csv");
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("CODIGO,DESCRIÇÃO,UNIDADE,QTD_TOTAL\n"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
