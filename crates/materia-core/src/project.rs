use std::path::Path;

use crate::config::ConsolidateOptions;
use crate::error::MateriaError;
use crate::extraction::{is_blank, read_table_file, RawTable};
use crate::model::{CompositeKey, Loaded, ProjectLine, SkippedRow};
use crate::parsing::columns::{Column, ColumnIndex, KEY_COLUMNS, PROJECT_COLUMNS};
use crate::parsing::normalize::normalize_table;
use crate::parsing::values::parse_count;

/// Load project lines from a parsed table.
///
/// Rows whose count is not a positive whole number are rejected here,
/// before anything is multiplied, and reported as skipped. Rows are kept
/// in source order; repeated configurations stay separate lines.
pub fn load_project(
    table: &RawTable,
    source_name: &str,
) -> Result<Loaded<Vec<ProjectLine>>, MateriaError> {
    let columns = ColumnIndex::resolve(&table.headers, &PROJECT_COLUMNS, source_name)?;
    let table = normalize_table(table, &columns.headers_of(&table.headers, &KEY_COLUMNS));

    let mut lines = Vec::new();
    let mut skipped = Vec::new();

    for (i, row) in table.rows.iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        let row_no = table.source_row(i);

        let key = CompositeKey {
            structure: columns.cell(row, Column::Structure).to_string(),
            equipment: columns.cell(row, Column::Equipment).to_string(),
            conductor: columns.cell(row, Column::Conductor).to_string(),
            pole: columns.cell(row, Column::Pole).to_string(),
        };

        if key.structure.is_empty() {
            skipped.push(SkippedRow {
                row: row_no,
                reason: "missing structure".into(),
            });
            continue;
        }

        match parse_count(columns.cell(row, Column::Quantity)) {
            Ok(count) => lines.push(ProjectLine::new(key, count)),
            Err(e) => skipped.push(SkippedRow {
                row: row_no,
                reason: e.to_string(),
            }),
        }
    }

    for s in &skipped {
        tracing::warn!(source = source_name, row = s.row, reason = %s.reason, "project row skipped");
    }
    tracing::info!(
        source = source_name,
        lines = lines.len(),
        skipped = skipped.len(),
        "project loaded"
    );

    Ok(Loaded {
        value: lines,
        skipped,
        warnings: Vec::new(),
    })
}

/// Read a project file (xlsx, xls or csv) and load it.
pub fn load_project_file(
    path: &Path,
    options: &ConsolidateOptions,
) -> Result<Loaded<Vec<ProjectLine>>, MateriaError> {
    let table = read_table_file(path, options.sheet.as_deref())?;
    load_project(&table, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::delimited::CsvSource;
    use crate::extraction::TableSource;
    use std::io::Write;

    fn csv_table(text: &str) -> RawTable {
        CsvSource::default().read_table(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_load_basic() {
        let t = csv_table(
            "ESTRUTURA,EQUIPAMENTO,CONDUTOR,POSTE,QUANTIDADE\n n1 ,x,1/0 caa,dt 11/300,3\nN2,Y,2,P1,1\n",
        );
        let loaded = load_project(&t, "project").unwrap();
        assert_eq!(loaded.value.len(), 2);
        assert_eq!(
            loaded.value[0],
            ProjectLine::new(CompositeKey::new("N1", "X", "1/0 CAA", "DT 11/300"), 3)
        );
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn test_missing_quantity_column() {
        let t = csv_table("ESTRUTURA,EQUIPAMENTO,CONDUTOR,POSTE\nN1,X,1,P1\n");
        let err = load_project(&t, "project").unwrap_err();
        match err {
            MateriaError::Schema { missing, .. } => assert_eq!(missing, vec!["QUANTIDADE"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_counts_rejected_at_load() {
        let t = csv_table(
            "ESTRUTURA;EQUIPAMENTO;CONDUTOR;POSTE;QUANTIDADE\nN1;X;1;P1;2,5\nN1;X;1;P1;0\nN1;X;1;P1;-3\nN1;X;1;P1;4\n",
        );
        let loaded = load_project(&t, "project").unwrap();
        assert_eq!(loaded.value.len(), 1);
        assert_eq!(loaded.value[0].declared_count, 4);
        let rows: Vec<usize> = loaded.skipped.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![2, 3, 4]);
    }

    #[test]
    fn test_missing_optional_key_cells_become_empty() {
        let t = csv_table("ESTRUTURA,EQUIPAMENTO,CONDUTOR,POSTE,QUANTIDADE\nN1,,,,2\n");
        let loaded = load_project(&t, "project").unwrap();
        assert_eq!(loaded.value[0].key, CompositeKey::new("N1", "", "", ""));
    }

    #[test]
    fn test_load_project_file_csv() {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(f, "Estrutura,Equipamento,Condutor,Poste,Quantidade").unwrap();
        writeln!(f, "a,x,1,p1,3").unwrap();
        let loaded = load_project_file(f.path(), &ConsolidateOptions::default()).unwrap();
        assert_eq!(
            loaded.value,
            vec![ProjectLine::new(CompositeKey::new("A", "X", "1", "P1"), 3)]
        );
    }
}
