use crate::extraction::RawTable;

/// Canonical form of a key field: surrounding whitespace removed, uppercased.
///
/// Idempotent: `normalize_key_field(normalize_key_field(s)) == normalize_key_field(s)`.
pub fn normalize_key_field(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Canonical form of a column header used for matching.
///
/// Headers match case-insensitively and ignoring all whitespace, so
/// `" Descrição "`, `"DESCRIÇÃO"` and `"QTD TOTAL"`/`"QTD_TOTAL"`-style
/// spacing differences compare equal where intended.
pub fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Normalize the designated key columns of a table.
///
/// Every cell in a column whose header matches one of `key_columns` is
/// trimmed and uppercased. Rows shorter than the header are padded with
/// empty strings, so a missing cell reads as `""`. Other columns are left
/// untouched.
pub fn normalize_table(table: &RawTable, key_columns: &[&str]) -> RawTable {
    let wanted: Vec<String> = key_columns.iter().map(|c| normalize_header(c)).collect();
    let key_idx: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| wanted.contains(&normalize_header(h)))
        .map(|(i, _)| i)
        .collect();

    let width = table.headers.len();
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            if row.len() < width {
                row.resize(width, String::new());
            }
            for &i in &key_idx {
                row[i] = normalize_key_field(&row[i]);
            }
            row
        })
        .collect();

    RawTable {
        headers: table.headers.clone(),
        rows,
        header_row: table.header_row,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: vec!["Estrutura".into(), "Poste".into(), "Descrição".into()],
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            header_row: 1,
        }
    }

    #[test]
    fn test_key_field_trim_and_upper() {
        assert_eq!(normalize_key_field("  n1 "), "N1");
        assert_eq!(normalize_key_field("dt 11/300"), "DT 11/300");
        assert_eq!(normalize_key_field(""), "");
    }

    #[test]
    fn test_key_field_non_ascii() {
        assert_eq!(normalize_key_field(" ção "), "ÇÃO");
    }

    #[test]
    fn test_header_ignores_case_and_whitespace() {
        assert_eq!(normalize_header(" Descrição "), "DESCRIÇÃO");
        assert_eq!(normalize_header("q u a n t i d a d e"), "QUANTIDADE");
    }

    #[test]
    fn test_normalize_table_only_touches_key_columns() {
        let t = table(&[&[" n1 ", "p1", " parafuso "]]);
        let n = normalize_table(&t, &["ESTRUTURA", "POSTE"]);
        assert_eq!(n.rows[0], vec!["N1", "P1", " parafuso "]);
    }

    #[test]
    fn test_normalize_table_pads_missing_cells() {
        let t = table(&[&["n1"]]);
        let n = normalize_table(&t, &["ESTRUTURA", "POSTE"]);
        assert_eq!(n.rows[0], vec!["N1", "", ""]);
    }

    #[test]
    fn test_normalize_table_idempotent() {
        let t = table(&[&[" n1 ", " p1 ", "x"], &["", "DT 11/300 ", ""], &["b2"]]);
        let keys = ["ESTRUTURA", "POSTE"];
        let once = normalize_table(&t, &keys);
        let twice = normalize_table(&once, &keys);
        assert_eq!(once, twice);
    }
}
