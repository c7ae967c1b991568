use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::error::MateriaError;
use crate::parsing::normalize::normalize_header;

/// A column the loaders know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Structure,
    Equipment,
    Conductor,
    Pole,
    ItemCode,
    ItemDescription,
    Unit,
    Quantity,
}

impl Column {
    /// Header name as it appears in source spreadsheets.
    pub fn header(self) -> &'static str {
        match self {
            Column::Structure => "ESTRUTURA",
            Column::Equipment => "EQUIPAMENTO",
            Column::Conductor => "CONDUTOR",
            Column::Pole => "POSTE",
            Column::ItemCode => "CODIGO",
            Column::ItemDescription => "DESCRIÇÃO",
            Column::Unit => "UNIDADE",
            Column::Quantity => "QUANTIDADE",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

pub const KEY_COLUMNS: [Column; 4] = [
    Column::Structure,
    Column::Equipment,
    Column::Conductor,
    Column::Pole,
];

pub const CATALOG_COLUMNS: [Column; 8] = [
    Column::Structure,
    Column::Equipment,
    Column::Conductor,
    Column::Pole,
    Column::ItemCode,
    Column::ItemDescription,
    Column::Unit,
    Column::Quantity,
];

pub const PROJECT_COLUMNS: [Column; 5] = [
    Column::Structure,
    Column::Equipment,
    Column::Conductor,
    Column::Pole,
    Column::Quantity,
];

// Spreadsheets exported from different tools drop the accents now and then.
static ALIASES: LazyLock<HashMap<&'static str, Column>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("ESTRUTURA", Column::Structure);
    m.insert("EQUIPAMENTO", Column::Equipment);
    m.insert("CONDUTOR", Column::Conductor);
    m.insert("POSTE", Column::Pole);
    m.insert("CODIGO", Column::ItemCode);
    m.insert("CÓDIGO", Column::ItemCode);
    m.insert("DESCRIÇÃO", Column::ItemDescription);
    m.insert("DESCRICAO", Column::ItemDescription);
    m.insert("DESCRIÇAO", Column::ItemDescription);
    m.insert("DESCRICÃO", Column::ItemDescription);
    m.insert("UNIDADE", Column::Unit);
    m.insert("QUANTIDADE", Column::Quantity);
    m
});

/// Identify which known column a header names, if any.
pub fn classify_header(raw: &str) -> Option<Column> {
    ALIASES.get(normalize_header(raw).as_str()).copied()
}

/// Positions of the known columns within one table.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    positions: HashMap<Column, usize>,
}

impl ColumnIndex {
    /// Map headers to columns, failing with the full list of any `required`
    /// column that is absent. The first occurrence of a repeated header wins.
    pub fn resolve(
        headers: &[String],
        required: &[Column],
        source_name: &str,
    ) -> Result<ColumnIndex, MateriaError> {
        let mut positions = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            if let Some(col) = classify_header(h) {
                positions.entry(col).or_insert(i);
            }
        }

        let missing: Vec<String> = required
            .iter()
            .filter(|c| !positions.contains_key(c))
            .map(|c| c.header().to_string())
            .collect();

        if !missing.is_empty() {
            return Err(MateriaError::Schema {
                source_name: source_name.to_string(),
                missing,
            });
        }

        Ok(ColumnIndex { positions })
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions.get(&column).copied()
    }

    /// Source header text of each of `columns` that is present.
    pub fn headers_of<'a>(&self, headers: &'a [String], columns: &[Column]) -> Vec<&'a str> {
        columns
            .iter()
            .filter_map(|c| self.position(*c))
            .filter_map(|i| headers.get(i))
            .map(|h| h.as_str())
            .collect()
    }

    /// Cell of `row` for `column`, or `""` if the row is short or the column absent.
    pub fn cell<'a>(&self, row: &'a [String], column: Column) -> &'a str {
        self.position(column)
            .and_then(|i| row.get(i))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}
