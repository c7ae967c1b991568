use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::config::{ConsolidateOptions, DuplicatePolicy};
use crate::error::MateriaError;
use crate::extraction::{is_blank, read_table_file, RawTable};
use crate::model::{CatalogEntry, CompositeKey, Loaded, SkippedRow};
use crate::parsing::columns::{Column, ColumnIndex, CATALOG_COLUMNS, KEY_COLUMNS};
use crate::parsing::normalize::normalize_table;
use crate::parsing::values::parse_quantity;

/// The reference catalog: which materials each configuration requires.
///
/// Immutable once built. Entries keep their source order; the key index is
/// ordered so every listing derived from it is lexicographic.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_key: BTreeMap<CompositeKey, Vec<usize>>,
}

impl Catalog {
    /// Build a catalog from already-normalized entries.
    ///
    /// Returns the catalog and any warnings produced while applying
    /// `policy` to repeated `(key, item_code)` pairs.
    pub fn from_entries(
        entries: Vec<CatalogEntry>,
        policy: DuplicatePolicy,
    ) -> Result<(Catalog, Vec<String>), MateriaError> {
        let mut catalog = Catalog::default();
        let mut seen: BTreeMap<(CompositeKey, String), usize> = BTreeMap::new();
        let mut warnings = Vec::new();

        for entry in entries {
            let dedup_key = (entry.key.clone(), entry.item_code.clone());
            if let Some(&idx) = seen.get(&dedup_key) {
                match policy {
                    DuplicatePolicy::Reject => {
                        return Err(MateriaError::DuplicateCatalogEntry {
                            key: entry.key.to_string(),
                            item_code: entry.item_code,
                        });
                    }
                    DuplicatePolicy::Sum => {
                        let existing = &mut catalog.entries[idx];
                        existing.unit_quantity += entry.unit_quantity;
                        warnings.push(format!(
                            "item '{}' listed more than once for {}; quantities summed to {}",
                            entry.item_code, entry.key, existing.unit_quantity
                        ));
                        continue;
                    }
                }
            }

            let idx = catalog.entries.len();
            seen.insert(dedup_key, idx);
            catalog.by_key.entry(entry.key.clone()).or_default().push(idx);
            catalog.entries.push(entry);
        }

        Ok((catalog, warnings))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct configurations.
    pub fn key_count(&self) -> usize {
        self.by_key.len()
    }

    pub fn contains_key(&self, key: &CompositeKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// Distinct configuration keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &CompositeKey> {
        self.by_key.keys()
    }

    /// Every material row for `key`, in source order.
    pub fn entries_for<'a>(&'a self, key: &CompositeKey) -> impl Iterator<Item = &'a CatalogEntry> {
        self.by_key
            .get(key)
            .into_iter()
            .flatten()
            .map(move |&i| &self.entries[i])
    }

    /// Distinct structure names, sorted.
    pub fn structures(&self) -> Vec<&str> {
        self.by_key
            .keys()
            .map(|k| k.structure.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Load and validate the catalog from a parsed table.
///
/// Fails with `Schema` when a required column is missing. Rows with a blank
/// item code or an unusable quantity are skipped and reported.
pub fn load_catalog(
    table: &RawTable,
    source_name: &str,
    options: &ConsolidateOptions,
) -> Result<Loaded<Catalog>, MateriaError> {
    let columns = ColumnIndex::resolve(&table.headers, &CATALOG_COLUMNS, source_name)?;
    let table = normalize_table(table, &columns.headers_of(&table.headers, &KEY_COLUMNS));

    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for (i, row) in table.rows.iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        let row_no = table.source_row(i);

        let item_code = columns.cell(row, Column::ItemCode).trim().to_string();
        if item_code.is_empty() {
            skipped.push(SkippedRow {
                row: row_no,
                reason: "missing item code".into(),
            });
            continue;
        }

        let unit_quantity = match parse_quantity(columns.cell(row, Column::Quantity)) {
            Ok(q) => q,
            Err(e) => {
                skipped.push(SkippedRow {
                    row: row_no,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        entries.push(CatalogEntry {
            key: CompositeKey {
                structure: columns.cell(row, Column::Structure).to_string(),
                equipment: columns.cell(row, Column::Equipment).to_string(),
                conductor: columns.cell(row, Column::Conductor).to_string(),
                pole: columns.cell(row, Column::Pole).to_string(),
            },
            item_code,
            item_description: columns.cell(row, Column::ItemDescription).trim().to_string(),
            unit: columns.cell(row, Column::Unit).trim().to_string(),
            unit_quantity,
        });
    }

    let (catalog, mut warnings) = Catalog::from_entries(entries, options.duplicate_policy)?;
    if catalog.is_empty() {
        warnings.push(format!("{source_name} has no usable material rows"));
    }

    for s in &skipped {
        tracing::warn!(source = source_name, row = s.row, reason = %s.reason, "catalog row skipped");
    }
    tracing::info!(
        source = source_name,
        entries = catalog.len(),
        configurations = catalog.key_count(),
        skipped = skipped.len(),
        "catalog loaded"
    );

    Ok(Loaded {
        value: catalog,
        skipped,
        warnings,
    })
}

/// Read a catalog file (xlsx, xls or csv) and load it.
pub fn load_catalog_file(
    path: &Path,
    options: &ConsolidateOptions,
) -> Result<Loaded<Catalog>, MateriaError> {
    let table = read_table_file(path, options.sheet.as_deref())?;
    load_catalog(&table, &path.display().to_string(), options)
}
