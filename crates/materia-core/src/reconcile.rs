use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::model::{CompositeKey, ProjectLine};

/// Distinct project keys that have no entry in the catalog, sorted.
///
/// Exact comparison of normalized 4-tuples. An empty set means every line
/// resolves.
pub fn find_unmatched(catalog: &Catalog, lines: &[ProjectLine]) -> BTreeSet<CompositeKey> {
    let unmatched: BTreeSet<CompositeKey> = lines
        .iter()
        .filter(|l| !catalog.contains_key(&l.key))
        .map(|l| l.key.clone())
        .collect();

    if !unmatched.is_empty() {
        tracing::info!(
            unmatched = unmatched.len(),
            lines = lines.len(),
            "project has configurations missing from the catalog"
        );
    }
    unmatched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use crate::model::CatalogEntry;
    use rust_decimal_macros::dec;

    fn catalog(keys: &[CompositeKey]) -> Catalog {
        let entries = keys
            .iter()
            .map(|k| CatalogEntry {
                key: k.clone(),
                item_code: "001".into(),
                item_description: "BOLT".into(),
                unit: "UN".into(),
                unit_quantity: dec!(1),
            })
            .collect();
        Catalog::from_entries(entries, DuplicatePolicy::Reject).unwrap().0
    }

    #[test]
    fn test_all_matched_is_empty() {
        let k = CompositeKey::new("A", "X", "1", "P1");
        let c = catalog(&[k.clone()]);
        assert!(find_unmatched(&c, &[ProjectLine::new(k, 2)]).is_empty());
    }

    #[test]
    fn test_unmatched_distinct_and_sorted() {
        let c = catalog(&[CompositeKey::new("A", "X", "1", "P1")]);
        let lines = vec![
            ProjectLine::new(CompositeKey::new("B", "X", "1", "P1"), 1),
            ProjectLine::new(CompositeKey::new("A", "X", "1", "P2"), 1),
            ProjectLine::new(CompositeKey::new("A", "X", "1", "P1"), 5),
            ProjectLine::new(CompositeKey::new("A", "X", "1", "P2"), 3),
        ];
        let u: Vec<_> = find_unmatched(&c, &lines).into_iter().collect();
        assert_eq!(
            u,
            vec![
                CompositeKey::new("A", "X", "1", "P2"),
                CompositeKey::new("B", "X", "1", "P1"),
            ]
        );
    }

    #[test]
    fn test_empty_project() {
        let c = catalog(&[CompositeKey::new("A", "X", "1", "P1")]);
        assert!(find_unmatched(&c, &[]).is_empty());
    }

    #[test]
    fn test_completeness_against_brute_force() {
        let catalog_keys = vec![
            CompositeKey::new("A", "X", "1", "P1"),
            CompositeKey::new("A", "Y", "1", "P1"),
            CompositeKey::new("B", "X", "2", "P2"),
        ];
        let c = catalog(&catalog_keys);
        let structures = ["A", "B"];
        let poles = ["P1", "P2"];
        let mut lines = Vec::new();
        for s in structures {
            for e in ["X", "Y"] {
                for p in poles {
                    lines.push(ProjectLine::new(CompositeKey::new(s, e, "1", p), 1));
                    lines.push(ProjectLine::new(CompositeKey::new(s, e, "2", p), 1));
                }
            }
        }
        let expected: BTreeSet<CompositeKey> = lines
            .iter()
            .map(|l| l.key.clone())
            .filter(|k| !catalog_keys.contains(k))
            .collect();
        assert_eq!(find_unmatched(&c, &lines), expected);
    }
}
