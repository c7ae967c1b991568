use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::catalog::Catalog;
use crate::model::{ConsolidatedLineItem, ProjectLine};

/// Output item identity.
type ItemKey = (String, String, String);

/// Consolidate the materials needed by `lines`.
///
/// Each line contributes `unit_quantity × declared_count` for every catalog
/// row of its key; contributions are summed per `(item_code, description,
/// unit)`. Lines with no catalog rows contribute nothing. Output is sorted
/// by description ignoring case; equal descriptions stay in item code order.
pub fn aggregate(catalog: &Catalog, lines: &[ProjectLine]) -> Vec<ConsolidatedLineItem> {
    let mut totals: BTreeMap<ItemKey, Decimal> = BTreeMap::new();
    let mut unmatched = 0usize;

    for line in lines {
        let mut matched = false;
        let count = Decimal::from(line.declared_count);
        for entry in catalog.entries_for(&line.key) {
            matched = true;
            *totals
                .entry((
                    entry.item_code.clone(),
                    entry.item_description.clone(),
                    entry.unit.clone(),
                ))
                .or_default() += entry.unit_quantity * count;
        }
        if !matched {
            unmatched += 1;
        }
    }

    if unmatched > 0 {
        tracing::debug!(unmatched, "lines without catalog entries left out of aggregation");
    }

    into_sorted_items(totals)
}

/// Grouped-sum merge of two consolidated reports.
///
/// `merge(aggregate(c, p1), aggregate(c, p2))` equals `aggregate(c, p1 ++ p2)`.
pub fn merge(a: &[ConsolidatedLineItem], b: &[ConsolidatedLineItem]) -> Vec<ConsolidatedLineItem> {
    let mut totals: BTreeMap<ItemKey, Decimal> = BTreeMap::new();
    for item in a.iter().chain(b) {
        *totals
            .entry((
                item.item_code.clone(),
                item.item_description.clone(),
                item.unit.clone(),
            ))
            .or_default() += item.total_quantity;
    }
    into_sorted_items(totals)
}

fn into_sorted_items(totals: BTreeMap<ItemKey, Decimal>) -> Vec<ConsolidatedLineItem> {
    let mut items: Vec<ConsolidatedLineItem> = totals
        .into_iter()
        .map(|((item_code, item_description, unit), total)| ConsolidatedLineItem {
            item_code,
            item_description,
            unit,
            total_quantity: total.normalize(),
        })
        .collect();
    // Stable: ties keep the map's item code order.
    items.sort_by_key(|i| i.item_description.to_uppercase());
    items
}
