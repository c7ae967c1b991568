pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod correction;
pub mod error;
pub mod extraction;
pub mod manual;
pub mod model;
pub mod parsing;
pub mod project;
pub mod reconcile;
pub mod report;
pub mod session;

use catalog::Catalog;
use correction::CorrectionMap;
use error::MateriaError;
use model::{ConsolidatedLineItem, ProjectLine};

/// Main API entry point: correct, filter and aggregate project lines in one
/// call.
///
/// Lines keyed in `corrections` are remapped; lines that still do not
/// resolve are dropped. Fails with [`MateriaError::NoValidLines`] when
/// nothing is left to report.
pub fn consolidate(
    catalog: &Catalog,
    lines: &[ProjectLine],
    corrections: &CorrectionMap,
) -> Result<Vec<ConsolidatedLineItem>, MateriaError> {
    let corrected = correction::apply_corrections(catalog, lines, corrections);
    let items = aggregate::aggregate(catalog, &corrected);
    if items.is_empty() {
        return Err(MateriaError::NoValidLines);
    }
    Ok(items)
}
