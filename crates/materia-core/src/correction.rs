use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::MateriaError;
use crate::model::{CompositeKey, ProjectLine, Variant};
use crate::reconcile::find_unmatched;

/// Replacement variant per unmatched key. Keys absent from the map are dropped.
pub type CorrectionMap = BTreeMap<CompositeKey, Variant>;

/// The operator's answer for one unmatched key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Keep the structure, use this `(equipment, conductor, pole)` instead.
    Remap(Variant),
    /// Leave the configuration out of the report.
    Drop,
}

/// Valid replacements for `key`: the distinct variants the catalog lists
/// under the same structure, sorted. Empty when the structure itself is
/// unknown, in which case dropping is the only option.
pub fn suggest_alternatives(catalog: &Catalog, key: &CompositeKey) -> Vec<Variant> {
    catalog
        .keys()
        .filter(|k| k.structure == key.structure)
        .map(CompositeKey::variant)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Check that remapping `key` to `variant` lands on a catalog configuration.
pub fn validate_correction(
    catalog: &Catalog,
    key: &CompositeKey,
    variant: &Variant,
) -> Result<(), MateriaError> {
    let target = key.with_variant(variant);
    if catalog.contains_key(&target) {
        Ok(())
    } else {
        Err(MateriaError::InvalidCorrection {
            key: key.to_string(),
            reason: format!(
                "{} is not a catalog configuration of structure {}",
                variant, key.structure
            ),
        })
    }
}

/// Rewrite corrected lines, then keep only lines whose key is in the catalog.
///
/// Lines with a key in `corrections` get that variant (structure unchanged);
/// other lines are left as they are. Map entries whose key is already a
/// catalog configuration are ignored, so matched lines are never moved. The
/// final filter is what drops keys the operator chose not to fix. Applying
/// the same map again to the output changes nothing.
pub fn apply_corrections(
    catalog: &Catalog,
    lines: &[ProjectLine],
    corrections: &CorrectionMap,
) -> Vec<ProjectLine> {
    let mut dropped = 0usize;
    let corrected: Vec<ProjectLine> = lines
        .iter()
        .map(|line| {
            let correction = corrections
                .get(&line.key)
                .filter(|_| !catalog.contains_key(&line.key));
            match correction {
                Some(variant) => {
                    ProjectLine::new(line.key.with_variant(variant), line.declared_count)
                }
                None => line.clone(),
            }
        })
        .filter(|line| {
            let keep = catalog.contains_key(&line.key);
            if !keep {
                dropped += 1;
            }
            keep
        })
        .collect();

    tracing::info!(
        corrections = corrections.len(),
        kept = corrected.len(),
        dropped,
        "corrections applied"
    );
    corrected
}

/// One unmatched configuration awaiting a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub key: CompositeKey,
    /// How many project lines use this key.
    pub lines: usize,
    /// Sum of their declared counts.
    pub declared_total: u64,
    pub alternatives: Vec<Variant>,
    #[serde(default)]
    pub decision: Option<Decision>,
}

/// Serializable set of unmatched keys with the operator's decisions.
///
/// Lets correction happen across separate invocations: the plan is written
/// out, edited, and read back to produce a [`CorrectionMap`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionPlan {
    pub entries: Vec<PlanEntry>,
}

impl CorrectionPlan {
    /// Read a plan written by `reconcile --plan`.
    ///
    /// Read and parse failures are reported against `path`.
    pub fn load(path: &Path) -> Result<CorrectionPlan, MateriaError> {
        let source = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| MateriaError::unavailable(&source, e))?;
        serde_json::from_slice(&bytes).map_err(|e| MateriaError::unavailable(source, e))
    }

    /// A plan with no decisions for every unmatched key of `lines`.
    pub fn build(catalog: &Catalog, lines: &[ProjectLine]) -> CorrectionPlan {
        let entries = find_unmatched(catalog, lines)
            .into_iter()
            .map(|key| {
                let matching = lines.iter().filter(|l| l.key == key);
                let (count, total) =
                    matching.fold((0usize, 0u64), |(n, t), l| (n + 1, t + l.declared_count as u64));
                PlanEntry {
                    alternatives: suggest_alternatives(catalog, &key),
                    key,
                    lines: count,
                    declared_total: total,
                    decision: None,
                }
            })
            .collect();
        CorrectionPlan { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a decision for `key`, validating remaps against the catalog.
    pub fn decide(
        &mut self,
        catalog: &Catalog,
        key: &CompositeKey,
        decision: Decision,
    ) -> Result<(), MateriaError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.key == *key)
            .ok_or_else(|| MateriaError::InvalidCorrection {
                key: key.to_string(),
                reason: "key is not pending correction".into(),
            })?;
        let decision = match decision {
            Decision::Remap(v) => {
                let variant = Variant::new(&v.equipment, &v.conductor, &v.pole);
                validate_correction(catalog, key, &variant)?;
                Decision::Remap(variant)
            }
            Decision::Drop => Decision::Drop,
        };
        entry.decision = Some(decision);
        Ok(())
    }

    /// Keys that still have no decision.
    pub fn undecided(&self) -> Vec<&CompositeKey> {
        self.entries
            .iter()
            .filter(|e| e.decision.is_none())
            .map(|e| &e.key)
            .collect()
    }

    /// Turn a fully decided plan into a correction map.
    ///
    /// Keys are re-normalized since the plan may have been edited by hand.
    /// Fails on the first undecided key or invalid remap.
    pub fn to_corrections(&self, catalog: &Catalog) -> Result<CorrectionMap, MateriaError> {
        let mut map = CorrectionMap::new();
        for entry in &self.entries {
            let key = entry.key.normalized();
            match &entry.decision {
                None => {
                    return Err(MateriaError::InvalidCorrection {
                        key: key.to_string(),
                        reason: "no decision recorded (choose an alternative or drop)".into(),
                    })
                }
                Some(Decision::Drop) => {}
                Some(Decision::Remap(variant)) => {
                    let variant =
                        Variant::new(&variant.equipment, &variant.conductor, &variant.pole);
                    validate_correction(catalog, &key, &variant)?;
                    map.insert(key, variant);
                }
            }
        }
        Ok(map)
    }
}
