use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parsing::normalize::normalize_key_field;

/// Identifies one structural configuration: `(structure, equipment, conductor, pole)`.
///
/// Field order matters: the derived `Ord` gives the lexicographic order used
/// whenever keys are shown to an operator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompositeKey {
    pub structure: String,
    pub equipment: String,
    pub conductor: String,
    pub pole: String,
}

impl CompositeKey {
    /// Build a key, normalizing every field.
    pub fn new(
        structure: impl AsRef<str>,
        equipment: impl AsRef<str>,
        conductor: impl AsRef<str>,
        pole: impl AsRef<str>,
    ) -> Self {
        CompositeKey {
            structure: normalize_key_field(structure.as_ref()),
            equipment: normalize_key_field(equipment.as_ref()),
            conductor: normalize_key_field(conductor.as_ref()),
            pole: normalize_key_field(pole.as_ref()),
        }
    }

    /// Re-apply normalization to a key that may have been deserialized as-is.
    pub fn normalized(&self) -> Self {
        CompositeKey::new(&self.structure, &self.equipment, &self.conductor, &self.pole)
    }

    pub fn variant(&self) -> Variant {
        Variant {
            equipment: self.equipment.clone(),
            conductor: self.conductor.clone(),
            pole: self.pole.clone(),
        }
    }

    /// The same structure with a different `(equipment, conductor, pole)`.
    pub fn with_variant(&self, variant: &Variant) -> Self {
        CompositeKey {
            structure: self.structure.clone(),
            equipment: variant.equipment.clone(),
            conductor: variant.conductor.clone(),
            pole: variant.pole.clone(),
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {} / {}",
            self.structure, self.equipment, self.conductor, self.pole
        )
    }
}

/// The `(equipment, conductor, pole)` part of a key, i.e. one configuration
/// of a structure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Variant {
    pub equipment: String,
    pub conductor: String,
    pub pole: String,
}

impl Variant {
    pub fn new(
        equipment: impl AsRef<str>,
        conductor: impl AsRef<str>,
        pole: impl AsRef<str>,
    ) -> Self {
        Variant {
            equipment: normalize_key_field(equipment.as_ref()),
            conductor: normalize_key_field(conductor.as_ref()),
            pole: normalize_key_field(pole.as_ref()),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.equipment, self.conductor, self.pole)
    }
}

/// One material required by a configuration in the reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub key: CompositeKey,
    pub item_code: String,
    pub item_description: String,
    pub unit: String,
    /// Quantity of this material per one instance of the configuration.
    pub unit_quantity: Decimal,
}

/// One configuration declared by a project, with how many times it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLine {
    pub key: CompositeKey,
    pub declared_count: u32,
}

impl ProjectLine {
    pub fn new(key: CompositeKey, declared_count: u32) -> Self {
        ProjectLine {
            key,
            declared_count,
        }
    }
}

/// One row of the consolidated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedLineItem {
    pub item_code: String,
    pub item_description: String,
    pub unit: String,
    pub total_quantity: Decimal,
}

/// A data row that a loader rejected, kept so the operator can see why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based row number in the source, header included.
    pub row: usize,
    pub reason: String,
}

/// Output of a loader: the value plus whatever it had to leave out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loaded<T> {
    pub value: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T> Loaded<T> {
    pub fn clean(value: T) -> Self {
        Loaded {
            value,
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }
}
