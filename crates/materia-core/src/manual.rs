use std::collections::{BTreeSet, HashSet};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::MateriaError;
use crate::model::{CompositeKey, ProjectLine};
use crate::parsing::normalize::normalize_key_field;

/// Upstream choices made so far while building a key.
///
/// Fields are filled in order; a later field is ignored unless every earlier
/// one is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialKey {
    pub structure: Option<String>,
    pub equipment: Option<String>,
    pub conductor: Option<String>,
}

/// Which key field an option list is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLevel {
    Structure,
    Equipment,
    Conductor,
    Pole,
}

/// Valid values for the next unset field of `partial`, sorted and distinct.
///
/// Pure derivation from the catalog: no memory of earlier calls. Returns the
/// level the options belong to along with the options; an unknown upstream
/// value yields an empty list.
pub fn options_for(catalog: &Catalog, partial: &PartialKey) -> (KeyLevel, Vec<String>) {
    let structure = partial.structure.as_deref().map(normalize_key_field);
    let equipment = partial.equipment.as_deref().map(normalize_key_field);
    let conductor = partial.conductor.as_deref().map(normalize_key_field);

    let level = match (&structure, &equipment, &conductor) {
        (None, _, _) => KeyLevel::Structure,
        (Some(_), None, _) => KeyLevel::Equipment,
        (Some(_), Some(_), None) => KeyLevel::Conductor,
        (Some(_), Some(_), Some(_)) => KeyLevel::Pole,
    };

    let fits = |field: &Option<String>, value: &str| field.as_deref().map_or(true, |f| f == value);
    let options: BTreeSet<&str> = catalog
        .keys()
        .filter(|k| level == KeyLevel::Structure || fits(&structure, &k.structure))
        .filter(|k| {
            matches!(level, KeyLevel::Structure | KeyLevel::Equipment)
                || fits(&equipment, &k.equipment)
        })
        .filter(|k| level != KeyLevel::Pole || fits(&conductor, &k.conductor))
        .map(|k| match level {
            KeyLevel::Structure => k.structure.as_str(),
            KeyLevel::Equipment => k.equipment.as_str(),
            KeyLevel::Conductor => k.conductor.as_str(),
            KeyLevel::Pole => k.pole.as_str(),
        })
        .collect();

    (level, options.into_iter().map(str::to_string).collect())
}

/// Guided key construction: structure, then equipment, then conductor,
/// then pole. Setting a field clears every field after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySelection {
    partial: PartialKey,
    pole: Option<String>,
}

impl KeySelection {
    pub fn set_structure(&mut self, value: &str) {
        self.partial = PartialKey {
            structure: Some(normalize_key_field(value)),
            ..Default::default()
        };
        self.pole = None;
    }

    pub fn set_equipment(&mut self, value: &str) {
        self.partial.equipment = Some(normalize_key_field(value));
        self.partial.conductor = None;
        self.pole = None;
    }

    pub fn set_conductor(&mut self, value: &str) {
        self.partial.conductor = Some(normalize_key_field(value));
        self.pole = None;
    }

    pub fn set_pole(&mut self, value: &str) {
        self.pole = Some(normalize_key_field(value));
    }

    pub fn partial(&self) -> &PartialKey {
        &self.partial
    }

    /// Options for the next field to choose.
    pub fn options(&self, catalog: &Catalog) -> (KeyLevel, Vec<String>) {
        options_for(catalog, &self.partial)
    }

    /// The selected key, if all four fields are chosen and it is in the catalog.
    pub fn complete(&self, catalog: &Catalog) -> Result<CompositeKey, MateriaError> {
        let (Some(structure), Some(equipment), Some(conductor), Some(pole)) = (
            &self.partial.structure,
            &self.partial.equipment,
            &self.partial.conductor,
            &self.pole,
        ) else {
            return Err(MateriaError::InvalidSelection(
                "structure, equipment, conductor and pole must all be chosen".into(),
            ));
        };
        let key = CompositeKey::new(structure, equipment, conductor, pole);
        ensure_in_catalog(catalog, &key)?;
        Ok(key)
    }
}

fn ensure_in_catalog(catalog: &Catalog, key: &CompositeKey) -> Result<(), MateriaError> {
    if catalog.contains_key(key) {
        Ok(())
    } else {
        Err(MateriaError::InvalidSelection(format!(
            "{key} is not a catalog configuration"
        )))
    }
}

fn ensure_count(count: u32) -> Result<(), MateriaError> {
    if count == 0 {
        Err(MateriaError::InvalidSelection("count must be at least 1".into()))
    } else {
        Ok(())
    }
}

/// Project lines entered by hand.
///
/// Every line held has a key present in the catalog it was validated
/// against and a positive count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEntryList {
    lines: Vec<ProjectLine>,
}

impl ManualEntryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[ProjectLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append one line after checking it against the catalog.
    pub fn append(
        &mut self,
        catalog: &Catalog,
        key: CompositeKey,
        count: u32,
    ) -> Result<(), MateriaError> {
        let key = key.normalized();
        ensure_in_catalog(catalog, &key)?;
        ensure_count(count)?;
        tracing::debug!(%key, count, "manual line added");
        self.lines.push(ProjectLine::new(key, count));
        Ok(())
    }

    /// Replace line `index`, re-validating the new key and count.
    pub fn edit(
        &mut self,
        catalog: &Catalog,
        index: usize,
        key: CompositeKey,
        count: u32,
    ) -> Result<(), MateriaError> {
        let len = self.lines.len();
        let key = key.normalized();
        ensure_in_catalog(catalog, &key)?;
        ensure_count(count)?;
        let slot = self.lines.get_mut(index).ok_or_else(|| {
            MateriaError::InvalidSelection(format!("no line {index} (list has {len})"))
        })?;
        *slot = ProjectLine::new(key, count);
        Ok(())
    }

    /// Remove the lines at `indices` (0-based). All indices are checked
    /// first; on error nothing is removed. Returns how many lines went.
    pub fn remove_selected(&mut self, indices: &[usize]) -> Result<usize, MateriaError> {
        let selected: HashSet<usize> = indices.iter().copied().collect();
        if let Some(bad) = selected.iter().find(|&&i| i >= self.lines.len()) {
            return Err(MateriaError::InvalidSelection(format!(
                "no line {bad} (list has {})",
                self.lines.len()
            )));
        }
        let mut idx = 0;
        self.lines.retain(|_| {
            let keep = !selected.contains(&idx);
            idx += 1;
            keep
        });
        Ok(selected.len())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Drop lines that no longer resolve, e.g. after the catalog changed
    /// between sessions. Returns the removed lines.
    pub fn revalidate(&mut self, catalog: &Catalog) -> Vec<ProjectLine> {
        let (keep, gone): (Vec<_>, Vec<_>) = self
            .lines
            .drain(..)
            .partition(|l| catalog.contains_key(&l.key));
        self.lines = keep;
        gone
    }
}

/// A manual-entry session persisted between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualSession {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub lines: ManualEntryList,
}

impl ManualSession {
    /// Load a session file; a missing file is a fresh session.
    ///
    /// The file may have been edited by hand: keys are re-normalized and a
    /// line with a zero count is an error. Catalog membership is checked
    /// later by [`ManualEntryList::revalidate`].
    pub fn load(path: &Path) -> Result<ManualSession, MateriaError> {
        let source = path.display().to_string();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ManualSession::default())
            }
            Err(e) => return Err(MateriaError::unavailable(source, e)),
        };
        let mut session: ManualSession =
            serde_json::from_slice(&bytes).map_err(|e| MateriaError::unavailable(&source, e))?;

        for (i, line) in session.lines.lines.iter_mut().enumerate() {
            if line.declared_count == 0 {
                return Err(MateriaError::InvalidSelection(format!(
                    "{source}, line {}: count must be at least 1",
                    i + 1
                )));
            }
            line.key = line.key.normalized();
        }
        Ok(session)
    }

    /// Write the session atomically next to `path`.
    pub fn save(&self, path: &Path) -> Result<(), MateriaError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.write_all(b"\n")?;
        tmp.persist(path).map_err(|e| MateriaError::Io(e.error))?;
        Ok(())
    }
}
