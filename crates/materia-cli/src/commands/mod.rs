pub mod catalog;
pub mod generate;
pub mod manual;
pub mod reconcile;

use std::path::Path;

use materia_core::catalog::{load_catalog_file, Catalog};
use materia_core::config::{self, ConsolidateOptions};
use materia_core::error::MateriaError;
use materia_core::manual::ManualSession;
use materia_core::model::{Loaded, ProjectLine};
use materia_core::project::load_project_file;

pub fn load_options(path: Option<&Path>) -> Result<ConsolidateOptions, MateriaError> {
    match path {
        Some(p) => {
            let options = config::load_options(p)?;
            tracing::debug!(path = %p.display(), ?options, "options loaded");
            Ok(options)
        }
        None => Ok(ConsolidateOptions::default()),
    }
}

/// Load the catalog, reporting skipped rows and warnings on stderr.
pub fn open_catalog(path: &Path, options: &ConsolidateOptions) -> Result<Catalog, MateriaError> {
    let loaded = load_catalog_file(path, options)?;
    report_load("catalog", &loaded);
    Ok(loaded.value)
}

/// Load project lines from a table file or a manual-session JSON.
///
/// Returns the lines and a default project name: the session's name, or the
/// file stem for table files.
pub fn open_project(
    path: &Path,
    options: &ConsolidateOptions,
) -> Result<(Vec<ProjectLine>, String), MateriaError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        if !path.exists() {
            return Err(MateriaError::unavailable(
                path.display().to_string(),
                "no such session file",
            ));
        }
        let session = ManualSession::load(path)?;
        return Ok((session.lines.lines().to_vec(), session.project_name));
    }

    let loaded = load_project_file(path, options)?;
    report_load("project", &loaded);
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((loaded.value, name))
}

fn report_load<T>(what: &str, loaded: &Loaded<T>) {
    for w in &loaded.warnings {
        eprintln!("  {what} warning: {w}");
    }
    if !loaded.skipped.is_empty() {
        eprintln!("  {} {what} row(s) skipped:", loaded.skipped.len());
        for s in &loaded.skipped {
            eprintln!("    row {}: {}", s.row, s.reason);
        }
    }
}
