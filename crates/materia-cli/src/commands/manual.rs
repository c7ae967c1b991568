use std::path::Path;

use materia_core::catalog::Catalog;
use materia_core::config::ConsolidateOptions;
use materia_core::error::MateriaError;
use materia_core::manual::{options_for, KeySelection, ManualSession, PartialKey};
use materia_core::model::CompositeKey;

use crate::commands::generate::generate_report;
use crate::commands::open_catalog;
use crate::output;

pub fn show_options(
    catalog_file: &Path,
    structure: Option<String>,
    equipment: Option<String>,
    conductor: Option<String>,
    options: &ConsolidateOptions,
) -> Result<(), MateriaError> {
    let catalog = open_catalog(catalog_file, options)?;
    let partial = PartialKey {
        structure,
        equipment,
        conductor,
    };
    let (level, values) = options_for(&catalog, &partial);
    println!("{}", output::table::format_options(level, &values));
    Ok(())
}

/// Walk the guided selection so every field is checked in order.
fn select(catalog: &Catalog, fields: [&str; 4]) -> Result<CompositeKey, MateriaError> {
    let [structure, equipment, conductor, pole] = fields;
    let mut selection = KeySelection::default();
    selection.set_structure(structure);
    selection.set_equipment(equipment);
    selection.set_conductor(conductor);
    selection.set_pole(pole);
    selection.complete(catalog)
}

pub fn add(
    session_file: &Path,
    catalog_file: &Path,
    fields: [&str; 4],
    count: u32,
    options: &ConsolidateOptions,
) -> Result<(), MateriaError> {
    let catalog = open_catalog(catalog_file, options)?;
    let mut session = ManualSession::load(session_file)?;
    let key = select(&catalog, fields)?;
    session.lines.append(&catalog, key.clone(), count)?;
    session.save(session_file)?;
    eprintln!("Line {} added: {key} × {count}", session.lines.len());
    Ok(())
}

pub fn edit(
    session_file: &Path,
    catalog_file: &Path,
    line: usize,
    fields: [&str; 4],
    count: u32,
    options: &ConsolidateOptions,
) -> Result<(), MateriaError> {
    let catalog = open_catalog(catalog_file, options)?;
    let mut session = ManualSession::load(session_file)?;
    let index = to_index(line)?;
    let key = CompositeKey::new(fields[0], fields[1], fields[2], fields[3]);
    session.lines.edit(&catalog, index, key.clone(), count)?;
    session.save(session_file)?;
    eprintln!("Line {line} is now {key} × {count}");
    Ok(())
}

pub fn remove(session_file: &Path, lines: &[usize]) -> Result<(), MateriaError> {
    let mut session = ManualSession::load(session_file)?;
    let indices = lines
        .iter()
        .map(|&n| to_index(n))
        .collect::<Result<Vec<_>, _>>()?;
    let removed = session.lines.remove_selected(&indices)?;
    session.save(session_file)?;
    eprintln!("{removed} line(s) removed, {} left", session.lines.len());
    Ok(())
}

pub fn clear(session_file: &Path) -> Result<(), MateriaError> {
    let mut session = ManualSession::load(session_file)?;
    session.lines.clear();
    session.save(session_file)?;
    eprintln!("All lines removed");
    Ok(())
}

pub fn rename(session_file: &Path, name: &str) -> Result<(), MateriaError> {
    let mut session = ManualSession::load(session_file)?;
    session.project_name = name.to_string();
    session.save(session_file)
}

pub fn list(session_file: &Path, output_format: &str) -> Result<(), MateriaError> {
    let session = ManualSession::load(session_file)?;
    match output_format {
        "json" => output::json::print(&session),
        _ => {
            println!("{}", output::table::format_manual_session(&session));
            Ok(())
        }
    }
}

pub fn generate(
    session_file: &Path,
    catalog_file: &Path,
    out_dir: &Path,
    output_format: &str,
    options: &ConsolidateOptions,
) -> Result<(), MateriaError> {
    let catalog = open_catalog(catalog_file, options)?;
    let mut session = ManualSession::load(session_file)?;

    // The catalog may have changed since the lines were added.
    for stale in session.lines.revalidate(&catalog) {
        eprintln!(
            "  dropped {} × {}: no longer in the catalog",
            stale.key, stale.declared_count
        );
    }

    generate_report(
        &catalog,
        session.project_name,
        session.lines.lines().to_vec(),
        None,
        out_dir,
        output_format,
        options,
    )
}

/// Line numbers on the command line are 1-based, as printed by `list`.
fn to_index(line: usize) -> Result<usize, MateriaError> {
    line.checked_sub(1)
        .ok_or_else(|| MateriaError::InvalidSelection("line numbers start at 1".into()))
}
