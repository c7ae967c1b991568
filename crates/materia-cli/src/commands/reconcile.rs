use std::path::{Path, PathBuf};

use materia_core::config::ConsolidateOptions;
use materia_core::error::MateriaError;
use materia_core::session::Session;

use crate::commands::{open_catalog, open_project};
use crate::output;

pub fn run(
    catalog_file: &Path,
    project_file: &Path,
    plan_out: Option<PathBuf>,
    output_format: &str,
    options: &ConsolidateOptions,
) -> Result<(), MateriaError> {
    let catalog = open_catalog(catalog_file, options)?;
    let (lines, name) = open_project(project_file, options)?;
    let line_count = lines.len();

    let mut session = Session::new(name, lines);
    let plan = session.reconcile(&catalog);

    match output_format {
        "json" => output::json::print(plan)?,
        _ => println!("{}", output::table::format_plan(plan)),
    }

    if plan.is_empty() {
        eprintln!("All {line_count} line(s) match the catalog.");
        return Ok(());
    }

    if let Some(path) = plan_out {
        let json = serde_json::to_string_pretty(plan)?;
        std::fs::write(&path, json)?;
        eprintln!(
            "Correction plan with {} configuration(s) written to {}",
            plan.entries.len(),
            path.display()
        );
        eprintln!(
            "  set each \"decision\" to {{\"remap\": {{...}}}} or \"drop\", \
             then run `generate --corrections`"
        );
    }

    Ok(())
}
