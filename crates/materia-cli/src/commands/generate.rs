use std::path::{Path, PathBuf};

use materia_core::catalog::Catalog;
use materia_core::config::ConsolidateOptions;
use materia_core::correction::CorrectionPlan;
use materia_core::error::MateriaError;
use materia_core::model::ProjectLine;
use materia_core::session::Session;

use crate::commands::{open_catalog, open_project};
use crate::output;

pub fn run(
    catalog_file: &Path,
    project_file: &Path,
    corrections_file: Option<PathBuf>,
    name: Option<String>,
    out_dir: &Path,
    output_format: &str,
    options: &ConsolidateOptions,
) -> Result<(), MateriaError> {
    let catalog = open_catalog(catalog_file, options)?;
    let (lines, default_name) = open_project(project_file, options)?;
    let name = name.unwrap_or(default_name);

    let plan = corrections_file
        .as_deref()
        .map(CorrectionPlan::load)
        .transpose()?;

    generate_report(&catalog, name, lines, plan.as_ref(), out_dir, output_format, options)
}

/// Reconcile, correct when needed, aggregate, write and print.
pub fn generate_report(
    catalog: &Catalog,
    name: String,
    lines: Vec<ProjectLine>,
    plan: Option<&CorrectionPlan>,
    out_dir: &Path,
    output_format: &str,
    options: &ConsolidateOptions,
) -> Result<(), MateriaError> {
    let mut session = Session::new(name, lines);
    let pending = session.reconcile(catalog).clone();

    if !pending.is_empty() {
        let Some(plan) = plan else {
            eprintln!("Configurations missing from the catalog:\n");
            eprintln!("{}", output::table::format_plan(&pending));
            eprintln!(
                "Run `materia reconcile ... --plan-out plan.json`, decide each entry, \
                 then pass --corrections plan.json"
            );
            return Err(MateriaError::InvalidCorrection {
                key: format!("{} configuration(s)", pending.entries.len()),
                reason: "no corrections file given".into(),
            });
        };
        session.adopt_plan(catalog, plan)?;
        session.apply_corrections(catalog)?;
    }

    let report = session.generate(catalog)?;
    let path = report.write_to_dir(out_dir, &options.report_prefix)?;

    match output_format {
        "json" => output::json::print(report)?,
        _ => println!("{}", output::table::format_report(report)),
    }
    eprintln!(
        "{} item(s) from {} line(s), written to {}",
        report.item_count(),
        report.line_count,
        path.display()
    );
    Ok(())
}
