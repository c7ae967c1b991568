use std::path::Path;

use materia_core::config::ConsolidateOptions;
use materia_core::error::MateriaError;
use materia_core::manual::{options_for, PartialKey};
use serde_json::json;

use crate::commands::open_catalog;
use crate::output;

pub fn run(
    catalog_file: &Path,
    structure: Option<&str>,
    output_format: &str,
    options: &ConsolidateOptions,
) -> Result<(), MateriaError> {
    let catalog = open_catalog(catalog_file, options)?;

    let Some(structure) = structure else {
        return match output_format {
            "json" => output::json::print(&json!({
                "entries": catalog.len(),
                "configurations": catalog.key_count(),
                "structures": catalog.structures(),
            })),
            _ => {
                println!("{}", output::table::format_catalog_summary(&catalog));
                Ok(())
            }
        };
    };

    // structure -> equipment -> conductor -> poles
    let mut tree = Vec::new();
    let mut partial = PartialKey {
        structure: Some(structure.to_string()),
        ..Default::default()
    };
    let (_, equipments) = options_for(&catalog, &partial);
    if equipments.is_empty() {
        return Err(MateriaError::InvalidSelection(format!(
            "structure '{structure}' is not in the catalog"
        )));
    }
    for equipment in equipments {
        partial.equipment = Some(equipment.clone());
        partial.conductor = None;
        let (_, conductors) = options_for(&catalog, &partial);
        let mut branches = Vec::new();
        for conductor in conductors {
            partial.conductor = Some(conductor.clone());
            let (_, poles) = options_for(&catalog, &partial);
            branches.push((conductor, poles));
        }
        tree.push((equipment, branches));
    }

    match output_format {
        "json" => output::json::print(&tree),
        _ => {
            println!("{}", output::table::format_option_tree(structure, &tree));
            Ok(())
        }
    }
}
