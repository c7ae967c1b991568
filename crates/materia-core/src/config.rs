use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::MateriaError;

pub const DEFAULT_REPORT_PREFIX: &str = "Ceminas - Materiais";

/// What to do when the catalog lists the same item twice for one configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail the catalog load.
    #[default]
    Reject,
    /// Merge the rows by adding their quantities, with a load warning.
    Sum,
}

/// Options for loading sources and naming reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsolidateOptions {
    pub duplicate_policy: DuplicatePolicy,
    /// Prefix of generated report file names.
    pub report_prefix: String,
    /// Worksheet to read from spreadsheet sources. First sheet if unset.
    pub sheet: Option<String>,
}

impl Default for ConsolidateOptions {
    fn default() -> Self {
        ConsolidateOptions {
            duplicate_policy: DuplicatePolicy::default(),
            report_prefix: DEFAULT_REPORT_PREFIX.to_string(),
            sheet: None,
        }
    }
}

/// Load options from a JSON file.
pub fn load_options(path: &Path) -> Result<ConsolidateOptions, MateriaError> {
    let content = std::fs::read_to_string(path).map_err(|e| MateriaError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let options: ConsolidateOptions =
        serde_json::from_str(&content).map_err(|e| MateriaError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_options(&options).map_err(|reason| MateriaError::Config {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(options)
}

/// Parse options from a JSON string (no file path context).
pub fn parse_options_str(json: &str) -> Result<ConsolidateOptions, MateriaError> {
    let options: ConsolidateOptions = serde_json::from_str(json)?;
    validate_options(&options).map_err(MateriaError::InvalidValue)?;
    Ok(options)
}

fn validate_options(options: &ConsolidateOptions) -> Result<(), String> {
    if options.report_prefix.trim().is_empty() {
        return Err("report_prefix must not be empty".into());
    }
    if let Some(sheet) = &options.sheet {
        if sheet.trim().is_empty() {
            return Err("sheet must not be empty when given".into());
        }
    }
    Ok(())
}
