use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MateriaError {
    #[error("could not read {source_name}: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("{source_name} is missing required column(s): {}", missing.join(", "))]
    Schema {
        source_name: String,
        missing: Vec<String>,
    },

    #[error("catalog lists item '{item_code}' more than once for configuration {key}")]
    DuplicateCatalogEntry { key: String, item_code: String },

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("no valid project lines matched the catalog; nothing to consolidate")]
    NoValidLines,

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("invalid correction for {key}: {reason}")]
    InvalidCorrection { key: String, reason: String },

    #[error("operation requires session state '{expected}', but the session is '{actual}'")]
    InvalidState { expected: String, actual: String },

    #[error("failed to load options from {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl MateriaError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        MateriaError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// True for conditions the operator can fix by retrying with other input,
    /// as opposed to failures reading or parsing a source.
    pub fn is_soft(&self) -> bool {
        matches!(self, MateriaError::NoValidLines)
    }
}
