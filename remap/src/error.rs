use std::path::PathBuf;

use thiserror::Error;

/// The primary error type that can be produced by Remap.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error {0}: {1}")]
    Io(String, std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to parse template: {0}")]
    TemplateParse(String),
    #[error("template is not valid: {0}")]
    InvalidTemplate(String),
    #[error("unknown transform: {0}")]
    UnknownTransform(String),
    #[error("lookup file {file} has no column named \"{column}\"")]
    MissingLookupColumn { file: PathBuf, column: String },
}
