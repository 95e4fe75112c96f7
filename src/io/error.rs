use crate::model::value::PropertyKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse MAE data: {details} (at line ~{line})")]
    Parse { line: usize, details: String },

    #[error("unsupported property type for key '{0}'")]
    UnsupportedPropertyType(String),

    #[error("inconsistent value list sizes for key '{key}': expected {expected}, found {found}")]
    InconsistentColumnLength {
        key: String,
        expected: usize,
        found: usize,
    },

    #[error("property '{key}' is tagged {expected} but holds a {found} value")]
    PropertyTypeMismatch {
        key: String,
        expected: PropertyKind,
        found: PropertyKind,
    },

    #[error("indexed block '{0}' contains no columns to establish a row count")]
    EmptyIndexedBlock(&'static str),
}

impl Error {
    pub fn parse(line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            line,
            details: details.into(),
        }
    }
}
