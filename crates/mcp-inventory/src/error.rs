//! Error types for scanning, entry translation, and export.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a configuration file into a document. Never aborts a run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected document shape in {path}: {detail}")]
    Shape { path: PathBuf, detail: String },
}

impl ScanError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    pub fn shape(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::Shape {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// A single server entry that could not be translated; siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("entry '{name}' is not an object")]
    NotAnObject { name: String },

    #[error("entry '{name}': field '{field}' must be {expected}")]
    InvalidField {
        name: String,
        field: &'static str,
        expected: &'static str,
    },
}

impl EntryError {
    pub fn invalid(name: &str, field: &'static str, expected: &'static str) -> Self {
        Self::InvalidField {
            name: name.to_string(),
            field,
            expected,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
