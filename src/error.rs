use std::io;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Failures of the catalog store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open catalog database at {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("Catalog query failed: {0}")]
    Query(String),

    #[error("Malformed {relation} row: {message}")]
    Decode {
        relation: &'static str,
        message: String,
    },

    #[error("Submission {0} not found")]
    SubmissionNotFound(u64),

    #[error("Failed to read import file {path}: {source}")]
    ImportRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse import file: {0}")]
    ImportParse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config from {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Config file not found at {0}")]
    NotFound(PathBuf),

    #[error("No data directory available; pass --db explicitly")]
    NoDataDir,
}

/// Rejected submit-form input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Tool name must not be empty")]
    EmptyName,

    #[error("URL must start with http:// or https://, got {0:?}")]
    InvalidUrl(String),

    #[error("Description must not be empty")]
    EmptyDescription,

    #[error("Submitter must not be empty")]
    EmptySubmitter,
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("{0} is not allowed to review submissions")]
    NotAdmin(String),

    #[error("Submission {id} is already {status}")]
    NotPending { id: u64, status: &'static str },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Top-level error used by the command line front end.
#[derive(Error, Debug)]
pub enum GronckleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
