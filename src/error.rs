use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("unable to parse datetime: {0}")]
    InvalidDate(String),

    #[error("exactly one of `date` or `valid_date` is required")]
    DateInput,

    #[error("model initialization time cannot be in the future: {0}")]
    FutureDate(String),

    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("unknown product for model {model}: {product}")]
    UnknownProduct { model: String, product: String },

    #[error("invalid source name: {0}")]
    InvalidSource(String),

    #[error("no source in the priority list is offered by model {model}")]
    PriorityMismatch { model: String },

    #[error("GRIB2 file not found: {0}")]
    GribNotFound(String),

    #[error("index file not found: {0}")]
    IdxNotFound(String),

    #[error("request failed: {0}")]
    Http(String),

    #[error("{url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("malformed index line {line}: {content}")]
    IndexFormat { line: usize, content: String },

    #[error("invalid search pattern: {0}")]
    InvalidPattern(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}
