//! Failure kinds for the load → aggregate → sink pipeline.

use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of a [`PipelineError`], stable across causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SourceNotFound,
    Parse,
    Schema,
    Aggregation,
    SinkWrite,
}

/// A fatal condition that aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("failed to parse input table: {0}")]
    Parse(#[source] csv::Error),

    #[error("failed to parse input table: line {line} has {found} fields, header has {expected}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("invalid file format, missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("failed to calculate summary statistics: {0}")]
    Aggregation(String),

    #[error("failed to write {}: {source}", path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl PipelineError {
    pub fn sink(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        PipelineError::SinkWrite {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::SourceNotFound { .. } => ErrorKind::SourceNotFound,
            PipelineError::Parse(_) | PipelineError::TooManyFields { .. } => ErrorKind::Parse,
            PipelineError::Schema { .. } => ErrorKind::Schema,
            PipelineError::Aggregation(_) => ErrorKind::Aggregation,
            PipelineError::SinkWrite { .. } => ErrorKind::SinkWrite,
        }
    }

    /// Process exit status for this failure. Every fatal kind maps to 1.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Why a single input row was left out of the cleaned table.
///
/// Rejections are recovered locally: they are counted in the load report and
/// logged at debug level, never returned as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    MissingField(&'static str),
    NonNumericCount(String),
}

impl std::fmt::Display for RowRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowRejection::MissingField(column) => write!(f, "missing value for '{column}'"),
            RowRejection::NonNumericCount(raw) => write!(f, "count '{raw}' is not numeric"),
        }
    }
}
