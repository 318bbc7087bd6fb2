//! Error types for the Propsum pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - CSV reading and decoding errors
//! - [`TableError`] - column access and table shape errors
//! - [`SummaryError`] - invalid summarization arguments
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors during CSV reading and decoding.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    Parse(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for CsvError {
    fn from(e: csv::Error) -> Self {
        CsvError::Parse(e.to_string())
    }
}

// =============================================================================
// Table Errors
// =============================================================================

/// Errors from table operations.
#[derive(Debug, Error)]
pub enum TableError {
    /// A named column is absent from the table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A column does not match the table's row count.
    #[error("Column '{column}' has {len} cells, table has {expected} rows")]
    LengthMismatch {
        column: String,
        len: usize,
        expected: usize,
    },
}

// =============================================================================
// Summary Errors
// =============================================================================

/// Errors from market summarization.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Group level outside the allowed set.
    #[error("Invalid group level '{given}', expected one of: {}", .allowed.join(", "))]
    InvalidGroupLevel {
        given: String,
        allowed: Vec<String>,
    },

    /// Metric column absent from the table.
    #[error("Unknown metric column: {0}")]
    UnknownMetric(String),

    /// Group key column absent from the table.
    #[error("Missing column: {0}")]
    MissingColumn(String),
}

impl From<TableError> for SummaryError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::MissingColumn(c) => SummaryError::MissingColumn(c),
            other => SummaryError::MissingColumn(other.to_string()),
        }
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::pipeline::run_report`].
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV reading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Table operation error.
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Summarization error.
    #[error("Summary error: {0}")]
    Summary(#[from] SummaryError),

    /// No rows survived preparation.
    #[error("No rows to process")]
    EmptyInput,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for summarization.
pub type SummaryResult<T> = Result<T, SummaryError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> PipelineError
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // TableError -> PipelineError
        let table_err = TableError::MissingColumn("Price".into());
        let pipeline_err: PipelineError = table_err.into();
        assert!(pipeline_err.to_string().contains("Price"));
    }

    #[test]
    fn test_invalid_group_level_format() {
        let err = SummaryError::InvalidGroupLevel {
            given: "Street".into(),
            allowed: vec!["Regionname".into(), "Suburb".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Street"));
        assert!(msg.contains("Regionname, Suburb"));
    }

    #[test]
    fn test_table_error_to_summary_error() {
        let err: SummaryError = TableError::MissingColumn("Suburb".into()).into();
        assert!(matches!(err, SummaryError::MissingColumn(c) if c == "Suburb"));
    }
}
