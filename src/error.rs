use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// All errors surfaced by the filter core. Every variant is terminal for the
/// operation that raised it; nothing is retried and there is no partial
/// success. Callers report the message and wait for new input.
#[derive(Debug, Error)]
pub enum SiftError {
    /// The uploaded file is neither CSV nor XLSX.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The file content could not be parsed into rows and columns.
    #[error("failed to parse table: {0}")]
    Parse(String),

    /// A predicate value falls outside the column's observed domain,
    /// or min > max, or the column cannot carry that predicate at all.
    #[error("invalid predicate for column '{column}': {reason}")]
    InvalidPredicate { column: String, reason: String },

    /// The filtered table could not be encoded as a spreadsheet.
    #[error("failed to serialize table: {0}")]
    Serialization(String),
}

impl SiftError {
    pub(crate) fn invalid_predicate(column: &str, reason: impl Into<String>) -> SiftError {
        SiftError::InvalidPredicate {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}
