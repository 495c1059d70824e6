//! Error types for gridtruth.

use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for gridtruth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while recovering table structure.
#[derive(Error, Debug)]
pub enum Error {
    /// Two renders expected to differ only locally do not satisfy that precondition.
    #[error("Render mismatch: {0}")]
    RenderMismatch(String),

    /// A located table still contains the marker color inside its border.
    #[error("Table {0} is nested or non-rectangular")]
    InvalidTableShape(String),

    /// Too few grid lines survived merging.
    #[error("Table {table} has an insufficient grid ({horizontal} horizontal, {vertical} vertical lines)")]
    InsufficientGrid {
        /// Table key
        table: String,
        /// Horizontal lines after merging
        horizontal: usize,
        /// Vertical lines after merging
        vertical: usize,
    },

    /// The allocator cannot issue the requested number of distinct colors.
    #[error("Color space exhausted: requested {requested}, only {available} colors left")]
    ExhaustedColorSpace {
        /// Number of colors requested
        requested: usize,
        /// Number of colors still available
        available: usize,
    },

    /// Markup injection or rendering failed.
    #[error("External stage '{stage}' failed: {message}")]
    ExternalStageFailure {
        /// Stage name (e.g., "render", "draw_border")
        stage: String,
        /// Collaborator error message
        message: String,
    },

    /// An external call exceeded its time bound.
    #[error("External stage '{stage}' timed out after {after:?}")]
    Timeout {
        /// Stage name
        stage: String,
        /// Bound that was exceeded
        after: Duration,
    },

    /// The document contains no table eligible for recovery.
    #[error("No tables in the document")]
    NoTables,

    /// A table key string could not be parsed.
    #[error("Invalid table key: {0}")]
    InvalidTableKey(String),

    /// A color code could not be parsed.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Image decoding or encoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Serialization error (JSON, color tables).
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a collaborator failure for the named stage.
    pub fn external(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ExternalStageFailure {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Whether this failure only affects a single table.
    ///
    /// Table-level failures are absorbed by the coordinator: the table is
    /// skipped and the rest of the document continues.
    pub fn is_table_level(&self) -> bool {
        matches!(
            self,
            Error::InvalidTableShape(_) | Error::InsufficientGrid { .. }
        )
    }

    /// Failure log category for a document-level error.
    pub fn category(&self) -> FailureCategory {
        match self {
            Error::RenderMismatch(_) => FailureCategory::RenderMismatch,
            Error::ExhaustedColorSpace { .. } => FailureCategory::ColorSpace,
            Error::ExternalStageFailure { .. } => FailureCategory::Render,
            Error::Timeout { .. } => FailureCategory::Timeout,
            Error::NoTables => FailureCategory::NoTables,
            Error::Io(_) | Error::Image(_) => FailureCategory::Io,
            _ => FailureCategory::Other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io_err) => Error::Io(io_err),
            _ => Error::Serialization(message),
        }
    }
}

/// Category of a document-level failure; each category has its own
/// append-only log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// Markup injection or rendering failed
    Render,
    /// An external call timed out
    Timeout,
    /// No eligible tables
    NoTables,
    /// Allocator could not satisfy the request
    ColorSpace,
    /// Renders disagreed on layout
    RenderMismatch,
    /// Reading or writing artifacts failed
    Io,
    /// Anything else
    Other,
}

impl FailureCategory {
    /// All categories, in log order.
    pub const ALL: [FailureCategory; 7] = [
        FailureCategory::Render,
        FailureCategory::Timeout,
        FailureCategory::NoTables,
        FailureCategory::ColorSpace,
        FailureCategory::RenderMismatch,
        FailureCategory::Io,
        FailureCategory::Other,
    ];

    /// Short name used in log records.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::Render => "render",
            FailureCategory::Timeout => "timeout",
            FailureCategory::NoTables => "no_tables",
            FailureCategory::ColorSpace => "color_space",
            FailureCategory::RenderMismatch => "render_mismatch",
            FailureCategory::Io => "io",
            FailureCategory::Other => "other",
        }
    }

    /// File name of the append-only log for this category.
    pub fn log_file_name(&self) -> String {
        match self {
            FailureCategory::NoTables => "no_tables.csv".to_string(),
            other => format!("{}_failed.csv", other.as_str()),
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NoTables;
        assert_eq!(err.to_string(), "No tables in the document");

        let err = Error::InsufficientGrid {
            table: "doc_0_1".to_string(),
            horizontal: 2,
            vertical: 3,
        };
        assert_eq!(
            err.to_string(),
            "Table doc_0_1 has an insufficient grid (2 horizontal, 3 vertical lines)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.category(), FailureCategory::Io);
    }

    #[test]
    fn test_table_level_errors() {
        assert!(Error::InvalidTableShape("doc_0_0".into()).is_table_level());
        assert!(!Error::NoTables.is_table_level());
        assert!(!Error::external("render", "crashed").is_table_level());
    }

    #[test]
    fn test_failure_log_names() {
        assert_eq!(FailureCategory::NoTables.log_file_name(), "no_tables.csv");
        assert_eq!(FailureCategory::Render.log_file_name(), "render_failed.csv");
        assert_eq!(
            Error::Timeout {
                stage: "render".into(),
                after: Duration::from_secs(1)
            }
            .category(),
            FailureCategory::Timeout
        );
    }
}
