//! Error types for export parsing

use thiserror::Error;

use crate::classify::ExportFormat;

/// A document matched a format but violates that format's internal shape
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Required field missing
    #[error("{format} document is missing `{field}`")]
    MissingField { format: ExportFormat, field: String },

    /// Field present with the wrong JSON type
    #[error("{format} field `{field}` has unexpected shape: expected {expected}")]
    UnexpectedShape {
        format: ExportFormat,
        field: String,
        expected: &'static str,
    },

    /// Prometheus sample value that is neither numeric nor the NaN sentinel
    #[error("Invalid sample value {value} in series {series}")]
    InvalidSample { series: usize, value: String },

    /// Prometheus sample timestamp that cannot be read as epoch seconds
    #[error("Invalid sample timestamp {value} in series {series}")]
    InvalidTimestamp { series: usize, value: String },
}

impl ParseError {
    pub(crate) fn missing(format: ExportFormat, field: impl Into<String>) -> Self {
        Self::MissingField {
            format,
            field: field.into(),
        }
    }

    pub(crate) fn shape(
        format: ExportFormat,
        field: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::UnexpectedShape {
            format,
            field: field.into(),
            expected,
        }
    }
}
