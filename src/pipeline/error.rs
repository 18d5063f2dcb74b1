//! Error types for report runs
//!
//! Per-document failures (an unreadable file, a document whose shape does not
//! match its detected format) are collected into the run report and never
//! abort the run. Everything else is run-level.

use std::path::PathBuf;
use thiserror::Error;

use crate::parse::ParseError;

/// Errors that can occur while loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported config format '{0}' (expected .toml, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur during a report run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input file could not be read or is not JSON
    #[error("Cannot read {path}: {reason}")]
    UnreadableInput { path: PathBuf, reason: String },

    /// Document matched a format but its structure did not
    #[error("Cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// No tables were registered across all inputs
    #[error("No JSON datasets found")]
    EmptyRun,

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Missing required input
    #[error("Missing required input: {0}")]
    MissingInput(String),

    /// Input pattern is not a valid glob
    #[error("Invalid input pattern: {0}")]
    InvalidPattern(String),

    /// IO error with path context
    #[error("IO error with {path}: {message}")]
    IoWithPath {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::UnreadableInput {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Create an IO error with path context
    pub fn io_with_path(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::IoWithPath {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// True for failures confined to a single input document
    pub fn is_document_scoped(&self) -> bool {
        matches!(
            self,
            PipelineError::UnreadableInput { .. } | PipelineError::Parse { .. }
        )
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::EmptyRun => "No JSON datasets found.".to_string(),
            PipelineError::Config(err) => {
                format!("{err}\n\nHint: Check your report configuration file.")
            }
            PipelineError::MissingInput(input) => {
                format!(
                    "Missing required input: {input}\n\nHint: Pass --input or set input_dir in the config."
                )
            }
            PipelineError::InvalidPattern(msg) => {
                format!("Invalid input pattern: {msg}\n\nHint: Patterns use glob syntax, e.g. '*.json'.")
            }
            PipelineError::UnreadableInput { path, reason } => {
                format!(
                    "Cannot read {}: {reason}\n\nHint: Inputs must be JSON exports.",
                    path.display()
                )
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ExportFormat;

    #[test]
    fn test_document_scoped() {
        assert!(PipelineError::unreadable("a.json", "not JSON").is_document_scoped());
        assert!(
            PipelineError::parse("b.json", ParseError::missing(ExportFormat::K6, "metrics"))
                .is_document_scoped()
        );
        assert!(!PipelineError::EmptyRun.is_document_scoped());
        assert!(
            !PipelineError::Config(ConfigError::Invalid("x".into())).is_document_scoped()
        );
    }

    #[test]
    fn test_user_message() {
        assert_eq!(PipelineError::EmptyRun.user_message(), "No JSON datasets found.");
        let msg = PipelineError::MissingInput("input directory".into()).user_message();
        assert!(msg.contains("Hint"));
    }

    #[test]
    fn test_parse_error_keeps_source() {
        use std::error::Error;
        let err = PipelineError::parse("c.json", ParseError::missing(ExportFormat::K6, "metrics"));
        assert!(err.to_string().contains("c.json"));
        assert!(err.source().is_some());
    }
}
