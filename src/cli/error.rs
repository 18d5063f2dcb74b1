//! CLI error type

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::{ConfigError, PipelineError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to read {0}: {1}")]
    FileReadError(PathBuf, String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl CliError {
    /// Message shown to the user, with hints where the pipeline has them
    pub fn user_message(&self) -> String {
        match self {
            CliError::Pipeline(err) => err.user_message(),
            CliError::Config(err) => {
                format!("{err}\n\nHint: Check the file passed with --config.")
            }
            _ => self.to_string(),
        }
    }
}
