//! Classify command implementation

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::classify::{ExportFormat, classify};
use crate::cli::error::CliError;

fn classify_file(path: &Path) -> Result<ExportFormat, CliError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::FileReadError(path.to_path_buf(), e.to_string()))?;
    let document: Value = serde_json::from_str(&content)
        .map_err(|e| CliError::FileReadError(path.to_path_buf(), e.to_string()))?;
    Ok(classify(&document))
}

/// Handle the `classify` command: print the detected format of each file
pub fn handle_classify(files: &[PathBuf]) -> Result<(), CliError> {
    if files.is_empty() {
        return Err(CliError::InvalidArgument("no files given".to_string()));
    }

    let mut failed = 0;
    for path in files {
        match classify_file(path) {
            Ok(format) => println!("{}\t{}", path.display(), format),
            Err(e) => {
                eprintln!("{e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(CliError::InvalidArgument(format!(
            "{failed} of {} file(s) could not be read",
            files.len()
        )));
    }
    Ok(())
}
