//! Report writer
//!
//! Bundles the `Summary` table and every registered table of a run into one
//! document of named sheets, and writes it as JSON or YAML.
//!
//! Sheet names are limited to [`ReportConfig::max_sheet_name_len`]
//! characters. Names that collide after truncation get `~2`, `~3`, ...
//! suffixes in sheet order.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::pipeline::{PipelineError, PipelineResult, ReportConfig, RunReport};
use crate::table::CanonicalTable;

/// Output format of a written report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Yaml,
}

impl ReportFormat {
    /// Pick the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
            .unwrap_or_default()
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Yaml => "yaml",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "yaml" | "yml" => Ok(ReportFormat::Yaml),
            other => Err(format!("unknown report format '{other}'")),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One named sheet of a report
#[derive(Debug, Clone, Serialize)]
pub struct ReportSheet {
    /// Display name, truncated to the sheet name limit
    pub sheet: String,
    pub table: CanonicalTable,
}

/// Everything a report file contains
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub sheets: Vec<ReportSheet>,
}

impl ReportDocument {
    /// Build the document for a completed run: `Summary` first, then every
    /// registered table in registration order.
    pub fn from_run(report: &RunReport, max_sheet_name_len: usize) -> Self {
        let mut used = HashSet::new();
        let tables = std::iter::once(report.summary_table())
            .chain(report.registry.iter().cloned());

        let sheets = tables
            .map(|table| ReportSheet {
                sheet: sheet_name(table.name(), max_sheet_name_len, &mut used),
                table,
            })
            .collect();

        Self {
            run_id: report.run_id.clone(),
            generated_at: Utc::now(),
            sheets,
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&ReportSheet> {
        self.sheets.iter().find(|s| s.sheet == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.sheet.as_str()).collect()
    }
}

/// Truncate `name` to `max_len` characters, suffixing `~n` when the result
/// is already in `used`.
pub fn sheet_name(name: &str, max_len: usize, used: &mut HashSet<String>) -> String {
    let mut candidate: String = name.chars().take(max_len).collect();
    let mut n = 2;
    while used.contains(&candidate) {
        let suffix = format!("~{n}");
        let keep = max_len.saturating_sub(suffix.chars().count());
        candidate = name.chars().take(keep).collect::<String>() + &suffix;
        n += 1;
    }
    if candidate != name {
        debug!(table = name, sheet = %candidate, "Shortened sheet name");
    }
    used.insert(candidate.clone());
    candidate
}

/// Serialize `document` in `format`
pub fn render_report(document: &ReportDocument, format: ReportFormat) -> PipelineResult<String> {
    Ok(match format {
        ReportFormat::Json => serde_json::to_string_pretty(document)?,
        ReportFormat::Yaml => serde_yaml::to_string(document)?,
    })
}

/// Write `document` to `path`, creating parent directories
pub fn write_report(
    path: &Path,
    document: &ReportDocument,
    format: ReportFormat,
) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            PipelineError::io_with_path(parent, "Failed to create report directory", e)
        })?;
    }

    let content = render_report(document, format)?;
    std::fs::write(path, content)
        .map_err(|e| PipelineError::io_with_path(path, "Failed to write report", e))?;

    info!(path = %path.display(), sheets = document.sheets.len(), %format, "Wrote report");
    Ok(())
}

/// Where a run's report goes: the configured output path, or
/// `<results_dir>/<service|done>/summary_<YYYYmmdd_HHMMSS>.json`
pub fn default_report_path(config: &ReportConfig, now: NaiveDateTime) -> PathBuf {
    if let Some(path) = &config.output_path {
        return path.clone();
    }
    config
        .results_dir
        .join(config.service.as_deref().unwrap_or("done"))
        .join(format!("summary_{}.json", now.format("%Y%m%d_%H%M%S")))
}
