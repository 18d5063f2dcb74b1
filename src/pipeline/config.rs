//! Run configuration
//!
//! Everything the pipeline and its collaborators would otherwise take from
//! module-level constants: input discovery, the span lookback window, the
//! service → operation mapping and report naming.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::stats::SummaryConfig;

/// Configuration for one report run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory holding the JSON exports
    pub input_dir: Option<PathBuf>,
    /// File pattern for input discovery
    pub pattern: String,
    /// Span query window, in hours before now
    pub lookback_hours: u32,
    /// Service name → traced operation name
    pub service_operation_map: BTreeMap<String, String>,
    /// Explicit report path, overriding default naming
    pub output_path: Option<PathBuf>,
    /// Root directory for default report paths
    pub results_dir: PathBuf,
    /// Service the run belongs to (used in default report paths)
    pub service: Option<String>,
    /// Classify and parse documents in parallel
    pub parallel: bool,
    /// Maximum sheet name length the report writer allows
    pub max_sheet_name_len: usize,
    /// Fairness pass settings
    pub summary: SummaryConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input_dir: None,
            pattern: "*.json".to_string(),
            lookback_hours: 6,
            service_operation_map: default_service_operations(),
            output_path: None,
            results_dir: PathBuf::from("results"),
            service: None,
            parallel: false,
            max_sheet_name_len: 31,
            summary: SummaryConfig::default(),
        }
    }
}

fn default_service_operations() -> BTreeMap<String, String> {
    [
        ("ioService", "POST /simulate-io"),
        ("cpuService", "POST /fibonacci"),
        ("echoService", "POST /echo"),
    ]
    .into_iter()
    .map(|(service, operation)| (service.to_string(), operation.to_string()))
    .collect()
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML configuration
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a YAML configuration
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a configuration file, choosing the parser by extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let config = match extension.as_str() {
            "toml" => Self::from_toml_str(&content)?,
            "yaml" | "yml" => Self::from_yaml_str(&content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the input directory
    pub fn with_input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(path.into());
        self
    }

    /// Set the input file pattern
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Set the lookback window
    pub fn with_lookback_hours(mut self, hours: u32) -> Self {
        self.lookback_hours = hours;
        self
    }

    /// Map a service to its traced operation
    pub fn with_service_operation(
        mut self,
        service: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        self.service_operation_map
            .insert(service.into(), operation.into());
        self
    }

    /// Set an explicit report path
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the root for default report paths
    pub fn with_results_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_dir = path.into();
        self
    }

    /// Set the service the run belongs to
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Enable parallel parsing
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set fairness pass settings
    pub fn with_summary(mut self, summary: SummaryConfig) -> Self {
        self.summary = summary;
        self
    }

    /// Operation traced for `service`
    pub fn operation_for(&self, service: &str) -> Option<&str> {
        self.service_operation_map.get(service).map(String::as_str)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pattern.trim().is_empty() {
            return Err(ConfigError::Invalid("pattern must not be empty".to_string()));
        }
        if self.lookback_hours == 0 {
            return Err(ConfigError::Invalid(
                "lookback_hours must be at least 1".to_string(),
            ));
        }
        if self.max_sheet_name_len < 4 {
            return Err(ConfigError::Invalid(
                "max_sheet_name_len must be at least 4".to_string(),
            ));
        }
        if let Some((service, _)) = self
            .service_operation_map
            .iter()
            .find(|(_, operation)| operation.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "service '{service}' maps to an empty operation"
            )));
        }
        self.summary.validate().map_err(ConfigError::Invalid)
    }
}
