//! Configuration for the statistics pass

use serde::{Deserialize, Serialize};

/// Which columns drive the per-group fairness pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Categorical column rows are grouped by
    pub group_column: String,
    /// Numeric column averaged per group
    pub value_column: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            group_column: "pod".to_string(),
            value_column: "value".to_string(),
        }
    }
}

impl SummaryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grouping column
    pub fn with_group_column(mut self, column: impl Into<String>) -> Self {
        self.group_column = column.into();
        self
    }

    /// Set the value column
    pub fn with_value_column(mut self, column: impl Into<String>) -> Self {
        self.value_column = column.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.group_column.trim().is_empty() {
            return Err("summary.group_column must not be empty".to_string());
        }
        if self.value_column.trim().is_empty() {
            return Err("summary.value_column must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SummaryConfig::default();
        assert_eq!(config.group_column, "pod");
        assert_eq!(config.value_column, "value");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let config = SummaryConfig::new().with_group_column(" ");
        assert!(config.validate().is_err());
    }
}
