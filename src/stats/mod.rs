//! Statistics engine
//!
//! Walks a [`DatasetRegistry`] once and produces the summary rows of a run:
//!
//! 1. **Overall**: one row per table, computed over the first column of
//!    [`PRIMARY_COLUMNS`] the table has. Tables with none are skipped.
//! 2. **Fairness**: for tables with both a grouping column (`pod` by default)
//!    and a value column (`value`), one Gini row over the per-group means,
//!    followed by one row per group.
//!
//! ```rust,ignore
//! use perf_report::stats::{StatisticsEngine, SummaryConfig, summary_table};
//!
//! let engine = StatisticsEngine::new(SummaryConfig::default());
//! let rows = engine.summarize(&registry);
//! let sheet = summary_table(&rows);
//! ```

mod config;
mod describe;

pub use config::SummaryConfig;
pub use describe::{Description, describe, gini, mean, percentile};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parse::{JAEGER_SPANS_PREFIX, JAEGER_TRACES_PREFIX, K6_METRICS_PREFIX, PROMETHEUS_PREFIX};
use crate::registry::DatasetRegistry;
use crate::table::{CanonicalTable, Cell};

/// Candidate statistic columns in priority order; the first one present wins
pub const PRIMARY_COLUMNS: [&str; 6] = [
    "value",
    "trace_duration_ms",
    "duration_ms",
    "rate",
    "avg",
    "p9999",
];

/// Name of the rendered summary table
pub const SUMMARY_TABLE: &str = "Summary";

/// What a summary row describes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    /// Whole table
    #[default]
    Overall,
    /// Gini coefficient across groups
    Fairness,
    /// One group of a table
    Group,
}

/// One row of the summary sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub sheet: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
    #[serde(rename = "p99.99")]
    pub p9999: Option<f64>,
    pub unit: String,
    #[serde(skip)]
    pub kind: SummaryKind,
}

impl SummaryRow {
    fn from_description(
        sheet: String,
        description: Description,
        unit: &str,
        kind: SummaryKind,
    ) -> Self {
        Self {
            sheet,
            count: description.count,
            mean: description.mean,
            std: description.std,
            p95: description.p95,
            p99: description.p99,
            p9999: description.p9999,
            unit: unit.to_string(),
            kind,
        }
    }
}

/// Unit of a table's statistics, guessed from its name.
///
/// Prometheus tables whose name contains `_pct_` are percentages and those
/// mentioning `memory` are bytes; Jaeger and k6 metric tables are
/// milliseconds. The guess relies on file naming, so CPU percentages without
/// `_pct_` in the file name stay unitless.
pub fn unit_for(table: &str) -> &'static str {
    if table.starts_with(PROMETHEUS_PREFIX) {
        if table.contains("_pct_") {
            return "%";
        }
        if table.contains("memory") {
            return "bytes";
        }
    }
    if table.starts_with(JAEGER_TRACES_PREFIX)
        || table.starts_with(JAEGER_SPANS_PREFIX)
        || table.starts_with(K6_METRICS_PREFIX)
    {
        return "ms";
    }
    ""
}

/// First column of [`PRIMARY_COLUMNS`] present in `table`
pub fn primary_column(table: &CanonicalTable) -> Option<&'static str> {
    PRIMARY_COLUMNS.into_iter().find(|c| table.has_column(c))
}

/// Builds summary rows from a registry
#[derive(Debug, Clone, Default)]
pub struct StatisticsEngine {
    config: SummaryConfig,
}

impl StatisticsEngine {
    pub fn new(config: SummaryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Overall rows for every table, then fairness rows, in registry order
    pub fn summarize(&self, registry: &DatasetRegistry) -> Vec<SummaryRow> {
        let mut rows: Vec<SummaryRow> = registry
            .iter()
            .filter_map(|table| self.overall_row(table))
            .collect();
        for table in registry {
            rows.extend(self.fairness_rows(table));
        }
        rows
    }

    /// Overall statistics of a table's primary column
    pub fn overall_row(&self, table: &CanonicalTable) -> Option<SummaryRow> {
        let Some(column) = primary_column(table) else {
            debug!(table = table.name(), "No statistic column, skipping");
            return None;
        };
        let values = table.numeric_values(column)?;
        debug!(table = table.name(), column, "Summarizing table");

        Some(SummaryRow::from_description(
            table.name().to_string(),
            describe(&values),
            unit_for(table.name()),
            SummaryKind::Overall,
        ))
    }

    /// Gini row plus one row per group, empty when the table lacks the
    /// grouping or value column.
    pub fn fairness_rows(&self, table: &CanonicalTable) -> Vec<SummaryRow> {
        let group_column = self.config.group_column.as_str();
        let (Some(keys), Some(values)) = (
            table.column_cells(group_column),
            table.numeric_values(&self.config.value_column),
        ) else {
            return Vec::new();
        };

        let mut groups: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
        for (key, value) in keys.into_iter().zip(values) {
            if let Some(key) = key.group_key() {
                groups.entry(key).or_default().push(value);
            }
        }

        let unit = unit_for(table.name());
        let group_rows: Vec<SummaryRow> = groups
            .iter()
            .map(|(key, samples)| {
                SummaryRow::from_description(
                    format!("{}_{}_{}", table.name(), group_column, key),
                    describe(samples),
                    unit,
                    SummaryKind::Group,
                )
            })
            .collect();

        let means: Vec<f64> = group_rows.iter().filter_map(|r| r.mean).collect();
        let coefficient = gini(&means);
        debug!(
            table = table.name(),
            groups = groups.len(),
            gini = coefficient,
            "Computed fairness"
        );

        let mut rows = Vec::with_capacity(group_rows.len() + 1);
        rows.push(SummaryRow {
            sheet: format!("{}_{}s_gini", table.name(), group_column),
            count: means.len(),
            mean: Some(coefficient),
            std: None,
            p95: None,
            p99: None,
            p9999: None,
            unit: "%".to_string(),
            kind: SummaryKind::Fairness,
        });
        rows.extend(group_rows);
        rows
    }
}

/// Render summary rows as the `Summary` table
pub fn summary_table(rows: &[SummaryRow]) -> CanonicalTable {
    let mut table = CanonicalTable::with_columns(
        SUMMARY_TABLE,
        &["sheet", "count", "mean", "std", "p95", "p99", "p99.99", "unit"],
    );
    for row in rows {
        table.push_record([
            ("sheet", Cell::from(row.sheet.as_str())),
            ("count", Cell::from(row.count)),
            ("mean", Cell::from(row.mean)),
            ("std", Cell::from(row.std)),
            ("p95", Cell::from(row.p95)),
            ("p99", Cell::from(row.p99)),
            ("p99.99", Cell::from(row.p9999)),
            ("unit", Cell::from(row.unit.as_str())),
        ]);
    }
    table
}
