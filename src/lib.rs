//! Performance report library - summarize load-test and monitoring exports
//!
//! Turns a directory of JSON exports from Prometheus, Jaeger and k6 into one
//! statistical report:
//! - Format classification of arbitrary JSON documents
//! - Parsing into uniform canonical tables
//! - An ordered dataset registry with collision-safe names
//! - Overall statistics (mean, std, p95, p99, p99.99) and per-pod fairness
//!   (Gini coefficient) rows
//! - Report writing (JSON or YAML) and span-export helpers for Jaeger
//!
//! # Example
//!
//! ```rust,ignore
//! use perf_report::{ReportConfig, ReportPipeline};
//!
//! let config = ReportConfig::new().with_input_dir("results/current");
//! let report = ReportPipeline::new(config)?.run()?;
//! println!("{} tables, {} summary rows", report.registry.len(), report.summary.len());
//! ```

pub mod classify;
pub mod extract;
pub mod parse;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod stats;
pub mod table;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export commonly used types
pub use classify::{ExportFormat, classify};
pub use extract::{ExtractionError, ExtractionExport, ExtractionRequest};
pub use parse::{ParseError, parse_document};
pub use pipeline::{
    ConfigError, DocumentOutcome, PipelineError, PipelineResult, ReportConfig, ReportPipeline,
    RunReport, discover_inputs, run_pipeline,
};
pub use registry::DatasetRegistry;
pub use report::{ReportDocument, ReportFormat, write_report};
pub use stats::{StatisticsEngine, SummaryConfig, SummaryRow};
pub use table::{CanonicalTable, Cell, ColumnKind};
