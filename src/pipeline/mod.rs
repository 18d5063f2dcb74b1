//! Report pipeline: the end-to-end entry point
//!
//! A run takes a set of JSON exports and produces a [`RunReport`]:
//! - Discover input files under the configured directory (glob, sorted)
//! - Classify each document and parse it into canonical tables
//! - Register the tables in input order
//! - Compute the overall and fairness summary rows
//!
//! # Example
//!
//! ```rust,ignore
//! use perf_report::pipeline::{ReportConfig, ReportPipeline};
//!
//! let config = ReportConfig::new().with_input_dir("results/current");
//! let report = ReportPipeline::new(config)?.run()?;
//!
//! for row in &report.summary {
//!     println!("{} {:?}", row.sheet, row.mean);
//! }
//! ```
//!
//! # Failure handling
//!
//! A document that cannot be read, or whose structure does not match its
//! detected format, is recorded as a failed [`DocumentOutcome`] and the run
//! continues. A run that registers no table at all fails with
//! [`PipelineError::EmptyRun`].

mod config;
mod error;
mod executor;

pub use config::ReportConfig;
pub use error::{ConfigError, PipelineError, PipelineResult};
pub use executor::{DocumentOutcome, ReportPipeline, RunReport, discover_inputs};

/// Build a pipeline from `config` and run it over the configured input directory
pub fn run_pipeline(config: ReportConfig) -> PipelineResult<RunReport> {
    ReportPipeline::new(config)?.run()
}
