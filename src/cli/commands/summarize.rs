//! Summarize command implementation

use std::path::PathBuf;

use chrono::Utc;

use crate::cli::error::CliError;
use crate::cli::output::format_run_summary;
use crate::pipeline::{PipelineError, ReportConfig, ReportPipeline};
use crate::report::{ReportDocument, ReportFormat, default_report_path, write_report};

/// Arguments for the `summarize` command
#[derive(Debug, Clone, Default)]
pub struct SummarizeArgs {
    /// Directory holding the JSON exports
    pub input: Option<PathBuf>,
    /// File pattern, overriding the configured one
    pub pattern: Option<String>,
    /// Report path, overriding default naming
    pub output: Option<PathBuf>,
    /// TOML or YAML configuration file
    pub config_file: Option<PathBuf>,
    /// Report format; taken from the output extension when absent
    pub format: Option<ReportFormat>,
    /// Service the run belongs to
    pub service: Option<String>,
    pub parallel: bool,
}

impl SummarizeArgs {
    /// Resolve the run configuration: file first, then flags on top
    pub fn to_config(&self) -> Result<ReportConfig, CliError> {
        let mut config = match &self.config_file {
            Some(path) => ReportConfig::load(path)?,
            None => ReportConfig::default(),
        };

        if let Some(input) = &self.input {
            config = config.with_input_dir(input);
        }
        if let Some(pattern) = &self.pattern {
            config = config.with_pattern(pattern);
        }
        if let Some(output) = &self.output {
            config = config.with_output_path(output);
        }
        if let Some(service) = &self.service {
            config = config.with_service(service);
        }
        if self.parallel {
            config = config.with_parallel(true);
        }

        if config.input_dir.is_none() {
            return Err(CliError::InvalidArgument(
                "no input directory: pass --input or set input_dir in the config".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Handle the `summarize` command
pub fn handle_summarize(args: &SummarizeArgs) -> Result<(), CliError> {
    let config = args.to_config()?;
    let pipeline = ReportPipeline::new(config)?;

    let report = match pipeline.run() {
        Ok(report) => report,
        Err(PipelineError::EmptyRun) => {
            println!("No JSON datasets found.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let config = pipeline.config();
    let mut path = default_report_path(config, Utc::now().naive_utc());
    let format = match args.format {
        Some(format) => {
            if config.output_path.is_none() {
                path.set_extension(format.extension());
            }
            format
        }
        None => ReportFormat::from_path(&path),
    };

    let document = ReportDocument::from_run(&report, config.max_sheet_name_len);
    write_report(&path, &document, format)?;

    print!("{}", format_run_summary(&report));
    println!("Summary written to {}", path.display());
    Ok(())
}
