//! perf-report: summarize load-test and monitoring exports

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use perf_report::cli::commands::classify::handle_classify;
use perf_report::cli::commands::summarize::{SummarizeArgs, handle_summarize};
use perf_report::report::ReportFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify, parse and summarize every JSON export in a directory
    Summarize {
        /// Directory holding the JSON exports
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// File pattern inside the input directory
        #[arg(long)]
        pattern: Option<String>,

        /// Report path (default: results/<service>/summary_<timestamp>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML or YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum)]
        format: Option<ReportFormat>,

        /// Service the run belongs to
        #[arg(short, long)]
        service: Option<String>,

        /// Parse documents in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Print the detected export format of each file
    Classify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "error" => Level::ERROR,
            _ => Level::WARN,
        };
        EnvFilter::default().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Summarize {
            input,
            pattern,
            output,
            config,
            format,
            service,
            parallel,
        } => {
            let args = SummarizeArgs {
                input,
                pattern,
                output,
                config_file: config,
                format,
                service,
                parallel,
            };
            handle_summarize(&args).map_err(|e| anyhow!(e.user_message()))
        }
        Command::Classify { files } => {
            handle_classify(&files).map_err(|e| anyhow!(e.user_message()))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
