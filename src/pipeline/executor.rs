//! Report run executor: discover, classify, parse, register, summarize

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use super::config::ReportConfig;
use super::error::{PipelineError, PipelineResult};
use crate::classify::{ExportFormat, classify};
use crate::parse::parse_document;
use crate::registry::DatasetRegistry;
use crate::stats::{StatisticsEngine, SummaryRow, summary_table};
use crate::table::CanonicalTable;

/// What happened to one input document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    /// Detected format, `None` when the file could not be read
    pub format: Option<ExportFormat>,
    /// Names the document's tables were registered under
    pub tables: Vec<String>,
    pub error: Option<String>,
}

impl DocumentOutcome {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of a completed report run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub registry: DatasetRegistry,
    pub summary: Vec<SummaryRow>,
    pub documents: Vec<DocumentOutcome>,
}

impl RunReport {
    /// Summary rows rendered as the `Summary` table
    pub fn summary_table(&self) -> CanonicalTable {
        summary_table(&self.summary)
    }

    pub fn failed_documents(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.documents.iter().filter(|d| d.is_failed())
    }
}

/// Find input files under `dir` matching `pattern`, sorted by path
pub fn discover_inputs(dir: &Path, pattern: &str) -> PipelineResult<Vec<PathBuf>> {
    let full_pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.display().to_string()),
        pattern
    );

    let entries = glob::glob(&full_pattern)
        .map_err(|e| PipelineError::InvalidPattern(format!("{pattern}: {e}")))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Error accessing path"),
        }
    }
    files.sort();

    debug!(dir = %dir.display(), pattern, count = files.len(), "Discovered inputs");
    Ok(files)
}

/// A document after classification and parsing, before registration
struct ParsedDocument {
    path: PathBuf,
    format: Option<ExportFormat>,
    tables: PipelineResult<Vec<CanonicalTable>>,
}

/// Runs the report pipeline over a set of JSON exports
pub struct ReportPipeline {
    config: ReportConfig,
    engine: StatisticsEngine,
}

impl ReportPipeline {
    /// Create a pipeline, validating the configuration
    pub fn new(config: ReportConfig) -> PipelineResult<Self> {
        config.validate()?;
        let engine = StatisticsEngine::new(config.summary.clone());
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Discover inputs from the configured directory and run over them
    pub fn run(&self) -> PipelineResult<RunReport> {
        let dir = self
            .config
            .input_dir
            .as_deref()
            .ok_or_else(|| PipelineError::MissingInput("input directory".to_string()))?;

        let paths = discover_inputs(dir, &self.config.pattern)?;
        self.run_paths(&paths)
    }

    /// Run over an explicit list of input files, in the given order
    pub fn run_paths(&self, paths: &[PathBuf]) -> PipelineResult<RunReport> {
        let run = ReportRun::start();
        let _span = info_span!("report_run", run_id = %run.run_id, inputs = paths.len()).entered();
        info!(inputs = paths.len(), parallel = self.config.parallel, "Starting report run");

        let parsed = self.parse_all(paths);
        self.finish(run, parsed)
    }

    /// Run over a single in-memory document
    pub fn ingest_value(&self, document: &Value, file_stem: &str) -> PipelineResult<RunReport> {
        let run = ReportRun::start();
        let _span = info_span!("report_run", run_id = %run.run_id, inputs = 1).entered();

        let parsed = parse_value(PathBuf::from(file_stem), document, file_stem);
        self.finish(run, vec![parsed])
    }

    #[cfg(feature = "parallel")]
    fn parse_all(&self, paths: &[PathBuf]) -> Vec<ParsedDocument> {
        use rayon::prelude::*;

        if self.config.parallel {
            // collect preserves input order for the merge
            paths.par_iter().map(|p| load_and_parse(p)).collect()
        } else {
            paths.iter().map(|p| load_and_parse(p)).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn parse_all(&self, paths: &[PathBuf]) -> Vec<ParsedDocument> {
        if self.config.parallel {
            warn!("Parallel parsing requested but the 'parallel' feature is disabled");
        }
        paths.iter().map(|p| load_and_parse(p)).collect()
    }

    fn finish(&self, mut run: ReportRun, parsed: Vec<ParsedDocument>) -> PipelineResult<RunReport> {
        for document in parsed {
            run.record(document);
        }

        if run.registry.is_empty() {
            warn!(
                documents = run.documents.len(),
                failed = run.documents.iter().filter(|d| d.is_failed()).count(),
                "No tables registered"
            );
            return Err(PipelineError::EmptyRun);
        }

        let summary = self.engine.summarize(&run.registry);
        let duration_ms = run.started.elapsed().as_millis() as u64;

        info!(
            tables = run.registry.len(),
            rows = run.registry.total_rows(),
            summary_rows = summary.len(),
            duration_ms,
            "Report run completed"
        );

        Ok(RunReport {
            run_id: run.run_id,
            started_at: run.started_at,
            duration_ms,
            registry: run.registry,
            summary,
            documents: run.documents,
        })
    }
}

/// Accumulator for one run, merged serially in input order
struct ReportRun {
    run_id: String,
    started_at: DateTime<Utc>,
    started: Instant,
    registry: DatasetRegistry,
    documents: Vec<DocumentOutcome>,
}

impl ReportRun {
    fn start() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            started: Instant::now(),
            registry: DatasetRegistry::new(),
            documents: Vec::new(),
        }
    }

    fn record(&mut self, document: ParsedDocument) {
        let ParsedDocument { path, format, tables } = document;

        let outcome = match tables {
            Ok(tables) => {
                let names = tables
                    .into_iter()
                    .filter_map(|t| self.registry.register(t))
                    .collect::<Vec<_>>();
                debug!(path = %path.display(), tables = ?names, "Registered document");
                DocumentOutcome {
                    path,
                    format,
                    tables: names,
                    error: None,
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping document");
                DocumentOutcome {
                    path,
                    format,
                    tables: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        self.documents.push(outcome);
    }
}

fn load_and_parse(path: &Path) -> ParsedDocument {
    let document = match read_document(path) {
        Ok(document) => document,
        Err(e) => {
            return ParsedDocument {
                path: path.to_path_buf(),
                format: None,
                tables: Err(e),
            };
        }
    };

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_value(path.to_path_buf(), &document, &stem)
}

fn read_document(path: &Path) -> PipelineResult<Value> {
    let content =
        std::fs::read_to_string(path).map_err(|e| PipelineError::unreadable(path, e))?;
    serde_json::from_str(&content).map_err(|e| PipelineError::unreadable(path, e))
}

fn parse_value(path: PathBuf, document: &Value, file_stem: &str) -> ParsedDocument {
    let format = classify(document);
    debug!(path = %path.display(), format = %format, "Classified document");

    let tables = parse_document(format, document, file_stem)
        .map_err(|source| PipelineError::parse(&path, source));

    ParsedDocument {
        path,
        format: Some(format),
        tables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn prometheus_doc(values: &[&str]) -> Value {
        let samples: Vec<Value> = values
            .iter()
            .enumerate()
            .map(|(i, v)| json!([1_700_000_000 + i as i64, v]))
            .collect();
        json!({
            "status": "success",
            "data": {"resultType": "matrix", "result": [
                {"metric": {"pod": "api-0"}, "values": samples}
            ]}
        })
    }

    #[test]
    fn test_discover_inputs_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["b.json", "a.json", "notes.txt"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }

        let files = discover_inputs(dir.path(), "*.json").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_discover_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            discover_inputs(dir.path(), "[*.json"),
            Err(PipelineError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_ingest_value() {
        let pipeline = ReportPipeline::new(ReportConfig::default()).unwrap();
        let report = pipeline
            .ingest_value(&prometheus_doc(&["1", "2", "3"]), "cpu_pct_usage")
            .unwrap();

        assert_eq!(report.registry.names(), vec!["prometheus_cpu_pct_usage"]);
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.documents[0].format, Some(ExportFormat::Prometheus));
        assert_eq!(report.summary[0].unit, "%");
        assert_eq!(report.summary_table().name(), "Summary");
    }

    #[test]
    fn test_unrecognized_only_is_empty_run() {
        let pipeline = ReportPipeline::new(ReportConfig::default()).unwrap();
        let result = pipeline.ingest_value(&json!({"foo": 1}), "misc");
        assert!(matches!(result, Err(PipelineError::EmptyRun)));
    }

    #[test]
    fn test_run_without_input_dir() {
        let pipeline = ReportPipeline::new(ReportConfig::default()).unwrap();
        assert!(matches!(pipeline.run(), Err(PipelineError::MissingInput(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ReportConfig::default().with_lookback_hours(0);
        assert!(matches!(
            ReportPipeline::new(config),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_bad_document_does_not_abort_run() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("a_mem.json"),
            prometheus_doc(&["10", "20"]).to_string(),
        )
        .unwrap();
        std::fs::write(dir.path().join("b_broken.json"), "{not json").unwrap();
        std::fs::write(
            dir.path().join("c_k6.json"),
            json!({"metrics": "oops"}).to_string(),
        )
        .unwrap();

        let config = ReportConfig::default().with_input_dir(dir.path());
        let report = ReportPipeline::new(config).unwrap().run().unwrap();

        assert_eq!(report.registry.names(), vec!["prometheus_a_mem"]);
        assert_eq!(report.documents.len(), 3);
        let failed: Vec<_> = report.failed_documents().collect();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].format, None);
        assert_eq!(failed[1].format, Some(ExportFormat::K6));
    }
}
