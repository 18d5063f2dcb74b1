//! Trace extraction helpers
//!
//! The deterministic half of pulling spans out of a Jaeger span store: the
//! span-search query, zero-duration filtering, trace assembly and the export
//! document the JaegerMinimal parser reads back. Running the query against a
//! live store is left to the caller.
//!
//! ```rust,ignore
//! use perf_report::extract::ExtractionRequest;
//!
//! let request = ExtractionRequest::new("cpuService", &config)?;
//! let body = request.search_query(Utc::now());
//! let hits: Vec<Value> = store.scan(&body)?; // span `_source` objects
//! let export = request.export(hits, Utc::now());
//! write_export(&dir.join(request.default_file_name(Utc::now(), export.spans.len())), &export)?;
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

use crate::pipeline::ReportConfig;

static FILENAME_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[/ ]").expect("valid filename regex"));

/// Errors that can occur while preparing or writing an extraction
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unknown service '{service}' (known: {})", known.join(", "))]
    UnknownService { service: String, known: Vec<String> },

    #[error("IO error with {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Spans of one service operation over a lookback window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub service: String,
    pub operation: String,
    pub lookback_hours: u32,
}

impl ExtractionRequest {
    /// Resolve the traced operation of `service` from the configuration
    pub fn new(service: &str, config: &ReportConfig) -> Result<Self, ExtractionError> {
        let operation =
            config
                .operation_for(service)
                .ok_or_else(|| ExtractionError::UnknownService {
                    service: service.to_string(),
                    known: config.service_operation_map.keys().cloned().collect(),
                })?;

        Ok(Self {
            service: service.to_string(),
            operation: operation.to_string(),
            lookback_hours: config.lookback_hours,
        })
    }

    /// Query window as `(start, end)` epoch microseconds
    pub fn time_window(&self, now: DateTime<Utc>) -> (i64, i64) {
        let start = now - Duration::hours(i64::from(self.lookback_hours));
        (start.timestamp_micros(), now.timestamp_micros())
    }

    /// Span-search query body, oldest span first
    pub fn search_query(&self, now: DateTime<Utc>) -> Value {
        let (start_us, end_us) = self.time_window(now);
        json!({
            "query": {"bool": {"must": [
                {"range": {"startTime": {"gte": start_us, "lte": end_us}}},
                {"term": {"process.serviceName": self.service}},
                {"term": {"operationName": self.operation}},
            ]}},
            "sort": [{"startTime": {"order": "asc"}}]
        })
    }

    /// `<service>_<operation>_<H>h_ALL<count>_<YYYYmmdd_HHMMSS>.json`
    pub fn default_file_name(&self, now: DateTime<Utc>, span_count: usize) -> String {
        format!(
            "{}_{}_{}h_ALL{}_{}.json",
            self.service,
            sanitize_operation(&self.operation),
            self.lookback_hours,
            span_count,
            now.format("%Y%m%d_%H%M%S")
        )
    }

    /// Assemble the export document from fetched span sources
    pub fn export(&self, spans: Vec<Value>, now: DateTime<Utc>) -> ExtractionExport {
        let fetched = spans.len();
        let spans = retain_timed_spans(spans);
        let traces = build_traces(&spans);

        debug!(
            service = %self.service,
            fetched,
            kept = spans.len(),
            traces = traces.len(),
            "Assembled extraction"
        );

        ExtractionExport {
            extraction_info: ExtractionInfo {
                service: self.service.clone(),
                operation: self.operation.clone(),
                lookback_hours: self.lookback_hours,
                extraction_time: now,
                total_spans: spans.len(),
                total_traces: traces.len(),
            },
            spans,
            traces,
        }
    }
}

/// Replace the characters of an operation name that are unsafe in file names
pub fn sanitize_operation(operation: &str) -> String {
    FILENAME_UNSAFE.replace_all(operation, "_").into_owned()
}

fn span_number(span: &Value, field: &str) -> f64 {
    span.get(field).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Drop spans whose duration is missing, zero or negative
pub fn retain_timed_spans(spans: Vec<Value>) -> Vec<Value> {
    spans
        .into_iter()
        .filter(|span| span_number(span, "duration") > 0.0)
        .collect()
}

/// One assembled trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub trace_id: Option<String>,
    pub span_count: usize,
    pub duration_us: f64,
    pub duration_ms: f64,
}

/// Group spans by `traceID` in first-seen order. A trace lasts from its
/// earliest span start to its latest span end.
pub fn build_traces(spans: &[Value]) -> Vec<TraceSummary> {
    // (trace id, span count, min start, max end)
    let mut traces: Vec<(Option<String>, usize, f64, f64)> = Vec::new();
    let mut positions: HashMap<Option<String>, usize> = HashMap::new();

    for span in spans {
        let trace_id = span.get("traceID").and_then(Value::as_str).map(str::to_string);
        let start = span_number(span, "startTime");
        let end = start + span_number(span, "duration");

        match positions.get(&trace_id) {
            Some(&pos) => {
                let trace = &mut traces[pos];
                trace.1 += 1;
                trace.2 = trace.2.min(start);
                trace.3 = trace.3.max(end);
            }
            None => {
                positions.insert(trace_id.clone(), traces.len());
                traces.push((trace_id, 1, start, end));
            }
        }
    }

    traces
        .into_iter()
        .map(|(trace_id, span_count, min_start, max_end)| {
            let duration_us = max_end - min_start;
            TraceSummary {
                trace_id,
                span_count,
                duration_us,
                duration_ms: duration_us / 1000.0,
            }
        })
        .collect()
}

/// Header of an export document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionInfo {
    pub service: String,
    pub operation: String,
    pub lookback_hours: u32,
    pub extraction_time: DateTime<Utc>,
    pub total_spans: usize,
    pub total_traces: usize,
}

/// Export document: classified as JaegerMinimal when read back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionExport {
    pub extraction_info: ExtractionInfo,
    pub spans: Vec<Value>,
    pub traces: Vec<TraceSummary>,
}

/// Write an export as pretty-printed JSON, creating parent directories
pub fn write_export(path: &Path, export: &ExtractionExport) -> Result<(), ExtractionError> {
    let io_err = |source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let content = serde_json::to_string_pretty(export)?;
    std::fs::write(path, content).map_err(io_err)?;

    info!(
        path = %path.display(),
        spans = export.extraction_info.total_spans,
        traces = export.extraction_info.total_traces,
        "Exported spans and traces"
    );
    Ok(())
}
