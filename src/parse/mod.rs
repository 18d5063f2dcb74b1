//! Format parsers
//!
//! Each parser turns a classified document into zero or more named
//! [`CanonicalTable`]s. Table names combine a format prefix with the source
//! file's base name, e.g. `prometheus_node_cpu` or `jaeger_spans_run1`.
//! Parsers never return empty tables.
//!
//! ```rust,ignore
//! use perf_report::classify::classify;
//! use perf_report::parse::parse_document;
//!
//! let doc: serde_json::Value = serde_json::from_str(&content)?;
//! let tables = parse_document(classify(&doc), &doc, "node_cpu")?;
//! ```

mod error;
mod jaeger;
mod k6;
mod prometheus;

pub use error::ParseError;
pub use jaeger::{parse_jaeger_minimal, parse_jaeger_query};
pub use k6::parse_k6;
pub use prometheus::{NAN_SENTINEL, parse_prometheus};

use serde_json::{Map, Value};

use crate::classify::ExportFormat;
use crate::table::CanonicalTable;

pub const PROMETHEUS_PREFIX: &str = "prometheus_";
pub const JAEGER_TRACES_PREFIX: &str = "jaeger_traces_";
pub const JAEGER_SPANS_PREFIX: &str = "jaeger_spans_";
pub const K6_CHECKS_PREFIX: &str = "k6_checks_";
pub const K6_METRICS_PREFIX: &str = "k6_metrics_";

/// Parse a document already classified as `format`.
///
/// `file_stem` is the source file's base name without extension.
/// Unrecognized documents yield no tables.
pub fn parse_document(
    format: ExportFormat,
    document: &Value,
    file_stem: &str,
) -> Result<Vec<CanonicalTable>, ParseError> {
    let tables = match format {
        ExportFormat::Prometheus => parse_prometheus(document, file_stem)?,
        ExportFormat::JaegerQuery => parse_jaeger_query(document, file_stem)?,
        ExportFormat::K6 => parse_k6(document, file_stem)?,
        ExportFormat::JaegerMinimal => parse_jaeger_minimal(document, file_stem)?,
        ExportFormat::Unrecognized => Vec::new(),
    };
    Ok(non_empty(tables))
}

pub(crate) fn expect_array<'a>(
    value: &'a Value,
    format: ExportFormat,
    field: &str,
) -> Result<&'a Vec<Value>, ParseError> {
    value
        .as_array()
        .ok_or_else(|| ParseError::shape(format, field, "array"))
}

pub(crate) fn expect_object<'a>(
    value: &'a Value,
    format: ExportFormat,
    field: &str,
) -> Result<&'a Map<String, Value>, ParseError> {
    value
        .as_object()
        .ok_or_else(|| ParseError::shape(format, field, "object"))
}

/// Numeric field that defaults to zero when absent or null
pub(crate) fn number_or_zero(
    object: &Map<String, Value>,
    key: &str,
    format: ExportFormat,
    field: &str,
) -> Result<f64, ParseError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(0.0),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| ParseError::shape(format, field, "number")),
    }
}

pub(crate) fn non_empty(tables: Vec<CanonicalTable>) -> Vec<CanonicalTable> {
    tables.into_iter().filter(|t| !t.is_empty()).collect()
}
