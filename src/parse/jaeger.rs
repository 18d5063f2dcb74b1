//! Jaeger trace exports
//!
//! Two shapes are supported: the trace-query API response (`{"data": [trace]}`)
//! and the pre-extracted `{spans, traces}` file written by the trace extraction
//! helpers in [`crate::extract`].

use serde_json::Value;
use tracing::debug;

use super::{
    JAEGER_SPANS_PREFIX, JAEGER_TRACES_PREFIX, ParseError, expect_array, expect_object,
    non_empty, number_or_zero,
};
use crate::classify::ExportFormat;
use crate::table::{CanonicalTable, Cell};

const MICROS_PER_MILLI: f64 = 1_000.0;
const MICROS_PER_SEC: f64 = 1_000_000.0;

/// Parse a Jaeger query response into `jaeger_traces_<file>` and
/// `jaeger_spans_<file>`.
///
/// Traces without spans are skipped. Trace duration runs from the earliest
/// span start to the latest span end, so overlapping spans are not summed.
pub fn parse_jaeger_query(
    document: &Value,
    file_stem: &str,
) -> Result<Vec<CanonicalTable>, ParseError> {
    const FORMAT: ExportFormat = ExportFormat::JaegerQuery;

    let data = document
        .get("data")
        .ok_or_else(|| ParseError::missing(FORMAT, "data"))?;
    let data = expect_array(data, FORMAT, "data")?;

    let mut traces = CanonicalTable::with_columns(
        format!("{JAEGER_TRACES_PREFIX}{file_stem}"),
        &["trace_id", "span_count", "trace_duration_ms", "start_time"],
    );
    let mut spans = CanonicalTable::with_columns(
        format!("{JAEGER_SPANS_PREFIX}{file_stem}"),
        &["trace_id", "span_id", "operation", "start_time", "duration_ms"],
    );

    for trace in data {
        let trace = expect_object(trace, FORMAT, "data[]")?;
        let trace_id = trace.get("traceID").map(Cell::from_json).unwrap_or(Cell::Null);

        let span_list = match trace.get("spans") {
            None | Some(Value::Null) => continue,
            Some(list) => expect_array(list, FORMAT, "data[].spans")?,
        };
        if span_list.is_empty() {
            continue;
        }

        let mut first_start = f64::INFINITY;
        let mut last_end = f64::NEG_INFINITY;
        for span in span_list {
            let span = expect_object(span, FORMAT, "data[].spans[]")?;
            let start = number_or_zero(span, "startTime", FORMAT, "data[].spans[].startTime")?;
            let duration = number_or_zero(span, "duration", FORMAT, "data[].spans[].duration")?;
            first_start = first_start.min(start);
            last_end = last_end.max(start + duration);

            spans.push_record([
                ("trace_id", trace_id.clone()),
                ("span_id", span.get("spanID").map(Cell::from_json).unwrap_or(Cell::Null)),
                (
                    "operation",
                    span.get("operationName")
                        .map(Cell::from_json)
                        .unwrap_or(Cell::Null),
                ),
                ("start_time", Cell::timestamp_secs(start / MICROS_PER_SEC)),
                ("duration_ms", Cell::from(duration / MICROS_PER_MILLI)),
            ]);
        }

        traces.push_record([
            ("trace_id", trace_id),
            ("span_count", Cell::from(span_list.len())),
            (
                "trace_duration_ms",
                Cell::from((last_end - first_start) / MICROS_PER_MILLI),
            ),
            ("start_time", Cell::timestamp_secs(first_start / MICROS_PER_SEC)),
        ]);
    }

    debug!(
        file = file_stem,
        traces = traces.len(),
        spans = spans.len(),
        "Parsed Jaeger query export"
    );
    Ok(non_empty(vec![traces, spans]))
}

/// Register the already row-shaped `traces` and `spans` arrays as tables
pub fn parse_jaeger_minimal(
    document: &Value,
    file_stem: &str,
) -> Result<Vec<CanonicalTable>, ParseError> {
    const FORMAT: ExportFormat = ExportFormat::JaegerMinimal;

    let mut tables = Vec::with_capacity(2);
    for (field, prefix) in [("traces", JAEGER_TRACES_PREFIX), ("spans", JAEGER_SPANS_PREFIX)] {
        let rows = document
            .get(field)
            .ok_or_else(|| ParseError::missing(FORMAT, field))?;
        let rows = expect_array(rows, FORMAT, field)?;

        let mut table = CanonicalTable::new(format!("{prefix}{file_stem}"));
        for row in rows {
            let row = expect_object(row, FORMAT, &format!("{field}[]"))?;
            table.push_record(row.iter().map(|(k, v)| (k.as_str(), Cell::from_json(v))));
        }
        tables.push(table);
    }

    Ok(non_empty(tables))
}
