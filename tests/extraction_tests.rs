//! Trace extraction tests
//!
//! An export written by the extraction helpers must come back through the
//! pipeline as a JaegerMinimal document.

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use tempfile::TempDir;

use perf_report::classify::{ExportFormat, classify};
use perf_report::extract::{ExtractionExport, ExtractionRequest, build_traces, write_export};
use perf_report::pipeline::{ReportConfig, ReportPipeline};
use perf_report::table::Cell;

fn fetched_spans() -> Vec<Value> {
    vec![
        json!({"traceID": "t1", "spanID": "a", "operationName": "POST /fibonacci", "startTime": 1_000, "duration": 2_000}),
        json!({"traceID": "t1", "spanID": "b", "operationName": "POST /fibonacci", "startTime": 0, "duration": 500}),
        json!({"traceID": "t2", "spanID": "c", "operationName": "POST /fibonacci", "startTime": 9_000, "duration": 0}),
        json!({"traceID": "t3", "spanID": "d", "operationName": "POST /fibonacci", "startTime": 20_000, "duration": 1_500}),
    ]
}

#[test]
fn test_export_round_trips_through_pipeline() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
    let config = ReportConfig::default();
    let request = ExtractionRequest::new("cpuService", &config).unwrap();
    let export = request.export(fetched_spans(), now);

    assert_eq!(export.extraction_info.total_spans, 3);
    assert_eq!(export.extraction_info.total_traces, 2);

    let dir = TempDir::new().unwrap();
    let file_name = request.default_file_name(now, export.spans.len());
    assert_eq!(file_name, "cpuService_POST__fibonacci_6h_ALL3_20240501_083000.json");
    let path = dir.path().join("current").join(&file_name);
    write_export(&path, &export).unwrap();

    let document: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(classify(&document), ExportFormat::JaegerMinimal);

    let reread: ExtractionExport = serde_json::from_value(document).unwrap();
    assert_eq!(reread, export);

    let report = ReportPipeline::new(config.with_input_dir(dir.path().join("current")))
        .unwrap()
        .run()
        .unwrap();

    let stem = file_name.trim_end_matches(".json");
    let traces = report.registry.get(&format!("jaeger_traces_{stem}")).unwrap();
    let spans = report.registry.get(&format!("jaeger_spans_{stem}")).unwrap();
    assert_eq!(traces.len(), 2);
    assert_eq!(spans.len(), 3);
    assert_eq!(traces.cell(0, "trace_id"), Some(&Cell::from("t1")));
    assert_eq!(traces.cell(0, "duration_ms"), Some(&Cell::Number(3.0)));

    let trace_row = report
        .summary
        .iter()
        .find(|r| r.sheet == format!("jaeger_traces_{stem}"))
        .unwrap();
    assert_eq!(trace_row.unit, "ms");
    assert_eq!(trace_row.count, 2);
    assert_eq!(trace_row.mean, Some(2.25));
}

#[test]
fn test_traces_keep_first_seen_order() {
    let traces = build_traces(&fetched_spans());
    let ids: Vec<_> = traces.iter().map(|t| t.trace_id.as_deref()).collect();
    assert_eq!(ids, vec![Some("t1"), Some("t2"), Some("t3")]);
    assert_eq!(traces[0].duration_us, 3_000.0);
    assert_eq!(traces[0].span_count, 2);
}

#[test]
fn test_configured_operation_map() {
    let config = ReportConfig::default()
        .with_service_operation("authService", "GET /token")
        .with_lookback_hours(1);
    let request = ExtractionRequest::new("authService", &config).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();

    assert_eq!(
        request.default_file_name(now, 0),
        "authService_GET__token_1h_ALL0_20240501_083000.json"
    );
    let (start, end) = request.time_window(now);
    assert_eq!(end - start, 3_600_000_000);
}
