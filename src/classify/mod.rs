//! Export schema detection
//!
//! Monitoring exports carry no explicit type tag, so a document is matched
//! against an ordered list of structural detectors. The first detector that
//! accepts the document decides its format. Order matters: a Prometheus
//! export also has a `data` field, and a k6 summary may contain arrays that
//! look like Jaeger payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Known monitoring export shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Prometheus range-vector query result
    Prometheus,
    /// Jaeger trace-query API response
    JaegerQuery,
    /// k6 end-of-test summary
    K6,
    /// Pre-extracted `{spans, traces}` Jaeger export
    JaegerMinimal,
    /// No known shape matched
    Unrecognized,
}

impl ExportFormat {
    /// Formats in detection priority order
    pub fn detection_order() -> [ExportFormat; 4] {
        DETECTORS.map(|(format, _)| format)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Prometheus => "prometheus",
            ExportFormat::JaegerQuery => "jaeger-query",
            ExportFormat::K6 => "k6",
            ExportFormat::JaegerMinimal => "jaeger-minimal",
            ExportFormat::Unrecognized => "unrecognized",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ExportFormat::Unrecognized)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

type Detector = fn(&Value) -> bool;

const DETECTORS: [(ExportFormat, Detector); 4] = [
    (ExportFormat::Prometheus, is_prometheus),
    (ExportFormat::K6, is_k6),
    (ExportFormat::JaegerQuery, is_jaeger_query),
    (ExportFormat::JaegerMinimal, is_jaeger_minimal),
];

/// Classify a parsed JSON document
pub fn classify(document: &Value) -> ExportFormat {
    DETECTORS
        .iter()
        .find(|(_, detect)| detect(document))
        .map(|(format, _)| *format)
        .unwrap_or(ExportFormat::Unrecognized)
}

/// Truthiness as the exporting tools understand it: null, false, zero and
/// empty strings or containers are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn is_prometheus(document: &Value) -> bool {
    let status = document.get("status").map(is_truthy).unwrap_or(false);
    let result_is_list = document
        .get("data")
        .and_then(|d| d.get("result"))
        .map(Value::is_array)
        .unwrap_or(false);
    status && result_is_list
}

fn is_k6(document: &Value) -> bool {
    document
        .as_object()
        .map(|o| o.contains_key("metrics") || o.contains_key("root_group"))
        .unwrap_or(false)
}

fn is_jaeger_query(document: &Value) -> bool {
    document.get("data").map(Value::is_array).unwrap_or(false)
}

fn is_jaeger_minimal(document: &Value) -> bool {
    document
        .as_object()
        .map(|o| o.contains_key("spans") && o.contains_key("traces"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_prometheus() {
        let doc = json!({"status": "success", "data": {"resultType": "matrix", "result": []}});
        assert_eq!(classify(&doc), ExportFormat::Prometheus);
    }

    #[test]
    fn test_prometheus_requires_truthy_status() {
        let doc = json!({"status": "", "data": {"result": []}});
        assert_eq!(classify(&doc), ExportFormat::Unrecognized);

        let doc = json!({"status": "success", "data": {"result": {}}});
        assert_eq!(classify(&doc), ExportFormat::Unrecognized);
    }

    #[test]
    fn test_classify_k6() {
        assert_eq!(classify(&json!({"metrics": {}})), ExportFormat::K6);
        assert_eq!(classify(&json!({"root_group": {}})), ExportFormat::K6);
    }

    #[test]
    fn test_k6_wins_over_jaeger_query() {
        let doc = json!({"metrics": {}, "data": []});
        assert_eq!(classify(&doc), ExportFormat::K6);
    }

    #[test]
    fn test_classify_jaeger_query() {
        let doc = json!({"data": [{"traceID": "t1", "spans": []}], "total": 0});
        assert_eq!(classify(&doc), ExportFormat::JaegerQuery);
    }

    #[test]
    fn test_classify_jaeger_minimal() {
        let doc = json!({"extraction_info": {}, "spans": [], "traces": []});
        assert_eq!(classify(&doc), ExportFormat::JaegerMinimal);

        let doc = json!({"spans": []});
        assert_eq!(classify(&doc), ExportFormat::Unrecognized);
    }

    #[test]
    fn test_classify_non_object() {
        assert_eq!(classify(&json!([1, 2, 3])), ExportFormat::Unrecognized);
        assert_eq!(classify(&json!("metrics")), ExportFormat::Unrecognized);
        assert_eq!(classify(&json!(null)), ExportFormat::Unrecognized);
    }

    #[test]
    fn test_is_recognized() {
        assert!(
            ExportFormat::detection_order()
                .iter()
                .all(ExportFormat::is_recognized)
        );
        assert!(!ExportFormat::Unrecognized.is_recognized());
    }

    #[test]
    fn test_detection_order() {
        assert_eq!(
            ExportFormat::detection_order(),
            [
                ExportFormat::Prometheus,
                ExportFormat::K6,
                ExportFormat::JaegerQuery,
                ExportFormat::JaegerMinimal,
            ]
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!("error")));
        assert!(is_truthy(&json!(1)));
    }
}
