//! Prometheus range-vector exports (`/api/v1/query_range` responses)

use serde_json::Value;
use tracing::debug;

use super::{PROMETHEUS_PREFIX, ParseError, expect_array, expect_object, non_empty};
use crate::classify::ExportFormat;
use crate::table::{CanonicalTable, Cell, timestamp_from_secs};

/// Sample value Prometheus emits for a missing observation
pub const NAN_SENTINEL: &str = "NaN";

const FORMAT: ExportFormat = ExportFormat::Prometheus;
const TIMESTAMP: &str = "timestamp";
const VALUE: &str = "value";

/// Parse a Prometheus export into `prometheus_<file>`.
///
/// One row per (series, sample). Series labels become categorical columns;
/// the table's column set is the union of all label sets.
pub fn parse_prometheus(
    document: &Value,
    file_stem: &str,
) -> Result<Vec<CanonicalTable>, ParseError> {
    if document.get("status").and_then(Value::as_str) != Some("success") {
        debug!(file = file_stem, "Prometheus export without success status");
        return Ok(Vec::new());
    }

    let results = document
        .get("data")
        .and_then(|d| d.get("result"))
        .ok_or_else(|| ParseError::missing(FORMAT, "data.result"))?;
    let results = expect_array(results, FORMAT, "data.result")?;

    let mut table =
        CanonicalTable::with_columns(format!("{PROMETHEUS_PREFIX}{file_stem}"), &[TIMESTAMP, VALUE]);

    for (series, result) in results.iter().enumerate() {
        let result = expect_object(result, FORMAT, "data.result[]")?;

        let labels: Vec<(String, Cell)> = match result.get("metric") {
            None | Some(Value::Null) => Vec::new(),
            Some(metric) => expect_object(metric, FORMAT, "data.result[].metric")?
                .iter()
                .filter(|(name, _)| name.as_str() != TIMESTAMP && name.as_str() != VALUE)
                .map(|(name, value)| (name.clone(), Cell::from_json(value)))
                .collect(),
        };

        let samples = match result.get("values") {
            None | Some(Value::Null) => continue,
            Some(values) => expect_array(values, FORMAT, "data.result[].values")?,
        };

        for sample in samples {
            let (timestamp, value) = parse_sample(series, sample)?;
            let mut record = Vec::with_capacity(labels.len() + 2);
            record.push((TIMESTAMP.to_string(), Cell::Timestamp(timestamp)));
            record.push((VALUE.to_string(), Cell::from(value)));
            record.extend(labels.iter().cloned());
            table.push_record(record);
        }
    }

    debug!(
        table = table.name(),
        rows = table.len(),
        series = results.len(),
        "Parsed Prometheus export"
    );
    Ok(non_empty(vec![table]))
}

fn parse_sample(
    series: usize,
    sample: &Value,
) -> Result<(chrono::DateTime<chrono::Utc>, Option<f64>), ParseError> {
    let pair = match sample.as_array() {
        Some(pair) if pair.len() == 2 => pair,
        _ => {
            return Err(ParseError::shape(
                FORMAT,
                "data.result[].values[]",
                "[timestamp, value] pair",
            ));
        }
    };

    let secs = match &pair[0] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let timestamp = secs
        .and_then(timestamp_from_secs)
        .ok_or_else(|| ParseError::InvalidTimestamp {
            series,
            value: pair[0].to_string(),
        })?;

    Ok((timestamp, parse_value(series, &pair[1])?))
}

/// Parse a sample value; the NaN sentinel (and anything else reading as NaN)
/// maps to a missing value.
fn parse_value(series: usize, raw: &Value) -> Result<Option<f64>, ParseError> {
    let invalid = || ParseError::InvalidSample {
        series,
        value: raw.to_string(),
    };
    let parsed = match raw {
        Value::String(s) if s == NAN_SENTINEL => return Ok(None),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        Value::Number(n) => n.as_f64().ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };
    Ok((!parsed.is_nan()).then_some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_series() -> Value {
        json!({
            "status": "success",
            "data": {
                "resultType": "matrix",
                "result": [
                    {
                        "metric": {"pod": "api-1", "namespace": "perf"},
                        "values": [[1700000000, "0.5"], [1700000015, "NaN"], [1700000030, "1.5"]]
                    },
                    {
                        "metric": {"pod": "api-2", "node": "worker-3"},
                        "values": [[1700000000.5, "2"], ["1700000015", "3e0"]]
                    }
                ]
            }
        })
    }

    #[test]
    fn test_rows_and_label_union() {
        let tables = parse_prometheus(&two_series(), "node_cpu").unwrap();
        assert_eq!(tables.len(), 1);

        let table = &tables[0];
        assert_eq!(table.name(), "prometheus_node_cpu");
        assert_eq!(table.len(), 5);

        let mut columns = table.column_names();
        columns.sort();
        assert_eq!(columns, vec!["namespace", "node", "pod", "timestamp", "value"]);

        assert_eq!(table.cell(0, "node"), Some(&Cell::Null));
        assert_eq!(table.cell(3, "namespace"), Some(&Cell::Null));
        assert_eq!(table.cell(4, "node"), Some(&Cell::from("worker-3")));
    }

    #[test]
    fn test_nan_sentinel_is_null() {
        let tables = parse_prometheus(&two_series(), "x").unwrap();
        let values = tables[0].numeric_values("value").unwrap();
        assert_eq!(
            values,
            vec![Some(0.5), None, Some(1.5), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_timestamps_are_converted() {
        let tables = parse_prometheus(&two_series(), "x").unwrap();
        match tables[0].cell(3, "timestamp") {
            Some(Cell::Timestamp(ts)) => {
                assert_eq!(ts.timestamp(), 1_700_000_000);
                assert_eq!(ts.timestamp_subsec_millis(), 500);
            }
            other => panic!("expected timestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_value_is_error() {
        let doc = json!({
            "status": "success",
            "data": {"result": [{"metric": {}, "values": [[1, "abc"]]}]}
        });
        let err = parse_prometheus(&doc, "x").unwrap_err();
        assert!(matches!(err, ParseError::InvalidSample { series: 0, .. }));
    }

    #[test]
    fn test_malformed_sample_shape_is_error() {
        let doc = json!({
            "status": "success",
            "data": {"result": [{"values": [[1]]}]}
        });
        assert!(matches!(
            parse_prometheus(&doc, "x"),
            Err(ParseError::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn test_failed_status_yields_nothing() {
        let doc = json!({"status": "error", "data": {"result": []}});
        assert!(parse_prometheus(&doc, "x").unwrap().is_empty());
    }

    #[test]
    fn test_empty_result_yields_nothing() {
        let doc = json!({"status": "success", "data": {"result": [{"metric": {"pod": "a"}, "values": []}]}});
        assert!(parse_prometheus(&doc, "x").unwrap().is_empty());
    }

    #[test]
    fn test_labels_do_not_override_sample_columns() {
        let doc = json!({
            "status": "success",
            "data": {"result": [{"metric": {"value": "label", "job": "node"}, "values": [[1, "4"]]}]}
        });
        let tables = parse_prometheus(&doc, "x").unwrap();
        assert_eq!(tables[0].cell(0, "value"), Some(&Cell::Number(4.0)));
        assert_eq!(tables[0].cell(0, "job"), Some(&Cell::from("node")));
    }
}
