//! k6 end-of-test summaries (`--summary-export` and `handleSummary` output)

use serde_json::{Map, Value};
use tracing::debug;

use super::{
    K6_CHECKS_PREFIX, K6_METRICS_PREFIX, ParseError, expect_object, non_empty, number_or_zero,
};
use crate::classify::ExportFormat;
use crate::table::{CanonicalTable, Cell};

const FORMAT: ExportFormat = ExportFormat::K6;

/// Trend statistics copied from each metric, as (source key, column)
const METRIC_FIELDS: [(&str, &str); 6] = [
    ("min", "min"),
    ("avg", "avg"),
    ("max", "max"),
    ("p(95)", "p95"),
    ("p(99)", "p99"),
    ("p(99.99)", "p9999"),
];

/// Parse a k6 summary into `k6_checks_<file>` and `k6_metrics_<file>`
pub fn parse_k6(document: &Value, file_stem: &str) -> Result<Vec<CanonicalTable>, ParseError> {
    let mut checks = CanonicalTable::with_columns(
        format!("{K6_CHECKS_PREFIX}{file_stem}"),
        &["check", "passes", "fails", "rate"],
    );

    match document.get("root_group").and_then(|g| g.get("checks")) {
        None | Some(Value::Null) => {}
        Some(Value::Object(named)) => {
            for (name, check) in named {
                let check = expect_object(check, FORMAT, "root_group.checks{}")?;
                push_check(&mut checks, name, check)?;
            }
        }
        Some(Value::Array(list)) => {
            for check in list {
                let check = expect_object(check, FORMAT, "root_group.checks[]")?;
                let name = check
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ParseError::missing(FORMAT, "root_group.checks[].name"))?;
                push_check(&mut checks, name, check)?;
            }
        }
        Some(_) => {
            return Err(ParseError::shape(
                FORMAT,
                "root_group.checks",
                "object or array",
            ));
        }
    }

    let mut metrics = CanonicalTable::with_columns(
        format!("{K6_METRICS_PREFIX}{file_stem}"),
        &["metric", "min", "avg", "max", "p95", "p99", "p9999"],
    );

    match document.get("metrics") {
        None | Some(Value::Null) => {}
        Some(Value::Object(all)) => {
            for (name, info) in all {
                let Some(stats) = trend_stats(info) else {
                    continue;
                };
                let mut record = vec![("metric", Cell::from(name.as_str()))];
                record.extend(
                    METRIC_FIELDS
                        .iter()
                        .map(|(key, column)| (*column, Cell::from(stats.get(*key).and_then(Value::as_f64)))),
                );
                metrics.push_record(record);
            }
        }
        Some(_) => return Err(ParseError::shape(FORMAT, "metrics", "object")),
    }

    debug!(
        file = file_stem,
        checks = checks.len(),
        metrics = metrics.len(),
        "Parsed k6 summary"
    );
    Ok(non_empty(vec![checks, metrics]))
}

fn push_check(
    table: &mut CanonicalTable,
    name: &str,
    check: &Map<String, Value>,
) -> Result<(), ParseError> {
    let passes = number_or_zero(check, "passes", FORMAT, "root_group.checks.passes")?;
    let fails = number_or_zero(check, "fails", FORMAT, "root_group.checks.fails")?;
    let total = passes + fails;
    let rate = (total != 0.0).then(|| passes / total);

    table.push_record([
        ("check", Cell::from(name)),
        ("passes", Cell::from(passes)),
        ("fails", Cell::from(fails)),
        ("rate", Cell::from(rate)),
    ]);
    Ok(())
}

/// Statistics object of a metric that exposes a `min`, either flat or under
/// `values`. Counters and gauges without one are skipped.
fn trend_stats(info: &Value) -> Option<&Map<String, Value>> {
    let info = info.as_object()?;
    let has_min = |m: &Map<String, Value>| m.get("min").is_some_and(|v| !v.is_null());

    if has_min(info) {
        return Some(info);
    }
    info.get("values")
        .and_then(Value::as_object)
        .filter(|values| has_min(values))
}
