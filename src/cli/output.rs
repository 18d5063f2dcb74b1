//! Output formatting for CLI

use crate::pipeline::RunReport;
use crate::stats::SummaryKind;

fn stat(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".to_string())
}

/// Format a completed run as a plain-text summary
pub fn format_run_summary(report: &RunReport) -> String {
    let mut output = String::new();

    let failed: Vec<_> = report.failed_documents().collect();
    if !failed.is_empty() {
        output.push_str("\n⚠️  Skipped documents:\n");
        for document in &failed {
            output.push_str(&format!(
                "  - {}: {}\n",
                document.path.display(),
                document.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    output.push_str(&format!(
        "\n✅ Registered {} table(s), {} row(s)\n\n",
        report.registry.len(),
        report.registry.total_rows()
    ));

    let width = report
        .summary
        .iter()
        .map(|r| r.sheet.chars().count() + 2)
        .max()
        .unwrap_or(5)
        .max(5);

    output.push_str(&format!(
        "{:<width$}  {:>8}  {:>12}  {:>12}  {:>12}  {:>12}  unit\n",
        "sheet", "count", "mean", "std", "p95", "p99"
    ));
    for row in &report.summary {
        let indent = if row.kind == SummaryKind::Group { "  " } else { "" };
        output.push_str(&format!(
            "{:<width$}  {:>8}  {:>12}  {:>12}  {:>12}  {:>12}  {}\n",
            format!("{indent}{}", row.sheet),
            row.count,
            stat(row.mean),
            stat(row.std),
            stat(row.p95),
            stat(row.p99),
            row.unit
        ));
    }

    output
}
