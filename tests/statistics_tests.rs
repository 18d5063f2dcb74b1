//! Statistics engine tests

use perf_report::registry::DatasetRegistry;
use perf_report::stats::{
    StatisticsEngine, SummaryConfig, SummaryKind, describe, gini, summary_table, unit_for,
};
use perf_report::table::{CanonicalTable, Cell};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn grouped(name: &str, column: &str, samples: &[(&str, f64)]) -> CanonicalTable {
    let mut table = CanonicalTable::with_columns(name, &["timestamp", "value"]);
    for (key, value) in samples {
        table.push_record([("value", Cell::from(*value)), (column, Cell::from(*key))]);
    }
    table
}

mod gini_tests {
    use super::*;

    #[test]
    fn test_equal_means_are_perfectly_fair() {
        assert_eq!(gini(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_skewed_means_between_zero_and_one() {
        let g = gini(&[1.0, 1.0, 1.0, 100.0]);
        assert!(g > 0.0 && g < 1.0);
    }

    #[test]
    fn test_approaches_one_with_inequality() {
        let mut values = vec![0.0; 99];
        values.push(1.0);
        assert!(gini(&values) > 0.98);
    }

    #[test]
    fn test_fewer_than_two_groups() {
        assert_eq!(gini(&[]), 0.0);
        assert_eq!(gini(&[3.0]), 0.0);
    }
}

mod describe_tests {
    use super::*;

    #[test]
    fn test_percentiles_of_uniform_range() {
        let samples: Vec<Option<f64>> = (0..=10_000).map(|v| Some(v as f64)).collect();
        let d = describe(&samples);
        assert_eq!(d.count, 10_001);
        assert!(close(d.mean.unwrap(), 5000.0));
        assert!(close(d.p95.unwrap(), 9500.0));
        assert!(close(d.p99.unwrap(), 9900.0));
        assert!(close(d.p9999.unwrap(), 9999.0));
    }

    #[test]
    fn test_nulls_counted_not_averaged() {
        let d = describe(&[Some(1.0), None, None, Some(3.0)]);
        assert_eq!(d.count, 4);
        assert_eq!(d.mean, Some(2.0));
    }
}

mod unit_tests {
    use super::*;

    #[test]
    fn test_unit_heuristic() {
        assert_eq!(unit_for("prometheus_node_memory_usage"), "bytes");
        assert_eq!(unit_for("k6_metrics_load1"), "ms");
        assert_eq!(unit_for("prometheus_cpu_pct_usage"), "%");
        assert_eq!(unit_for("jaeger_traces_fib"), "ms");
        assert_eq!(unit_for("jaeger_spans_fib"), "ms");
        assert_eq!(unit_for("prometheus_cpu_usage"), "");
        assert_eq!(unit_for("k6_checks_load1"), "");
    }

    #[test]
    fn test_pct_takes_precedence_over_memory() {
        assert_eq!(unit_for("prometheus_memory_pct_used"), "%");
    }
}

mod engine_tests {
    use super::*;

    #[test]
    fn test_overall_rows_before_fairness_rows() {
        let mut registry = DatasetRegistry::new();
        registry.register(grouped("prometheus_a", "pod", &[("p1", 1.0), ("p2", 3.0)]));
        registry.register(grouped("prometheus_b", "pod", &[("p1", 2.0)]));

        let rows = StatisticsEngine::default().summarize(&registry);
        let kinds: Vec<_> = rows.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SummaryKind::Overall,
                SummaryKind::Overall,
                SummaryKind::Fairness,
                SummaryKind::Group,
                SummaryKind::Group,
                SummaryKind::Fairness,
                SummaryKind::Group,
            ]
        );
        assert_eq!(rows[0].sheet, "prometheus_a");
        assert_eq!(rows[1].sheet, "prometheus_b");
        assert_eq!(rows[5].sheet, "prometheus_b_pods_gini");
        assert_eq!(rows[5].mean, Some(0.0));
    }

    #[test]
    fn test_custom_group_column() {
        let mut registry = DatasetRegistry::new();
        registry.register(grouped(
            "prometheus_load",
            "instance",
            &[("n1", 2.0), ("n2", 4.0), ("n2", 4.0)],
        ));

        let config = SummaryConfig::new().with_group_column("instance");
        let rows = StatisticsEngine::new(config).summarize(&registry);

        assert_eq!(rows[1].sheet, "prometheus_load_instances_gini");
        assert!(close(rows[1].mean.unwrap(), 2.0 * 10.0 / 12.0 - 1.5));
        assert_eq!(rows[2].sheet, "prometheus_load_instance_n1");
        assert_eq!(rows[3].count, 2);

        let default_rows = StatisticsEngine::default().summarize(&registry);
        assert_eq!(default_rows.len(), 1);
    }

    #[test]
    fn test_table_without_statistic_column_skipped() {
        let mut table = CanonicalTable::new("jaeger_traces_x");
        table.push_record([("trace_id", Cell::from("t1"))]);
        let mut registry = DatasetRegistry::new();
        registry.register(table);

        assert!(StatisticsEngine::default().summarize(&registry).is_empty());
    }

    #[test]
    fn test_summary_table_layout() {
        let mut registry = DatasetRegistry::new();
        registry.register(grouped("prometheus_a", "pod", &[("p1", 1.0)]));
        let rows = StatisticsEngine::default().summarize(&registry);

        let table = summary_table(&rows);
        assert_eq!(table.name(), "Summary");
        assert_eq!(
            table.column_names(),
            vec!["sheet", "count", "mean", "std", "p95", "p99", "p99.99", "unit"]
        );
        assert_eq!(table.len(), rows.len());
        assert_eq!(table.cell(0, "count"), Some(&Cell::Number(1.0)));
    }
}
