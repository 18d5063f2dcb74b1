//! Descriptive statistics over nullable samples

use serde::{Deserialize, Serialize};

/// Summary of one numeric sample set.
///
/// `count` is the number of samples offered, nulls included. Every other
/// statistic is computed over the non-null samples only and is `None` when
/// there are none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
    pub p9999: Option<f64>,
}

/// Describe a column of nullable samples
pub fn describe(samples: &[Option<f64>]) -> Description {
    let mut present: Vec<f64> = samples.iter().flatten().copied().collect();
    present.sort_by(f64::total_cmp);

    let mean = mean(&present);
    Description {
        count: samples.len(),
        mean,
        std: mean.map(|m| population_std(&present, m)),
        p95: percentile(&present, 0.95),
        p99: percentile(&present, 0.99),
        p9999: percentile(&present, 0.9999),
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn population_std(values: &[f64], mean: f64) -> f64 {
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Percentile of ascending-sorted values, interpolating linearly between the
/// two closest ranks. `q` is a fraction in `[0, 1]`.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Gini coefficient of a population of non-negative values.
///
/// `G = 2·Σ i·v_i / (n·Σ v_i) − (n+1)/n` over ascending values, 1-based `i`.
/// Fewer than two values, or a zero total, give 0.
pub fn gini(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let total: f64 = sorted.iter().sum();
    if total == 0.0 {
        return 0.0;
    }

    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, v)| (i + 1) as f64 * v)
        .sum();
    let n = n as f64;
    (2.0 * weighted) / (n * total) - (n + 1.0) / n
}
