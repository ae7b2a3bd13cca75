use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::insights::{DurationStats, LabeledStats, Trend, TrendDirection, VariabilityFlag};

pub fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Middle value, or the mean of the two middle values for even-length input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| cmp_f64(*a, *b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1 denominator). A single value yields zero.
#[allow(clippy::cast_precision_loss)]
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    if values.len() < 2 {
        return Some(0.0);
    }

    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Standard deviation as a percentage of the mean.
pub fn coefficient_of_variation(std_dev: f64, mean: f64) -> f64 {
    if mean == 0.0 {
        0.0
    } else {
        (std_dev / mean) * 100.0
    }
}

impl DurationStats {
    /// Summarizes a series of durations. Returns `None` for an empty series.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let mean = mean(samples)?;
        let median = median(samples)?;
        let std_dev = std_dev(samples)?;
        let min = samples.iter().copied().min_by(|a, b| cmp_f64(*a, *b))?;
        let max = samples.iter().copied().max_by(|a, b| cmp_f64(*a, *b))?;

        Some(Self {
            count: samples.len(),
            mean,
            median,
            min,
            max,
            std_dev,
            coefficient_of_variation: coefficient_of_variation(std_dev, mean),
        })
    }
}

/// Summarizes every label with at least `min_samples` durations.
///
/// Labels below the threshold are omitted. The result is sorted by label.
pub fn summarize_labels(
    samples: &IndexMap<String, Vec<f64>>,
    min_samples: usize,
) -> Vec<LabeledStats> {
    let mut stats: Vec<LabeledStats> = samples
        .iter()
        .filter(|(_, durations)| durations.len() >= min_samples.max(1))
        .filter_map(|(label, durations)| {
            DurationStats::from_samples(durations).map(|stats| LabeledStats {
                label: label.clone(),
                stats,
            })
        })
        .collect();

    stats.sort_by(|a, b| a.label.cmp(&b.label));
    stats
}

/// Labels whose coefficient of variation exceeds `threshold`, highest first.
pub fn high_variability(
    stats: &[LabeledStats],
    threshold: f64,
    top: usize,
) -> Vec<VariabilityFlag> {
    let mut flagged: Vec<VariabilityFlag> = stats
        .iter()
        .filter(|s| s.stats.coefficient_of_variation > threshold)
        .map(|s| VariabilityFlag {
            label: s.label.clone(),
            coefficient_of_variation: s.stats.coefficient_of_variation,
        })
        .collect();

    flagged.sort_by(|a, b| cmp_f64(b.coefficient_of_variation, a.coefficient_of_variation));
    flagged.truncate(top);
    flagged
}

/// Compares the most recent and the oldest runs.
///
/// `durations` must be ordered most recent first. Both windows hold
/// `min(window, len / 2)` values so they never overlap. Returns `None` with
/// fewer than `min_runs` values or when the oldest window averages zero.
pub fn compare_trend(
    durations: &[f64],
    window: usize,
    min_runs: usize,
    stable_threshold: f64,
) -> Option<Trend> {
    if durations.len() < min_runs.max(2) {
        return None;
    }

    let window = window.min(durations.len() / 2);
    if window == 0 {
        return None;
    }

    let recent_mean = mean(&durations[..window])?;
    let oldest_mean = mean(&durations[durations.len() - window..])?;
    if oldest_mean == 0.0 {
        return None;
    }

    let delta_percent = ((recent_mean - oldest_mean) / oldest_mean) * 100.0;

    let direction = if delta_percent == 0.0 || delta_percent.abs() < stable_threshold {
        TrendDirection::Stable
    } else if delta_percent > 0.0 {
        TrendDirection::Regression
    } else {
        TrendDirection::Improvement
    };

    Some(Trend {
        window,
        recent_mean,
        oldest_mean,
        delta_percent,
        direction,
    })
}
