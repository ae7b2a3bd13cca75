use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProfileKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInsights {
    pub provider: String,
    pub repository: Option<String>,
    pub workflow: String,
    pub profile: ProfileKind,
    pub collected_at: DateTime<Utc>,
    pub total_runs: usize,
    pub successful_runs: usize,
    pub runs_analyzed: usize,
    pub failed_fetches: usize,
    pub min_samples: usize,
    pub low_sample_warning: bool,
    pub workflow_duration: Option<WorkflowDuration>,
    pub jobs: Vec<LabeledStats>,
    pub steps: Vec<LabeledStats>,
    pub focus_step: Option<FocusStep>,
    pub trend: Option<Trend>,
    pub high_variability_jobs: Vec<VariabilityFlag>,
    pub runs: Vec<AnalyzedRun>,
}

/// Descriptive statistics over a series of durations, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub coefficient_of_variation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledStats {
    pub label: String,
    pub stats: DurationStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariabilityFlag {
    pub label: String,
    pub coefficient_of_variation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDuration {
    pub stats: DurationStats,
    /// Timing variability across runs.
    pub variability: Consistency,
}

/// Pooled durations of the steps matching the focus keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusStep {
    pub keyword: String,
    pub stats: DurationStats,
    /// Mean focus step time as a percentage of the mean workflow duration.
    pub share_of_workflow: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improvement,
    Regression,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub window: usize,
    pub recent_mean: f64,
    pub oldest_mean: f64,
    pub delta_percent: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedRun {
    pub id: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub workflow_duration: f64,
    pub url: Option<String>,
}
