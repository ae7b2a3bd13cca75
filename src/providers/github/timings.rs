use chrono::{DateTime, Datelike, Utc};
use log::debug;

use super::types::{GhRun, GhRunDetails};

/// Timing of one step, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct StepTiming {
    pub name: String,
    pub duration: f64,
}

/// Timing of one job and the steps within it that have a defined duration.
#[derive(Debug, Clone, PartialEq)]
pub struct JobTiming {
    pub name: String,
    pub duration: f64,
    pub steps: Vec<StepTiming>,
}

/// Durations extracted from a single workflow run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunTimings {
    pub run_id: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub jobs: Vec<JobTiming>,
}

impl RunTimings {
    /// Approximate wall-clock duration of the run.
    ///
    /// Jobs execute in parallel and the run's own start/end are not
    /// reconstructed, so the longest job stands in for the whole workflow.
    pub fn workflow_duration(&self) -> Option<f64> {
        self.jobs
            .iter()
            .map(|job| job.duration)
            .max_by(|a, b| a.total_cmp(b))
    }
}

/// Parses a GitHub timestamp.
///
/// Returns `None` for blank values and for the zero timestamp
/// (`0001-01-01T00:00:00Z`) that `gh` reports for unfinished steps.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| debug!("Ignoring unparseable timestamp {raw:?}: {e}"))
        .ok()?;

    (parsed.year() > 1).then_some(parsed)
}

/// Seconds between two timestamps, or `None` if either is absent or the
/// interval is negative.
pub fn calculate_duration(started_at: Option<&str>, completed_at: Option<&str>) -> Option<f64> {
    let start = parse_timestamp(started_at?)?;
    let end = parse_timestamp(completed_at?)?;

    if end < start {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let seconds = (end - start).num_milliseconds() as f64 / 1000.0;
    Some(seconds)
}

/// Walks run → jobs → steps and keeps every duration that is defined.
///
/// Jobs without both timestamps are dropped together with their steps; steps
/// without both timestamps are dropped individually.
pub fn extract_run_timings(run: &GhRun, details: &GhRunDetails) -> RunTimings {
    let jobs = details
        .jobs
        .iter()
        .filter_map(|job| {
            let Some(duration) =
                calculate_duration(job.started_at.as_deref(), job.completed_at.as_deref())
            else {
                debug!(
                    "Run {}: skipping job {:?} without start/end timestamps",
                    run.database_id, job.name
                );
                return None;
            };

            let steps = job
                .steps
                .iter()
                .filter_map(|step| {
                    calculate_duration(step.started_at.as_deref(), step.completed_at.as_deref())
                        .map(|duration| StepTiming {
                            name: step.name.clone(),
                            duration,
                        })
                })
                .collect();

            Some(JobTiming {
                name: job.name.clone(),
                duration,
                steps,
            })
        })
        .collect();

    RunTimings {
        run_id: run.database_id,
        created_at: run.created_at.as_deref().and_then(parse_timestamp),
        jobs,
    }
}

/// Case-insensitive substring matcher over step names.
#[derive(Debug, Clone)]
pub struct StepMatcher {
    keywords: Vec<String>,
}

impl StepMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, step_name: &str) -> bool {
        let name = step_name.to_lowercase();
        self.keywords.iter().any(|keyword| name.contains(keyword))
    }
}
