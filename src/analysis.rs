use chrono::Utc;
use indexmap::IndexMap;
use log::warn;

use crate::config::AnalysisSettings;
use crate::insights::{
    AnalyzedRun, BuildInsights, Consistency, DurationStats, FocusStep, WorkflowDuration,
};
use crate::metrics::{compare_trend, high_variability, summarize_labels};
use crate::providers::github::timings::{JobTiming, RunTimings, StepMatcher};
use crate::providers::github::types::workflow_run_url;

/// Duration series collected across runs, keyed by label.
#[derive(Debug, Default)]
pub struct DurationSamples {
    pub jobs: IndexMap<String, Vec<f64>>,
    pub steps: IndexMap<String, Vec<f64>>,
    pub focus: Vec<f64>,
    /// One value per run, most recent first.
    pub workflow: Vec<f64>,
}

impl DurationSamples {
    /// Groups durations by label, one sample per label per run.
    ///
    /// Within a run a repeated job name keeps only the last job, and a
    /// repeated step name within that job keeps only the last step.
    pub fn collect(runs: &[RunTimings], settings: &AnalysisSettings) -> Self {
        let tagged = StepMatcher::new(&settings.step_keywords);
        let focus = StepMatcher::new([&settings.focus_step]);

        let mut samples = Self::default();

        for run in runs {
            let jobs: IndexMap<&str, &JobTiming> = run
                .jobs
                .iter()
                .map(|job| (job.name.as_str(), job))
                .collect();

            for (&job_name, job) in &jobs {
                samples
                    .jobs
                    .entry(job_name.to_string())
                    .or_default()
                    .push(job.duration);

                let steps: IndexMap<&str, f64> = job
                    .steps
                    .iter()
                    .map(|step| (step.name.as_str(), step.duration))
                    .collect();

                for (&step_name, &duration) in &steps {
                    if tagged.matches(step_name) {
                        samples
                            .steps
                            .entry(format!("{job_name} - {step_name}"))
                            .or_default()
                            .push(duration);
                    }
                    if focus.matches(step_name) {
                        samples.focus.push(duration);
                    }
                }
            }

            if let Some(duration) = jobs
                .values()
                .map(|job| job.duration)
                .max_by(|a, b| a.total_cmp(b))
            {
                samples.workflow.push(duration);
            }
        }

        samples
    }
}

/// Counts gathered while fetching runs, before any timing is extracted.
#[derive(Debug, Clone, Default)]
pub struct CollectionSummary {
    pub repository: Option<String>,
    pub workflow: String,
    pub total_runs: usize,
    pub successful_runs: usize,
    pub failed_fetches: usize,
}

fn classify_variability(cv: f64, settings: &AnalysisSettings) -> Consistency {
    if cv > settings.variability_threshold {
        Consistency::High
    } else if cv < settings.low_variability_threshold {
        Consistency::Low
    } else {
        Consistency::Moderate
    }
}

/// Builds the report from the runs that were fetched successfully.
///
/// `runs` must be ordered most recent first, as `gh run list` returns them.
pub fn build_insights(
    summary: CollectionSummary,
    runs: &[RunTimings],
    settings: &AnalysisSettings,
) -> BuildInsights {
    let analyzed: Vec<&RunTimings> = runs.iter().filter(|r| !r.jobs.is_empty()).collect();
    let runs_analyzed = analyzed.len();

    let low_sample_warning = runs_analyzed < settings.min_samples;
    if low_sample_warning {
        warn!(
            "Only {runs_analyzed} runs analyzed (fewer than {}); statistics may be unreliable",
            settings.min_samples
        );
    }

    let samples = DurationSamples::collect(runs, settings);

    let jobs = summarize_labels(&samples.jobs, settings.min_samples);
    let steps = summarize_labels(&samples.steps, settings.min_samples);

    let workflow_duration = DurationStats::from_samples(&samples.workflow).map(|stats| {
        let variability = classify_variability(stats.coefficient_of_variation, settings);
        WorkflowDuration { stats, variability }
    });

    let focus_step = DurationStats::from_samples(&samples.focus).map(|stats| {
        let share_of_workflow = workflow_duration
            .as_ref()
            .filter(|w| w.stats.mean > 0.0)
            .map(|w| stats.mean / w.stats.mean * 100.0);
        FocusStep {
            keyword: settings.focus_step.clone(),
            stats,
            share_of_workflow,
        }
    });

    let trend = compare_trend(
        &samples.workflow,
        settings.trend_window,
        settings.min_trend_runs,
        settings.stable_threshold,
    );

    let high_variability_jobs =
        high_variability(&jobs, settings.variability_threshold, settings.top_variability);

    let analyzed_runs = analyzed
        .iter()
        .filter_map(|run| {
            run.workflow_duration().map(|duration| AnalyzedRun {
                id: run.run_id,
                created_at: run.created_at,
                workflow_duration: duration,
                url: summary
                    .repository
                    .as_deref()
                    .map(|repo| workflow_run_url(repo, run.run_id)),
            })
        })
        .collect();

    BuildInsights {
        provider: "GitHub Actions".to_string(),
        repository: summary.repository,
        workflow: summary.workflow,
        profile: settings.profile,
        collected_at: Utc::now(),
        total_runs: summary.total_runs,
        successful_runs: summary.successful_runs,
        runs_analyzed,
        failed_fetches: summary.failed_fetches,
        min_samples: settings.min_samples,
        low_sample_warning,
        workflow_duration,
        jobs,
        steps,
        focus_step,
        trend,
        high_variability_jobs,
        runs: analyzed_runs,
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::config::ProfileKind;
    use crate::insights::TrendDirection;
    use crate::providers::github::timings::StepTiming;

    fn step(name: &str, duration: f64) -> StepTiming {
        StepTiming {
            name: name.to_string(),
            duration,
        }
    }

    fn job(name: &str, duration: f64, steps: Vec<StepTiming>) -> JobTiming {
        JobTiming {
            name: name.to_string(),
            duration,
            steps,
        }
    }

    fn run(id: u64, jobs: Vec<JobTiming>) -> RunTimings {
        RunTimings {
            run_id: id,
            created_at: None,
            jobs,
        }
    }

    fn summary(repo: Option<&str>) -> CollectionSummary {
        CollectionSummary {
            repository: repo.map(str::to_string),
            workflow: "On PR code update".to_string(),
            total_runs: 12,
            successful_runs: 10,
            failed_fetches: 0,
        }
    }

    mod collect_tests {
        use super::*;

        #[test]
        fn test_keyword_steps_are_tagged_with_job_label() {
            let runs = vec![run(
                1,
                vec![job(
                    "build",
                    300.0,
                    vec![
                        step("Checkout", 5.0),
                        step("Setup Dependencies (npm)", 120.0),
                        step("Run linting", 30.0),
                    ],
                )],
            )];
            let settings = ProfileKind::Full.settings();

            let samples = DurationSamples::collect(&runs, &settings);

            assert_eq!(samples.jobs["build"], vec![300.0]);
            assert!(samples.steps.contains_key("build - Setup Dependencies (npm)"));
            assert!(samples.steps.contains_key("build - Run linting"));
            assert!(!samples.steps.contains_key("build - Checkout"));
            assert_eq!(samples.focus, vec![120.0]);
            assert_eq!(samples.workflow, vec![300.0]);
        }

        #[test]
        fn test_focus_pools_across_jobs() {
            let runs = vec![
                run(
                    2,
                    vec![
                        job("unit", 200.0, vec![step("Setup dependencies", 60.0)]),
                        job("e2e", 400.0, vec![step("setup dependencies", 90.0)]),
                    ],
                ),
                run(1, vec![job("unit", 210.0, vec![step("Setup dependencies", 70.0)])]),
            ];
            let settings = ProfileKind::Fast.settings();

            let samples = DurationSamples::collect(&runs, &settings);

            assert_eq!(samples.focus, vec![60.0, 90.0, 70.0]);
            assert_eq!(samples.workflow, vec![400.0, 210.0]);
            assert_eq!(samples.jobs["unit"], vec![200.0, 210.0]);
        }

        #[test]
        fn test_repeated_names_count_once_per_run() {
            let runs: Vec<RunTimings> = (1..=5)
                .map(|id| {
                    run(
                        id,
                        vec![
                            job("build", 100.0, vec![]),
                            job(
                                "build",
                                200.0,
                                vec![
                                    step("Setup dependencies", 10.0),
                                    step("Setup dependencies", 50.0),
                                ],
                            ),
                        ],
                    )
                })
                .collect();
            let settings = ProfileKind::Full.settings();

            let samples = DurationSamples::collect(&runs, &settings);

            assert_eq!(samples.jobs["build"], vec![200.0; 5]);
            assert_eq!(samples.steps["build - Setup dependencies"], vec![50.0; 5]);
            assert_eq!(samples.focus, vec![50.0; 5]);
            assert_eq!(samples.workflow, vec![200.0; 5]);

            let insights = build_insights(summary(None), &runs, &settings);
            assert_eq!(insights.jobs[0].stats.count, 5);
            assert_eq!(insights.steps[0].stats.count, 5);
        }

        #[test]
        fn test_run_without_jobs_adds_no_workflow_sample() {
            let runs = vec![run(1, vec![])];

            let samples = DurationSamples::collect(&runs, &ProfileKind::Full.settings());

            assert!(samples.workflow.is_empty());
            assert!(samples.jobs.is_empty());
        }
    }

    mod build_insights_tests {
        use super::*;

        fn steady_runs(count: u64) -> Vec<RunTimings> {
            (0..count)
                .map(|i| {
                    run(
                        100 - i,
                        vec![
                            job("lint", 100.0, vec![step("Setup dependencies", 40.0)]),
                            job("test", 400.0, vec![step("Setup dependencies", 60.0)]),
                        ],
                    )
                })
                .collect()
        }

        #[test]
        fn test_three_job_durations_example() {
            let runs = vec![
                run(3, vec![job("build", 100.0, vec![])]),
                run(2, vec![job("build", 200.0, vec![])]),
                run(1, vec![job("build", 300.0, vec![])]),
            ];
            let settings = ProfileKind::Fast.settings();

            let insights = build_insights(summary(None), &runs, &settings);

            assert_eq!(insights.jobs.len(), 1);
            let stats = &insights.jobs[0].stats;
            assert_eq!(stats.mean, 200.0);
            assert_eq!(stats.median, 200.0);
            assert_eq!(stats.min, 100.0);
            assert_eq!(stats.max, 300.0);
            assert!((stats.std_dev - 100.0).abs() < 1e-9);
            assert!(!insights.low_sample_warning);
        }

        #[test]
        fn test_steady_runs_report() {
            let runs = steady_runs(12);
            let settings = ProfileKind::Full.settings();

            let insights = build_insights(summary(Some("owner/repo")), &runs, &settings);

            assert_eq!(insights.runs_analyzed, 12);
            assert_eq!(insights.jobs.len(), 2);
            assert_eq!(insights.steps.len(), 2);

            let workflow = insights.workflow_duration.as_ref().unwrap();
            assert_eq!(workflow.stats.mean, 400.0);
            assert_eq!(workflow.variability, Consistency::Low);

            let focus = insights.focus_step.as_ref().unwrap();
            assert_eq!(focus.stats.count, 24);
            assert_eq!(focus.stats.mean, 50.0);
            assert_eq!(focus.share_of_workflow, Some(12.5));

            let trend = insights.trend.as_ref().unwrap();
            assert_eq!(trend.delta_percent, 0.0);
            assert_eq!(trend.direction, TrendDirection::Stable);

            assert!(insights.high_variability_jobs.is_empty());
            assert_eq!(insights.runs.len(), 12);
            assert_eq!(
                insights.runs[0].url.as_deref(),
                Some("https://github.com/owner/repo/actions/runs/100")
            );
        }

        #[test]
        fn test_low_sample_warning_and_threshold() {
            let runs = steady_runs(2);
            let settings = ProfileKind::Full.settings();

            let insights = build_insights(summary(None), &runs, &settings);

            assert!(insights.low_sample_warning);
            assert!(insights.jobs.is_empty());
            assert!(insights.steps.is_empty());
            assert!(insights.trend.is_none());
            // Workflow and focus sections have no sample threshold.
            assert!(insights.workflow_duration.is_some());
            assert!(insights.focus_step.is_some());
            assert!(insights.runs[0].url.is_none());
        }

        #[test]
        fn test_high_variability_job_flagged() {
            let durations = [100.0, 300.0, 100.0, 300.0, 100.0];
            let runs: Vec<RunTimings> = durations
                .iter()
                .enumerate()
                .map(|(i, &d)| run(i as u64, vec![job("flaky", d, vec![])]))
                .collect();
            let settings = ProfileKind::Full.settings();

            let insights = build_insights(summary(None), &runs, &settings);

            assert_eq!(insights.high_variability_jobs.len(), 1);
            assert_eq!(insights.high_variability_jobs[0].label, "flaky");
            assert_eq!(
                insights.workflow_duration.unwrap().variability,
                Consistency::High
            );
        }

        #[test]
        fn test_no_runs() {
            let insights = build_insights(summary(None), &[], &ProfileKind::Fast.settings());

            assert_eq!(insights.runs_analyzed, 0);
            assert!(insights.low_sample_warning);
            assert!(insights.workflow_duration.is_none());
            assert!(insights.focus_step.is_none());
        }
    }
}
