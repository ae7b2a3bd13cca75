use log::{info, warn};

use crate::analysis::{build_insights, CollectionSummary};
use crate::config::AnalysisSettings;
use crate::error::{BuildLensError, Result};
use crate::insights::BuildInsights;
use crate::output::PhaseProgress;

use super::client::{GhCli, RunSource};
use super::timings::{extract_run_timings, RunTimings};
use super::types::GhRun;

/// Provider for collecting build timing insights from GitHub Actions.
pub struct GitHubProvider<S = GhCli> {
    source: S,
    repository: Option<String>,
    workflow: String,
    settings: AnalysisSettings,
}

impl GitHubProvider<GhCli> {
    /// Creates a provider backed by the GitHub CLI.
    ///
    /// # Errors
    ///
    /// Returns an error if the analysis settings are invalid.
    pub fn new(cli: GhCli, workflow: String, settings: AnalysisSettings) -> Result<Self> {
        let repository = cli.repo().map(str::to_string);
        Self::with_source(cli, repository, workflow, settings)
    }
}

impl<S: RunSource> GitHubProvider<S> {
    pub fn with_source(
        source: S,
        repository: Option<String>,
        workflow: String,
        settings: AnalysisSettings,
    ) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            source,
            repository,
            workflow,
            settings,
        })
    }

    /// Collects timing insights for the configured workflow.
    ///
    /// Progress is displayed in three phases:
    /// 1. Listing recent runs and keeping the successful ones
    /// 2. Fetching job and step details, one run at a time
    /// 3. Aggregating durations into the report
    ///
    /// # Errors
    ///
    /// Returns an error only if the run list itself cannot be fetched. A run
    /// whose details cannot be fetched is logged and skipped.
    pub async fn collect_insights(&self) -> Result<BuildInsights> {
        info!(
            "Starting timing collection for workflow {:?} ({:?} profile)",
            self.workflow, self.settings.profile
        );

        let progress = PhaseProgress::start_phase_1(self.settings.list_limit);

        let runs = match self
            .source
            .list_runs(&self.workflow, self.settings.list_limit)
            .await
        {
            Ok(runs) => runs,
            Err(e) => {
                progress.abandon("Phase 1/3: Failed to fetch workflow runs");
                return Err(e);
            }
        };

        if runs.is_empty() {
            progress.abandon("Phase 1/3: No workflow runs found");
            return Err(BuildLensError::NoRuns {
                workflow: self.workflow.clone(),
            });
        }

        let total_runs = runs.len();
        let successful: Vec<GhRun> = runs
            .into_iter()
            .filter(GhRun::is_successful)
            .take(self.settings.max_runs)
            .collect();
        let successful_runs = successful.len();

        info!("Found {successful_runs} successful runs out of {total_runs} total runs");

        let progress = progress.finish_phase_1_start_phase_2(total_runs, successful_runs);

        let (timings, failed_fetches) = self.fetch_timings(&successful, &progress).await;

        info!(
            "Processed {} runs successfully ({failed_fetches} skipped)",
            timings.len()
        );

        let progress = progress.finish_phase_2_start_phase_3();

        let summary = CollectionSummary {
            repository: self.repository.clone(),
            workflow: self.workflow.clone(),
            total_runs,
            successful_runs,
            failed_fetches,
        };
        let insights = build_insights(summary, &timings, &self.settings);

        progress.finish_phase_3();

        Ok(insights)
    }

    /// Fetches details for each run in order, skipping runs that fail.
    async fn fetch_timings(
        &self,
        runs: &[GhRun],
        progress: &PhaseProgress,
    ) -> (Vec<RunTimings>, usize) {
        let mut timings = Vec::with_capacity(runs.len());
        let mut failed = 0;

        for run in runs {
            progress.set_message(format!("Processing run {}", run.database_id));

            match self.source.run_details(run.database_id).await {
                Ok(details) => {
                    let run_timings = extract_run_timings(run, &details);
                    if run_timings.jobs.is_empty() {
                        warn!("Run {} has no timed jobs, skipping", run.database_id);
                    } else {
                        timings.push(run_timings);
                    }
                }
                Err(e) => {
                    warn!("Skipping run {}: {e}", run.database_id);
                    failed += 1;
                }
            }

            progress.inc();
        }

        (timings, failed)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::ProfileKind;
    use crate::providers::github::types::{GhJob, GhRunDetails, GhStep};

    /// In-memory run source. Runs without details fail to fetch.
    struct FakeSource {
        runs: Option<Vec<GhRun>>,
        details: HashMap<u64, GhRunDetails>,
    }

    impl RunSource for FakeSource {
        async fn list_runs(&self, _workflow: &str, limit: usize) -> Result<Vec<GhRun>> {
            match &self.runs {
                Some(runs) => Ok(runs.iter().take(limit).cloned().collect()),
                None => Err(BuildLensError::CommandFailed {
                    command: "gh run list".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "not authenticated".to_string(),
                }),
            }
        }

        async fn run_details(&self, run_id: u64) -> Result<GhRunDetails> {
            self.details
                .get(&run_id)
                .cloned()
                .ok_or_else(|| BuildLensError::CommandFailed {
                    command: format!("gh run view {run_id}"),
                    status: "exit status: 1".to_string(),
                    stderr: "run not found".to_string(),
                })
        }
    }

    fn gh_run(id: u64, conclusion: &str) -> GhRun {
        GhRun {
            database_id: id,
            status: "completed".to_string(),
            conclusion: conclusion.to_string(),
            created_at: Some("2024-05-01T10:00:00Z".to_string()),
            updated_at: None,
            workflow_name: "On PR code update".to_string(),
        }
    }

    fn details(job_minutes: u32) -> GhRunDetails {
        GhRunDetails {
            jobs: vec![GhJob {
                name: "build".to_string(),
                started_at: Some("2024-05-01T10:00:00Z".to_string()),
                completed_at: Some(format!("2024-05-01T10:{job_minutes:02}:00Z")),
                steps: vec![GhStep {
                    name: "Setup dependencies".to_string(),
                    started_at: Some("2024-05-01T10:00:00Z".to_string()),
                    completed_at: Some("2024-05-01T10:01:00Z".to_string()),
                }],
            }],
        }
    }

    fn provider(source: FakeSource) -> GitHubProvider<FakeSource> {
        GitHubProvider::with_source(
            source,
            Some("owner/repo".to_string()),
            "On PR code update".to_string(),
            ProfileKind::Fast.settings(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_collects_successful_runs_only() {
        let source = FakeSource {
            runs: Some(vec![
                gh_run(5, "success"),
                gh_run(4, "failure"),
                gh_run(3, "success"),
                gh_run(2, ""),
                gh_run(1, "success"),
            ]),
            details: [(5, details(5)), (3, details(4)), (1, details(3)), (4, details(9))]
                .into_iter()
                .collect(),
        };

        let insights = provider(source).collect_insights().await.unwrap();

        assert_eq!(insights.total_runs, 5);
        assert_eq!(insights.successful_runs, 3);
        assert_eq!(insights.runs_analyzed, 3);
        assert_eq!(insights.failed_fetches, 0);
        assert_eq!(insights.jobs.len(), 1);
        assert_eq!(insights.jobs[0].stats.mean, 240.0);
        assert_eq!(insights.focus_step.unwrap().stats.mean, 60.0);
        assert_eq!(insights.repository.as_deref(), Some("owner/repo"));
    }

    #[tokio::test]
    async fn test_failed_detail_fetch_is_skipped() {
        let source = FakeSource {
            runs: Some(vec![gh_run(3, "success"), gh_run(2, "success"), gh_run(1, "success")]),
            details: [(3, details(5)), (1, details(3))].into_iter().collect(),
        };

        let insights = provider(source).collect_insights().await.unwrap();

        assert_eq!(insights.successful_runs, 3);
        assert_eq!(insights.runs_analyzed, 2);
        assert_eq!(insights.failed_fetches, 1);
        assert!(insights.low_sample_warning);
        let ids: Vec<u64> = insights.runs.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_list_failure_propagates() {
        let source = FakeSource {
            runs: None,
            details: HashMap::new(),
        };

        let result = provider(source).collect_insights().await;

        assert!(matches!(result, Err(BuildLensError::CommandFailed { .. })));
    }

    #[tokio::test]
    async fn test_empty_run_list_is_an_error() {
        let source = FakeSource {
            runs: Some(vec![]),
            details: HashMap::new(),
        };

        let result = provider(source).collect_insights().await;

        assert!(matches!(
            result,
            Err(BuildLensError::NoRuns { workflow }) if workflow == "On PR code update"
        ));
    }

    #[tokio::test]
    async fn test_max_runs_caps_successful_runs() {
        let runs: Vec<GhRun> = (1..=30).rev().map(|id| gh_run(id, "success")).collect();
        let details = (1..=30).map(|id| (id, details(2))).collect();
        let source = FakeSource {
            runs: Some(runs),
            details,
        };

        let insights = provider(source).collect_insights().await.unwrap();

        assert_eq!(insights.total_runs, 30);
        assert_eq!(insights.successful_runs, 20);
        assert_eq!(insights.runs_analyzed, 20);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = ProfileKind::Full.settings();
        settings.max_runs = 0;

        let result = GitHubProvider::new(GhCli::new("gh", None), "CI".to_string(), settings);

        assert!(matches!(result, Err(BuildLensError::Config(_))));
    }
}
