use serde::{Deserialize, Serialize};

/// Workflow run as listed by `gh run list --json ...`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhRun {
    /// Unique identifier for the workflow run
    pub database_id: u64,
    /// Status of the run ("completed", "in_progress", "queued")
    #[serde(default)]
    pub status: String,
    /// Conclusion of the run (empty while the run is in progress)
    #[serde(default)]
    pub conclusion: String,
    /// When the run was created
    #[serde(default)]
    pub created_at: Option<String>,
    /// When the run was last updated
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Name of the workflow
    #[serde(default)]
    pub workflow_name: String,
}

impl GhRun {
    pub fn is_successful(&self) -> bool {
        self.conclusion == "success"
    }
}

/// Output of `gh run view <id> --json jobs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GhRunDetails {
    #[serde(default)]
    pub jobs: Vec<GhJob>,
}

/// Job within a workflow run.
///
/// Timestamps are kept as raw strings: `gh` reports steps that never ran with
/// an empty or zero-value timestamp, and those must be skipped rather than
/// rejected at parse time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhJob {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub steps: Vec<GhStep>,
}

/// Step within a job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhStep {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Web URL of a workflow run, when the repository is known.
pub fn workflow_run_url(repo: &str, run_id: u64) -> String {
    format!("https://github.com/{repo}/actions/runs/{run_id}")
}
