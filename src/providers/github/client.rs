use log::debug;
use serde::de::DeserializeOwned;
use tokio::process::Command;

use crate::error::{BuildLensError, Result};

use super::types::{GhRun, GhRunDetails};

const RUN_LIST_FIELDS: &str = "databaseId,status,conclusion,createdAt,updatedAt,workflowName";

/// Source of workflow runs and their job details.
pub trait RunSource {
    /// Lists the most recent runs of `workflow`, newest first.
    async fn list_runs(&self, workflow: &str, limit: usize) -> Result<Vec<GhRun>>;

    /// Fetches the jobs and steps of a single run.
    async fn run_details(&self, run_id: u64) -> Result<GhRunDetails>;
}

/// Runs the GitHub CLI (`gh`) and decodes its JSON output.
///
/// The CLI must be on `PATH` (or configured explicitly) and already
/// authenticated; no credentials are handled here.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
    repo: Option<String>,
}

impl GhCli {
    pub fn new(program: impl Into<String>, repo: Option<String>) -> Self {
        Self {
            program: program.into(),
            repo,
        }
    }

    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }

    fn with_repo(&self, mut args: Vec<String>) -> Vec<String> {
        if let Some(repo) = &self.repo {
            args.push("--repo".to_string());
            args.push(repo.clone());
        }
        args
    }

    /// Runs `gh` with `args` and parses stdout as JSON.
    ///
    /// Fails if the process cannot be spawned, exits non-zero, or prints
    /// something that is not the expected JSON.
    async fn run_json<T: DeserializeOwned>(&self, args: &[String]) -> Result<T> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!("Running: {command}");

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|source| BuildLensError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BuildLensError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|source| BuildLensError::Parse { command, source })
    }
}

impl RunSource for GhCli {
    async fn list_runs(&self, workflow: &str, limit: usize) -> Result<Vec<GhRun>> {
        let args = self.with_repo(vec![
            "run".to_string(),
            "list".to_string(),
            format!("--workflow={workflow}"),
            format!("--limit={limit}"),
            "--json".to_string(),
            RUN_LIST_FIELDS.to_string(),
        ]);
        self.run_json(&args).await
    }

    async fn run_details(&self, run_id: u64) -> Result<GhRunDetails> {
        let args = self.with_repo(vec![
            "run".to_string(),
            "view".to_string(),
            run_id.to_string(),
            "--json".to_string(),
            "jobs".to_string(),
        ]);
        self.run_json(&args).await
    }
}
