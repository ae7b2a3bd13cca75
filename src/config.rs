use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::BuildLensError;

/// Configuration file structure for buildlens.
///
/// Every analysis key is optional and overrides the selected profile's
/// default. Command-line flags override both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// Path to the GitHub CLI executable
    #[serde(default = "default_gh_path")]
    pub gh_path: String,

    /// Repository passed to `gh --repo` (e.g., 'owner/repo')
    pub repo: Option<String>,

    /// Workflow whose runs are analyzed
    #[serde(default = "default_workflow")]
    pub workflow: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalysisConfig {
    /// Number of runs to list
    pub list_limit: Option<usize>,

    /// Number of successful runs to fetch job details for
    pub max_runs: Option<usize>,

    /// Minimum samples a label needs to be reported
    pub min_samples: Option<usize>,

    /// Step name keywords tagged for step-level aggregation
    pub step_keywords: Option<Vec<String>>,

    /// Step keyword whose durations are pooled into their own section
    pub focus_step: Option<String>,

    /// Coefficient of variation (percent) above which a job is flagged
    pub variability_threshold: Option<f64>,

    /// Runs per window in the trend comparison
    pub trend_window: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
    Csv,
}

/// Named set of analysis defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// Thorough analysis over many runs
    Full,
    /// Quick look over a handful of recent runs
    Fast,
}

/// Fully resolved analysis parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub profile: ProfileKind,
    pub list_limit: usize,
    pub max_runs: usize,
    pub min_samples: usize,
    pub step_keywords: Vec<String>,
    pub focus_step: String,
    pub variability_threshold: f64,
    pub low_variability_threshold: f64,
    pub top_variability: usize,
    pub trend_window: usize,
    pub min_trend_runs: usize,
    pub stable_threshold: f64,
    pub top_jobs: Option<usize>,
}

impl ProfileKind {
    pub fn settings(self) -> AnalysisSettings {
        match self {
            Self::Full => AnalysisSettings {
                profile: self,
                list_limit: 100,
                max_runs: 50,
                min_samples: 5,
                step_keywords: vec![
                    "setup dependencies".to_string(),
                    "linting".to_string(),
                    "unit tests".to_string(),
                    "setup".to_string(),
                ],
                focus_step: default_focus_step(),
                variability_threshold: 20.0,
                low_variability_threshold: 10.0,
                top_variability: 3,
                trend_window: 10,
                min_trend_runs: 10,
                stable_threshold: 0.0,
                top_jobs: None,
            },
            Self::Fast => AnalysisSettings {
                profile: self,
                list_limit: 30,
                max_runs: 20,
                min_samples: 3,
                step_keywords: vec![default_focus_step()],
                focus_step: default_focus_step(),
                variability_threshold: 20.0,
                low_variability_threshold: 10.0,
                top_variability: 3,
                trend_window: 5,
                min_trend_runs: 10,
                stable_threshold: 5.0,
                top_jobs: Some(5),
            },
        }
    }
}

impl AnalysisSettings {
    /// Layers config file overrides on top of this profile's defaults.
    #[must_use]
    pub fn with_config(mut self, config: &AnalysisConfig) -> Self {
        if let Some(list_limit) = config.list_limit {
            self.list_limit = list_limit;
        }
        if let Some(max_runs) = config.max_runs {
            self.max_runs = max_runs;
        }
        if let Some(min_samples) = config.min_samples {
            self.min_samples = min_samples;
        }
        if let Some(keywords) = &config.step_keywords {
            self.step_keywords.clone_from(keywords);
        }
        if let Some(focus_step) = &config.focus_step {
            self.focus_step.clone_from(focus_step);
        }
        if let Some(threshold) = config.variability_threshold {
            self.variability_threshold = threshold;
        }
        if let Some(window) = config.trend_window {
            self.trend_window = window;
        }
        self
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.list_limit == 0 {
            return Err(BuildLensError::Config("list limit must be at least 1".into()));
        }
        if self.max_runs == 0 {
            return Err(BuildLensError::Config("max runs must be at least 1".into()));
        }
        if self.min_samples == 0 {
            return Err(BuildLensError::Config("min samples must be at least 1".into()));
        }
        if self.trend_window == 0 {
            return Err(BuildLensError::Config("trend window must be at least 1".into()));
        }
        if !self.variability_threshold.is_finite() || self.variability_threshold < 0.0 {
            return Err(BuildLensError::Config(format!(
                "variability threshold must be a non-negative number, got {}",
                self.variability_threshold
            )));
        }
        Ok(())
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            gh_path: default_gh_path(),
            repo: None,
            workflow: default_workflow(),
        }
    }
}

fn default_gh_path() -> String {
    "gh".to_string()
}

fn default_workflow() -> String {
    "On PR code update".to_string()
}

fn default_focus_step() -> String {
    "setup dependencies".to_string()
}

const CONFIG_CANDIDATES: [&str; 4] = [
    "buildlens.toml",
    "buildlens.json",
    "buildlens.yaml",
    "buildlens.yml",
];

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./buildlens.toml, ./buildlens.json, ./buildlens.yaml, ./buildlens.yml
    /// 3. `<user config dir>/buildlens/buildlens.toml`
    ///
    /// Returns default configuration if no file is found. A specified path
    /// that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let user_config =
            dirs::config_dir().map(|dir| dir.join("buildlens").join("buildlens.toml"));

        let found = CONFIG_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .chain(user_config)
            .find(|candidate| candidate.exists());

        match found {
            Some(path) => Self::load_from_path(&path),
            None => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        log::debug!("Loading config from: {}", path.display());

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str::<Self>(&contents)
                .map_err(anyhow::Error::from)
                .or_else(|_| serde_json::from_str(&contents).map_err(anyhow::Error::from))
                .or_else(|_| serde_yaml::from_str(&contents).map_err(anyhow::Error::from))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}
