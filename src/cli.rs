use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;

use crate::config::{AnalysisSettings, Config, OutputFormat, ProfileKind};
use crate::output::{bright_red, export_insights, print_summary};
use crate::providers::{GhCli, GitHubProvider};

#[derive(Parser)]
#[command(name = "buildlens")]
#[command(author, version, about = "GitHub Actions build timing analysis", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./buildlens.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write JSON/CSV output to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Thorough analysis: 100 listed runs, 50 analyzed, 5 samples per label
    Analyze(RunArgs),
    /// Quick analysis: 30 listed runs, 20 analyzed, 3 samples per label
    Quick(RunArgs),
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Workflow name as shown by `gh run list`
    #[arg(short, long)]
    workflow: Option<String>,

    /// Repository in 'owner/repo' form (defaults to the current checkout)
    #[arg(short = 'R', long, env = "GH_REPO")]
    repo: Option<String>,

    /// Number of runs to list
    #[arg(short, long)]
    limit: Option<usize>,

    /// Number of successful runs to analyze
    #[arg(short = 'n', long)]
    runs: Option<usize>,

    /// Minimum samples for a job or step to be reported
    #[arg(short, long)]
    min_samples: Option<usize>,

    /// Path to the GitHub CLI executable
    #[arg(long)]
    gh: Option<String>,
}

impl RunArgs {
    fn apply(&self, mut settings: AnalysisSettings) -> AnalysisSettings {
        if let Some(limit) = self.limit {
            settings.list_limit = limit;
        }
        if let Some(runs) = self.runs {
            settings.max_runs = runs;
        }
        if let Some(min_samples) = self.min_samples {
            settings.min_samples = min_samples;
        }
        settings
    }
}

impl Cli {
    async fn execute_analysis(
        &self,
        profile: ProfileKind,
        args: &RunArgs,
        config: Config,
    ) -> Result<()> {
        let settings = args.apply(profile.settings().with_config(&config.analysis));

        let workflow = args.workflow.clone().unwrap_or(config.github.workflow);
        let repo = args.repo.clone().or(config.github.repo);
        let gh = args.gh.clone().unwrap_or(config.github.gh_path);

        info!("Analyzing workflow {workflow:?} with {profile:?} profile");

        let provider = GitHubProvider::new(GhCli::new(gh, repo), workflow, settings.clone())?;

        let insights = match provider.collect_insights().await {
            Ok(insights) => insights,
            Err(e) => {
                eprintln!("{} {e}", bright_red("❌ Failed to fetch workflow runs:"));
                return Ok(());
            }
        };

        let format = self.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;

        if format == OutputFormat::Summary {
            if self.output.is_some() {
                warn!("--output is ignored for the summary format");
            }
            print_summary(&insights, &settings);
            return Ok(());
        }

        if let Some(output_path) = &self.output {
            let mut file = std::fs::File::create(output_path)
                .with_context(|| format!("Failed to create {}", output_path.display()))?;
            export_insights(&insights, format, pretty, &mut file)?;
            info!("Insights written to: {}", output_path.display());
        } else {
            export_insights(&insights, format, pretty, &mut std::io::stdout().lock())?;
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Analyze(args) => self.execute_analysis(ProfileKind::Full, args, config).await,
            Commands::Quick(args) => self.execute_analysis(ProfileKind::Fast, args, config).await,
        }
    }
}
