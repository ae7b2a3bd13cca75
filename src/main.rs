mod analysis;
mod cli;
mod config;
mod error;
mod insights;
mod metrics;
mod output;
mod providers;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting buildlens - GitHub Actions build timing analysis");
    cli.execute().await?;

    Ok(())
}
