use anyhow::Result;
use ciscope::cli::Cli;
use ciscope::output;
use clap::Parser;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting ciscope - CI/CD log analysis");
    cli.execute().await?;

    Ok(())
}
