use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::analysis::analyze_text;
use crate::auth::Token;
use crate::config::{Config, OutputFormat};
use crate::output::{export_log_analysis, export_report};
use crate::providers::github::{GitHubProvider, Repository};

#[derive(Parser)]
#[command(name = "ciscope")]
#[command(author, version, about = "CI/CD log retrieval and analysis", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./ciscope.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a GitHub repository's Actions runs and logs
    Github {
        /// Repository as owner/repo
        #[arg(short, long)]
        repo: String,

        #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// GitHub API base URL
        #[arg(short, long)]
        url: Option<String>,

        #[arg(short, long)]
        max_runs: Option<usize>,

        /// Only list runs and definitions
        #[arg(long, default_value_t = false)]
        no_logs: bool,

        /// File with one repository path per line, used to verify findings
        #[arg(short, long)]
        known_paths: Option<PathBuf>,

        /// Run logs downloaded in parallel
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Parse a local log file without network access
    Parse {
        logfile: PathBuf,

        #[arg(short, long)]
        known_paths: Option<PathBuf>,
    },
}

fn load_known_paths(path: &Path) -> Result<HashSet<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read known paths: {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

impl Cli {
    fn output_settings(&self, config: &Config) -> (OutputFormat, bool) {
        (
            self.format.unwrap_or(config.output.format),
            self.pretty || config.output.pretty,
        )
    }

    fn write_output(&self, write: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<()> {
        if let Some(output_path) = &self.output {
            let mut file = std::fs::File::create(output_path).with_context(|| {
                format!("Failed to create output file: {}", output_path.display())
            })?;
            write(&mut file)?;
            info!("Report written to: {}", output_path.display());
        } else {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            write(&mut handle)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_github(
        &self,
        config: &Config,
        repo: &str,
        token: Option<&str>,
        url: Option<&str>,
        max_runs: Option<usize>,
        no_logs: bool,
        known_paths: Option<&Path>,
        concurrency: Option<usize>,
    ) -> Result<()> {
        let repository = Repository::parse(repo)?;
        info!("Collecting CI/CD evidence for repository: {repository}");

        let github = &config.github;
        let token = token
            .map(Token::from)
            .or_else(|| github.token.as_deref().map(Token::from));
        let base_url = url.unwrap_or(&github.base_url);
        let known_paths = known_paths.map(load_known_paths).transpose()?;
        let (format, pretty) = self.output_settings(config);

        let provider = GitHubProvider::new(base_url, token, &github.api_version)?
            .with_retry_policy(config.retry.policy())
            .with_max_runs(max_runs.unwrap_or(github.max_runs))
            .with_concurrency(concurrency.unwrap_or(github.concurrency))
            .with_progress(true);

        let report = provider
            .collect_report(
                &repository.owner,
                &repository.name,
                known_paths.as_ref(),
                github.fetch_logs && !no_logs,
            )
            .await?;

        info!(
            "Analyzed {} runs, {} findings",
            report.analysis.runs.len(),
            report.findings().count()
        );

        self.write_output(|out| export_report(&report, format, pretty, out))
    }

    fn execute_parse(
        &self,
        config: &Config,
        logfile: &Path,
        known_paths: Option<&Path>,
    ) -> Result<()> {
        let bytes = std::fs::read(logfile)
            .with_context(|| format!("Failed to read log file: {}", logfile.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        let known_paths = known_paths.map(load_known_paths).transpose()?;
        let (format, pretty) = self.output_settings(config);

        let analysis = analyze_text(0, &text, known_paths.as_ref());
        self.write_output(|out| export_log_analysis(&analysis, format, pretty, out))
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Github {
                repo,
                token,
                url,
                max_runs,
                no_logs,
                known_paths,
                concurrency,
            } => {
                self.execute_github(
                    &config,
                    repo,
                    token.as_deref(),
                    url.as_deref(),
                    *max_runs,
                    *no_logs,
                    known_paths.as_deref(),
                    *concurrency,
                )
                .await
            }
            Commands::Parse {
                logfile,
                known_paths,
            } => self.execute_parse(&config, logfile, known_paths.as_deref()),
        }
    }
}
