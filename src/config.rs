use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::providers::github::RetryPolicy;

const CANDIDATES: [&str; 4] = ["ciscope.toml", "ciscope.json", "ciscope.yaml", "ciscope.yml"];

/// Configuration file structure for ciscope.
///
/// Allows users to save common analysis settings and reuse them across runs.
/// Every field has a default, so a partial file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// GitHub access and fetch settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Log download retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// GitHub personal access token
    pub token: Option<String>,

    /// GitHub API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `X-GitHub-Api-Version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Maximum number of workflow runs to analyze
    #[serde(default = "default_max_runs")]
    pub max_runs: usize,

    /// Download and parse run logs
    #[serde(default = "default_true")]
    pub fetch_logs: bool,

    /// Run logs downloaded in parallel
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before retrying attempt `n` (0-based) is `base-delay-ms * 2^n`
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
    Csv,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            api_version: default_api_version(),
            max_runs: default_max_runs(),
            fetch_logs: true,
            concurrency: default_concurrency(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

fn default_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_api_version() -> String {
    "2022-11-28".to_string()
}

fn default_max_runs() -> usize {
    10
}

fn default_concurrency() -> usize {
    4
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./ciscope.toml
    /// 3. ./ciscope.json
    /// 4. ./ciscope.yaml
    /// 5. ./ciscope.yml
    /// 6. `<user config dir>/ciscope/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        match Self::discover(Path::new("."), dirs::config_dir().as_deref()) {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// First existing candidate under `dir`, then the per-user file.
    fn discover(dir: &Path, user_config_dir: Option<&Path>) -> Option<PathBuf> {
        CANDIDATES
            .iter()
            .map(|candidate| dir.join(candidate))
            .chain(user_config_dir.map(|d| d.join("ciscope").join("config.toml")))
            .find(|path| path.exists())
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file yields the defaults.
    fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml" | "yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.github.base_url, "https://api.github.com");
        assert_eq!(config.github.api_version, "2022-11-28");
        assert_eq!(config.github.max_runs, 10);
        assert_eq!(config.github.concurrency, 4);
        assert!(config.github.fetch_logs);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.output.format, OutputFormat::Summary);
    }

    #[test]
    fn test_retry_policy_from_config() {
        let retry = RetryConfig {
            max_retries: 5,
            base_delay_ms: 250,
        };
        let policy = retry.policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[github]
token = "ghp-test-token"
base-url = "https://github.example.com/api/v3"
max-runs = 25
fetch-logs = false

[retry]
base-delay-ms = 10

[output]
format = "json"
pretty = true
"#;
        write!(temp_file, "{toml_content}").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.github.token.as_deref(), Some("ghp-test-token"));
        assert_eq!(config.github.base_url, "https://github.example.com/api/v3");
        assert_eq!(config.github.max_runs, 25);
        assert!(!config.github.fetch_logs);
        assert_eq!(config.github.concurrency, 4);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_ms, 10);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "github": { "token": "ghp-json", "concurrency": 1 },
  "output": { "format": "csv" }
}"#;
        write!(temp_file, "{json_content}").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.github.token.as_deref(), Some("ghp-json"));
        assert_eq!(config.github.concurrency, 1);
        assert_eq!(config.output.format, OutputFormat::Csv);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yml").unwrap();
        write!(temp_file, "retry:\n  max-retries: 7\n").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.retry.max_retries, 7);
        assert_eq!(config.github.max_runs, 10);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[github\nmax-runs = ").unwrap();

        let err = Config::load_from_path(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML config"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load(Some(Path::new("nonexistent.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_discover_prefers_local_candidates() {
        let local = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        std::fs::create_dir(user.path().join("ciscope")).unwrap();
        std::fs::write(user.path().join("ciscope").join("config.toml"), "").unwrap();

        let found = Config::discover(local.path(), Some(user.path())).unwrap();
        assert_eq!(found, user.path().join("ciscope").join("config.toml"));

        std::fs::write(local.path().join("ciscope.yaml"), "").unwrap();
        std::fs::write(local.path().join("ciscope.json"), "{}").unwrap();
        let found = Config::discover(local.path(), Some(user.path())).unwrap();
        assert_eq!(found, local.path().join("ciscope.json"));
    }

    #[test]
    fn test_discover_nothing() {
        let local = tempfile::tempdir().unwrap();
        assert!(Config::discover(local.path(), None).is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.github.token = Some("ghp-roundtrip".to_string());
        config.output.format = OutputFormat::Csv;

        for name in ["config.toml", "config.json", "config.yaml"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(Config::load(Some(&path)).unwrap(), config);
        }
    }
}
