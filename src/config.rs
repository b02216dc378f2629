use color_eyre::{
  eyre::{eyre, WrapErr},
  Result,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::report::ReportOptions;

/// Settings that must be present before any request is made
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
  #[error("No project provided (--project)")]
  MissingProject,
  #[error("No sprint name provided (--sprint)")]
  MissingSprint,
  #[error("No jira url provided (--jira-url)")]
  MissingJiraUrl,
}

/// Contents of the optional config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub jira: JiraConfig,
  /// Default board name when --project is not given
  pub project: Option<String>,
  #[serde(default)]
  pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JiraConfig {
  pub url: Option<String>,
  pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
  /// Issue types reported as emergent work (case-insensitive)
  #[serde(default = "default_emergent_types", deserialize_with = "deserialize_lowercase_set")]
  pub emergent_types: BTreeSet<String>,
  /// How many past sprints to average velocity over
  #[serde(default = "default_velocity_window")]
  pub velocity_window: usize,
}

impl Default for ReportConfig {
  fn default() -> Self {
    Self {
      emergent_types: default_emergent_types(),
      velocity_window: default_velocity_window(),
    }
  }
}

fn default_emergent_types() -> BTreeSet<String> {
  ReportOptions::default().emergent_types
}

fn default_velocity_window() -> usize {
  ReportOptions::default().velocity_window
}

fn deserialize_lowercase_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let v: Vec<String> = Vec::deserialize(deserializer)?;
  Ok(v.into_iter().map(|s| s.to_lowercase()).collect())
}

impl From<&ReportConfig> for ReportOptions {
  fn from(config: &ReportConfig) -> Self {
    ReportOptions {
      emergent_types: config.emergent_types.clone(),
      velocity_window: config.velocity_window,
    }
  }
}

/// Everything a run needs, after merging CLI flags over the config file
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub project: String,
  pub sprint: String,
  pub jira_url: String,
  pub username: Option<String>,
  pub include_hours: bool,
  pub report: ReportOptions,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub project: Option<String>,
  pub sprint: Option<String>,
  pub jira_url: Option<String>,
  pub username: Option<String>,
  pub include_hours: bool,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./sprint-report.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/sprint-report/config.yaml
  ///
  /// Having no config file at all is fine; everything can come from flags.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    match explicit_path {
      Some(p) if !p.exists() => Err(eyre!("Config file not found: {}", p.display())),
      Some(p) => Self::from_yaml_file(p),
      None => Self::search_paths()
        .into_iter()
        .find(|candidate| candidate.is_file())
        .map_or_else(|| Ok(Self::default()), |found| Self::from_yaml_file(&found)),
    }
  }

  /// Implicit config locations, most specific first
  fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("sprint-report.yaml")];
    paths.extend(dirs::config_dir().map(|dir| dir.join("sprint-report").join("config.yaml")));
    paths
  }

  fn from_yaml_file(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .wrap_err_with(|| format!("Could not read {}", path.display()))?;
    let config = serde_yaml::from_str(&raw)
      .wrap_err_with(|| format!("Invalid config in {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
  }

  /// Merge command line values over the file and check required settings.
  ///
  /// Missing settings are reported in the order project, sprint, url.
  pub fn resolve(self, overrides: Overrides) -> Result<Settings, ConfigError> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let project =
      non_empty(overrides.project.or(self.project)).ok_or(ConfigError::MissingProject)?;
    let sprint = non_empty(overrides.sprint).ok_or(ConfigError::MissingSprint)?;
    let jira_url =
      non_empty(overrides.jira_url.or(self.jira.url)).ok_or(ConfigError::MissingJiraUrl)?;

    Ok(Settings {
      project,
      sprint,
      jira_url,
      username: non_empty(overrides.username.or(self.jira.username)),
      include_hours: overrides.include_hours,
      report: ReportOptions::from(&self.report),
    })
  }

  /// Get the Jira password from the environment, if set.
  ///
  /// Checks SPRINT_REPORT_PASSWORD.
  pub fn get_password() -> Option<String> {
    std::env::var("SPRINT_REPORT_PASSWORD").ok()
  }
}
