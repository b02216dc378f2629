use serde::Deserialize;

use super::null_as_default;

/// Name lookups that found nothing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
  #[error("Project '{0}' was not found")]
  ProjectNotFound(String),
  #[error("There is no sprint '{0}'")]
  SprintNotFound(String),
}

/// Agile board ("rapid view")
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RapidView {
  pub id: u64,
  pub name: String,
  #[serde(rename = "canEdit", default)]
  pub editable: bool,
  #[serde(rename = "sprintSupportEnabled", default)]
  pub sprint_support: bool,
  #[serde(rename = "showDaysInColumn", default)]
  pub show_days: bool,
}

/// Response of `rest/greenhopper/1.0/rapidview`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgileProjectList {
  #[serde(rename = "views", default)]
  pub projects: Vec<RapidView>,
}

impl AgileProjectList {
  /// First board whose name matches exactly
  pub fn find_by_name(&self, name: &str) -> Result<&RapidView, LookupError> {
    self
      .projects
      .iter()
      .find(|p| p.name == name)
      .ok_or_else(|| LookupError::ProjectNotFound(name.to_string()))
  }
}

/// Sprint details; dates are passed through exactly as Jira formats them
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sprint {
  pub id: u64,
  pub sequence: u64,
  pub name: String,
  pub state: String,
  pub linked_pages_count: u64,
  #[serde(deserialize_with = "null_as_default")]
  pub start_date: String,
  #[serde(deserialize_with = "null_as_default")]
  pub end_date: String,
  #[serde(deserialize_with = "null_as_default")]
  pub complete_date: String,
}

/// Response of `rest/greenhopper/1.0/sprintquery/{board}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SprintList {
  #[serde(default)]
  pub sprints: Vec<Sprint>,
  #[serde(rename = "rapidViewId", default)]
  pub project_id: u64,
}

impl SprintList {
  /// First sprint whose name matches exactly
  pub fn find_by_name(&self, name: &str) -> Result<&Sprint, LookupError> {
    self
      .sprints
      .iter()
      .find(|s| s.name == name)
      .ok_or_else(|| LookupError::SprintNotFound(name.to_string()))
  }
}
