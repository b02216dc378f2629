//! Issues as they appear in greenhopper sprint reports, and the list
//! operations the report is built from.

use color_eyre::Result;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::debug;

use super::client::{JiraClient, Transport};
use super::null_as_default;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EstimateValue {
  #[serde(default)]
  pub value: Option<f64>,
}

/// Story point estimate (`estimateStatistic`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Estimate {
  #[serde(rename = "statFieldId", default)]
  pub field_id: Option<String>,
  #[serde(rename = "statFieldValue", default, deserialize_with = "null_as_default")]
  pub value: EstimateValue,
}

impl Estimate {
  pub fn points(&self) -> f64 {
    self.value.value.unwrap_or(0.0)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkItem {
  #[serde(rename = "timeSpentSeconds", default)]
  pub seconds_logged: u64,
}

/// Response of `rest/api/2/issue/{key}/worklog`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Worklog {
  #[serde(rename = "worklogs", default)]
  pub items: Vec<WorkItem>,
}

impl Worklog {
  pub fn seconds_worked(&self) -> u64 {
    self.items.iter().map(|i| i.seconds_logged).sum()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Issue {
  #[serde(default, deserialize_with = "null_as_default")]
  pub id: u64,
  pub key: String,
  #[serde(rename = "typeName", default, deserialize_with = "null_as_default")]
  pub issue_type: String,
  #[serde(rename = "estimateStatistic", default, deserialize_with = "null_as_default")]
  pub story_points: Estimate,
  #[serde(rename = "statusName", default, deserialize_with = "null_as_default")]
  pub status: String,
  /// Worklog total, `None` until fetched
  #[serde(skip)]
  logged_seconds: Option<u64>,
}

impl Issue {
  pub fn estimate(&self) -> f64 {
    self.story_points.points()
  }

  /// Confluence macro rendering a link to this issue
  pub fn markup(&self) -> String {
    format!("{{jiraissues:key={}}}", self.key)
  }

  pub fn is_closed(&self) -> bool {
    let status = self.status.to_lowercase();
    status == "closed" || status == "resolved"
  }

  /// Seconds logged against this issue.
  ///
  /// The worklog is fetched on first use and remembered afterwards.
  pub async fn logged_seconds<T: Transport>(&mut self, client: &JiraClient<T>) -> Result<u64> {
    if let Some(seconds) = self.logged_seconds {
      return Ok(seconds);
    }
    let seconds = client.worklog(&self.key).await?.seconds_worked();
    debug!(key = %self.key, seconds, "fetched worklog");
    self.logged_seconds = Some(seconds);
    Ok(seconds)
  }
}

/// Ordered list of issues; duplicates are kept as-is
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct IssueList(pub Vec<Issue>);

impl IssueList {
  pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Sum of estimates, skipping issues whose key is in `exclude`
  pub fn total_estimate(&self, exclude: Option<&BTreeSet<String>>) -> f64 {
    self
      .iter()
      .filter(|issue| exclude.map_or(true, |keys| !keys.contains(&issue.key)))
      .map(Issue::estimate)
      .sum()
  }

  /// Logged time in whole hours, formatted as `"<n> h"`.
  ///
  /// With `only_closed`, issues that are not closed or resolved are skipped.
  /// Fetches the worklog of every counted issue that has not been fetched yet.
  pub async fn total_logged_hours<T: Transport>(
    &mut self,
    only_closed: bool,
    client: &JiraClient<T>,
  ) -> Result<String> {
    let mut seconds = 0;
    for issue in self.0.iter_mut() {
      if !only_closed || issue.is_closed() {
        seconds += issue.logged_seconds(client).await?;
      }
    }
    Ok(format!("{} h", seconds / 3600))
  }

  /// Keep issues whose key is in `keys` (`return_filtered = true`) or the
  /// ones whose key is not (`false`).
  pub fn filter_by_keys(&self, keys: &BTreeSet<String>, return_filtered: bool) -> IssueList {
    IssueList(
      self
        .iter()
        .filter(|issue| keys.contains(&issue.key) == return_filtered)
        .cloned()
        .collect(),
    )
  }

  pub fn concat(&self, other: &IssueList) -> IssueList {
    IssueList(self.iter().chain(other.iter()).cloned().collect())
  }

  pub fn keys(&self) -> Vec<String> {
    self.iter().map(|issue| issue.key.clone()).collect()
  }
}

impl FromIterator<Issue> for IssueList {
  fn from_iter<I: IntoIterator<Item = Issue>>(iter: I) -> Self {
    IssueList(iter.into_iter().collect())
  }
}

impl<'a> IntoIterator for &'a IssueList {
  type Item = &'a Issue;
  type IntoIter = std::slice::Iter<'a, Issue>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

#[cfg(test)]
pub mod fixtures {
  use super::*;

  pub fn issue(key: &str, issue_type: &str, points: f64) -> Issue {
    Issue {
      id: 0,
      key: key.to_string(),
      issue_type: issue_type.to_string(),
      story_points: Estimate {
        field_id: Some("customfield_10002".to_string()),
        value: EstimateValue {
          value: Some(points),
        },
      },
      status: "Open".to_string(),
      logged_seconds: None,
    }
  }

  pub fn with_status(mut issue: Issue, status: &str) -> Issue {
    issue.status = status.to_string();
    issue
  }

  pub fn keyset(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| k.to_string()).collect()
  }
}
