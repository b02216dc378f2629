//! Sprint report classification and Confluence wiki rendering.
//!
//! Issues in a greenhopper sprint report fall into:
//! - committed: planned before the sprint started and not emergent
//! - added: pulled in after the sprint started (and not emergent)
//! - emergent: unplanned work such as bugs, reported separately
//! - removed: punted out of the sprint

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::jira::issue::{Issue, IssueList};
use crate::jira::null_as_default;
use crate::jira::types::Sprint;
use crate::jira::velocity::Velocity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct EstimateTotal {
  #[serde(rename = "value", default)]
  pub total: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SprintContents {
  #[serde(rename = "completedIssues", deserialize_with = "null_as_default")]
  pub complete_issues: IssueList,
  #[serde(rename = "issuesNotCompletedInCurrentSprint", deserialize_with = "null_as_default")]
  pub incomplete_issues: IssueList,
  #[serde(rename = "puntedIssues", deserialize_with = "null_as_default")]
  pub removed_issues: IssueList,
  #[serde(rename = "completedIssuesEstimateSum", deserialize_with = "null_as_default")]
  pub total_points_completed: EstimateTotal,
  #[serde(rename = "issuesNotCompletedEstimateSum", deserialize_with = "null_as_default")]
  pub total_points_missed: EstimateTotal,
  #[serde(rename = "puntedIssuesEstimateSum", deserialize_with = "null_as_default")]
  pub total_points_removed: EstimateTotal,
  #[serde(rename = "allIssuesEstimateSum", deserialize_with = "null_as_default")]
  pub total_committed: EstimateTotal,
  #[serde(rename = "issueKeysAddedDuringSprint", deserialize_with = "null_as_default")]
  pub added_issues: BTreeMap<String, bool>,
}

/// Response of `rest/greenhopper/1.0/rapid/charts/sprintreport`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SprintReport {
  pub contents: SprintContents,
  #[serde(rename = "sprint", default)]
  pub sprint_details: Sprint,
}

/// Knobs for classification and the summary table
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
  /// Lower-case issue type names counted as emergent work
  pub emergent_types: BTreeSet<String>,
  /// Number of past sprints in the velocity average
  pub velocity_window: usize,
}

impl Default for ReportOptions {
  fn default() -> Self {
    Self {
      emergent_types: ["emergent task", "bug"]
        .into_iter()
        .map(String::from)
        .collect(),
      velocity_window: 3,
    }
  }
}

impl SprintReport {
  /// Keys of issues added after the sprint started, in key order
  pub fn added_issue_keys(&self) -> BTreeSet<String> {
    self.contents.added_issues.keys().cloned().collect()
  }

  /// Completed (and, unless `only_completed`, incomplete) issues whose type
  /// marks them as emergent
  pub fn emergent_issues(&self, only_completed: bool, options: &ReportOptions) -> IssueList {
    let is_emergent = |issue: &&Issue| {
      options
        .emergent_types
        .contains(&issue.issue_type.to_lowercase())
    };

    let completed = self.contents.complete_issues.iter().filter(is_emergent);
    if only_completed {
      completed.cloned().collect()
    } else {
      completed
        .chain(self.contents.incomplete_issues.iter().filter(is_emergent))
        .cloned()
        .collect()
    }
  }

  /// Work planned before the sprint started that is not emergent
  pub fn committed_issues(&self, options: &ReportOptions) -> IssueList {
    let mut excluded = self.added_issue_keys();
    excluded.extend(self.emergent_issues(true, options).keys());

    self
      .contents
      .complete_issues
      .filter_by_keys(&excluded, false)
      .concat(&self.contents.incomplete_issues.filter_by_keys(&excluded, false))
  }

  /// Work added during the sprint, excluding emergent work
  pub fn added_issues(&self, options: &ReportOptions) -> IssueList {
    let added_keys = self.added_issue_keys();
    let added = self
      .contents
      .complete_issues
      .filter_by_keys(&added_keys, true)
      .concat(&self.contents.incomplete_issues.filter_by_keys(&added_keys, true));

    let emergent: BTreeSet<String> = self
      .emergent_issues(false, options)
      .keys()
      .into_iter()
      .collect();
    added.filter_by_keys(&emergent, false)
  }

  /// Points of completed and incomplete issues that were not added mid-sprint
  pub fn committed_points(&self) -> f64 {
    let added = self.added_issue_keys();
    self.contents.complete_issues.total_estimate(Some(&added))
      + self.contents.incomplete_issues.total_estimate(Some(&added))
  }

  pub fn added_points(&self) -> f64 {
    let total = self.contents.complete_issues.total_estimate(None)
      + self.contents.incomplete_issues.total_estimate(None);
    total - self.committed_points()
  }

  pub fn summary_table(
    &self,
    velocity: &Velocity,
    hours_logged: Option<&str>,
    options: &ReportOptions,
  ) -> WikiTable {
    let contents = &self.contents;
    let mut table = WikiTable::new("Sprint Details")
      .row(["Start Date:", self.sprint_details.start_date.as_str()])
      .row(["End Date:", self.sprint_details.end_date.as_str()])
      .row(["Committed Points:", points(self.committed_points()).as_str()])
      .row(["Added Points:", points(self.added_points()).as_str()])
      .row([
        "Removed Points:",
        points(contents.removed_issues.total_estimate(None)).as_str(),
      ])
      .row([
        "Completed Points:",
        points(contents.complete_issues.total_estimate(None)).as_str(),
      ])
      .row([
        format!("Average Velocity (last {}):", options.velocity_window).as_str(),
        points(velocity.average_completed(options.velocity_window)).as_str(),
      ]);

    if let Some(hours) = hours_logged {
      table = table.row(["Hours Logged:", hours]);
    }
    table
  }

  pub fn committed_table(&self, options: &ReportOptions) -> WikiTable {
    self
      .committed_issues(options)
      .iter()
      .fold(
        WikiTable::new("Sprint Commitment").header(["User Story", "Estimate"]),
        |table, issue| table.row([issue.markup().as_str(), points(issue.estimate()).as_str()]),
      )
  }

  pub fn emergent_table(&self, options: &ReportOptions) -> WikiTable {
    self.emergent_issues(true, options).iter().fold(
      WikiTable::new("Emergent Work").header(["Work Item", "Type"]),
      |table, issue| table.row([issue.markup().as_str(), issue.issue_type.as_str()]),
    )
  }

  pub fn additions_table(&self, options: &ReportOptions) -> WikiTable {
    self.added_issues(options).iter().fold(
      WikiTable::new("Sprint Additions").header(["User Story", "Estimate"]),
      |table, issue| table.row([issue.markup().as_str(), points(issue.estimate()).as_str()]),
    )
  }

  /// Full report: summary, commitment, emergent work, additions
  pub fn render(
    &self,
    velocity: &Velocity,
    hours_logged: Option<&str>,
    options: &ReportOptions,
  ) -> String {
    format!(
      "{}{}{}{}",
      self.summary_table(velocity, hours_logged, options),
      self.committed_table(options),
      self.emergent_table(options),
      self.additions_table(options),
    )
  }
}

/// Points are shown truncated toward zero
fn points(value: f64) -> String {
  (value.trunc() as i64).to_string()
}

/// Confluence wiki-markup table under an `h2.` heading
#[derive(Debug, Clone, PartialEq)]
pub struct WikiTable {
  title: String,
  header: Option<Vec<String>>,
  rows: Vec<Vec<String>>,
}

impl WikiTable {
  pub fn new(title: &str) -> Self {
    Self {
      title: title.to_string(),
      header: None,
      rows: Vec::new(),
    }
  }

  pub fn header<const N: usize>(mut self, cells: [&str; N]) -> Self {
    self.header = Some(cells.iter().map(|c| c.to_string()).collect());
    self
  }

  pub fn row<const N: usize>(mut self, cells: [&str; N]) -> Self {
    self.rows.push(cells.iter().map(|c| c.to_string()).collect());
    self
  }

  pub fn rows(&self) -> &[Vec<String>] {
    &self.rows
  }
}

impl fmt::Display for WikiTable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "h2. {}", self.title)?;
    writeln!(f)?;
    if let Some(header) = &self.header {
      writeln!(f, "|| {} ||", header.join(" || "))?;
    }
    for row in &self.rows {
      writeln!(f, "| {} |", row.join(" | "))?;
    }
    writeln!(f)?;
    writeln!(f)
  }
}
