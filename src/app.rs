//! The report pipeline: board -> sprint -> sprint report + velocity -> text.

use color_eyre::{eyre::WrapErr, Result};
use tracing::info;

use crate::config::Settings;
use crate::jira::client::{JiraClient, Transport};

/// Fetch everything needed for one sprint and render the report.
///
/// Requests are made one after another; the first failure aborts the run.
pub async fn generate<T: Transport>(client: &JiraClient<T>, settings: &Settings) -> Result<String> {
  info!("Populating Jira projects...");
  let projects = client.projects().await?;
  info!("Found {} projects", projects.projects.len());

  let project = projects
    .find_by_name(&settings.project)
    .wrap_err_with(|| format!("Project '{}' is not found", settings.project))?;
  info!(id = project.id, "Retrieved {}", project.name);

  info!("Finding sprint {}", settings.sprint);
  let sprints = client.sprints(project.id).await?;
  let sprint = sprints
    .find_by_name(&settings.sprint)
    .wrap_err_with(|| format!("Sprint '{}' is not found", settings.sprint))?;

  info!(id = sprint.id, "Getting report details...");
  let mut report = client.sprint_report(project.id, sprint.id).await?;

  info!("Getting velocity data...");
  let velocity = client.velocity(project.id, sprint.id).await?;

  let hours_logged = if settings.include_hours {
    info!("Summing logged work...");
    Some(
      report
        .contents
        .complete_issues
        .total_logged_hours(true, client)
        .await?,
    )
  } else {
    None
  };

  Ok(report.render(&velocity, hours_logged.as_deref(), &settings.report))
}
