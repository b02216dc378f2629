mod app;
mod config;
mod jira;
mod logging;
mod prompt;
mod report;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{Config, ConfigError, Overrides};
use crate::jira::client::{Credentials, HttpTransport, JiraClient};

#[derive(Parser, Debug)]
#[command(name = "sprint-report")]
#[command(about = "Generate a Confluence sprint report from a Jira agile board")]
#[command(
  after_help = "Example: sprint-report --jira-url 'https://my.jira.com/' --project 'My Team' --sprint 'Our Last Sprint'"
)]
#[command(version)]
struct Args {
  /// The name of the agile board (not the project key)
  #[arg(short, long)]
  project: Option<String>,

  /// The name of the sprint to report on
  #[arg(short, long)]
  sprint: Option<String>,

  /// The URL of the Jira instance
  #[arg(short = 'u', long)]
  jira_url: Option<String>,

  /// Jira user name (prompted for when not set here or in the config file)
  #[arg(long)]
  user: Option<String>,

  /// Path to config file (default: ./sprint-report.yaml, then $XDG_CONFIG_HOME/sprint-report/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Add the hours logged on closed issues to the summary
  #[arg(long)]
  hours: bool,

  /// Also write logs to this file
  #[arg(long)]
  log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init(args.log_file.as_deref())?;

  let config = Config::load(args.config.as_deref())?;
  let settings = match config.resolve(Overrides {
    project: args.project,
    sprint: args.sprint,
    jira_url: args.jira_url,
    username: args.user,
    include_hours: args.hours,
  }) {
    Ok(settings) => settings,
    Err(missing) => return Ok(usage_error(&missing)),
  };

  let user = match &settings.username {
    Some(user) => user.clone(),
    None => prompt::read_username()?,
  };
  let password = match Config::get_password() {
    Some(password) => password,
    None => prompt::read_password()?,
  };

  let transport = HttpTransport::new(&settings.jira_url, Credentials::new(&user, &password))?;
  let client = JiraClient::new(transport);

  let text = app::generate(&client, &settings).await?;

  eprint!(
    "\n\nWhile editing a confluence page, press <ctrl>+<shift>+d and paste the following into the box:\n\n"
  );
  println!("{}", text);

  Ok(ExitCode::SUCCESS)
}

fn usage_error(missing: &ConfigError) -> ExitCode {
  eprintln!("{}\n", missing);
  eprintln!("Run with --help for usage.");
  ExitCode::FAILURE
}
