use base64::{engine::general_purpose, Engine as _};
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::debug;
use url::Url;

use crate::jira::issue::Worklog;
use crate::jira::types::{AgileProjectList, SprintList};
use crate::jira::velocity::Velocity;
use crate::report::SprintReport;

/// Raw GET access to a Jira server.
///
/// `path` is relative to the server root (e.g. `rest/greenhopper/1.0/rapidview`).
pub trait Transport {
  fn get(&self, path: &str, query: &[(&str, String)]) -> impl Future<Output = Result<Vec<u8>>>;
}

/// Jira user name and password for Basic auth
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  pub user: String,
  pub password: String,
}

impl Credentials {
  /// Build credentials from prompt input.
  ///
  /// Line endings left over from reading the user name are stripped, and a
  /// shell-escaped `\!` in the password is unescaped.
  pub fn new(user: &str, password: &str) -> Self {
    Self {
      user: user.replace(['\n', '\r'], ""),
      password: password.replace("\\!", "!"),
    }
  }

  /// Base64 of `user:password`
  pub fn encoded(&self) -> String {
    general_purpose::STANDARD.encode(format!("{}:{}", self.user, self.password))
  }
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("user", &self.user)
      .finish_non_exhaustive()
  }
}

/// Transport backed by reqwest
pub struct HttpTransport {
  base_url: Url,
  credentials: Credentials,
  client: reqwest::Client,
}

impl HttpTransport {
  pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
    let base_url = normalize_base_url(base_url)?;
    let client = reqwest::Client::builder()
      .user_agent(concat!("sprint-report/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      base_url,
      credentials,
      client,
    })
  }

  pub fn resolve(&self, path: &str) -> Result<Url> {
    self
      .base_url
      .join(path)
      .map_err(|e| eyre!("Invalid API path {}: {}", path, e))
  }
}

impl Transport for HttpTransport {
  async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>> {
    let url = self.resolve(path)?;
    debug!(%url, ?query, "GET");

    let response = self
      .client
      .get(url.clone())
      .query(query)
      .header(
        reqwest::header::AUTHORIZATION,
        format!("Basic {}", self.credentials.encoded()),
      )
      .header(reqwest::header::ACCEPT, "application/json")
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(eyre!("Request to {} returned {}", url, status));
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read response from {}: {}", url, e))?;

    Ok(body.to_vec())
  }
}

/// Parse the configured server URL, making sure it ends with `/` so that
/// relative API paths are joined below it rather than replacing its last
/// segment.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
  let trimmed = raw.trim();
  let with_slash = if trimmed.ends_with('/') {
    trimmed.to_string()
  } else {
    format!("{}/", trimmed)
  };
  Url::parse(&with_slash).map_err(|e| eyre!("Invalid Jira URL {}: {}", raw, e))
}

/// Typed access to the greenhopper and issue endpoints used by the report
pub struct JiraClient<T> {
  transport: T,
}

impl<T: Transport> JiraClient<T> {
  pub fn new(transport: T) -> Self {
    Self { transport }
  }

  /// List all agile boards visible to the user
  pub async fn projects(&self) -> Result<AgileProjectList> {
    self
      .get_json("rest/greenhopper/1.0/rapidview", &[], "project list")
      .await
  }

  /// List the sprints of a board
  pub async fn sprints(&self, view_id: u64) -> Result<SprintList> {
    let path = format!("rest/greenhopper/1.0/sprintquery/{}", view_id);
    self.get_json(&path, &[], "sprint list").await
  }

  pub async fn sprint_report(&self, view_id: u64, sprint_id: u64) -> Result<SprintReport> {
    self
      .get_json(
        "rest/greenhopper/1.0/rapid/charts/sprintreport",
        &chart_query(view_id, sprint_id),
        "sprint report",
      )
      .await
  }

  pub async fn velocity(&self, view_id: u64, sprint_id: u64) -> Result<Velocity> {
    self
      .get_json(
        "rest/greenhopper/1.0/rapid/charts/velocity",
        &chart_query(view_id, sprint_id),
        "velocity data",
      )
      .await
  }

  pub async fn worklog(&self, issue_key: &str) -> Result<Worklog> {
    let path = format!("rest/api/2/issue/{}/worklog", issue_key);
    let what = format!("worklog for {}", issue_key);
    self.get_json(&path, &[], &what).await
  }

  async fn get_json<R: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
    what: &str,
  ) -> Result<R> {
    let body = self
      .transport
      .get(path, query)
      .await
      .map_err(|e| e.wrap_err(format!("Could not get {}", what)))?;

    serde_json::from_slice(&body).map_err(|e| eyre!("Failed to parse {}: {}", what, e))
  }
}

fn chart_query(view_id: u64, sprint_id: u64) -> [(&'static str, String); 2] {
  [
    ("rapidViewId", view_id.to_string()),
    ("sprintId", sprint_id.to_string()),
  ]
}

#[cfg(test)]
pub mod testing {
  use super::Transport;
  use color_eyre::{eyre::eyre, Result};
  use std::cell::RefCell;
  use std::collections::HashMap;

  /// In-memory transport serving canned bodies by path
  #[derive(Default)]
  pub struct FakeTransport {
    bodies: HashMap<String, String>,
    pub requests: RefCell<Vec<(String, Vec<(String, String)>)>>,
  }

  impl FakeTransport {
    pub fn with(mut self, path: &str, body: &str) -> Self {
      self.bodies.insert(path.to_string(), body.to_string());
      self
    }

    pub fn count(&self, path: &str) -> usize {
      self
        .requests
        .borrow()
        .iter()
        .filter(|(p, _)| p == path)
        .count()
    }
  }

  impl Transport for FakeTransport {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>> {
      self.requests.borrow_mut().push((
        path.to_string(),
        query
          .iter()
          .map(|(k, v)| (k.to_string(), v.clone()))
          .collect(),
      ));
      self
        .bodies
        .get(path)
        .map(|b| b.clone().into_bytes())
        .ok_or_else(|| eyre!("connection refused: {}", path))
    }
  }

  impl<T: Transport> Transport for &T {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>> {
      (**self).get(path, query).await
    }
  }
}

#[cfg(test)]
mod tests {
  use super::testing::FakeTransport;
  use super::*;

  #[test]
  fn test_credentials_strip_line_endings() {
    let creds = Credentials::new("user\r\n", "password\\!");
    assert_eq!(creds.user, "user");
    assert_eq!(creds.password, "password!");
  }

  #[test]
  fn test_credentials_encoding() {
    let creds = Credentials::new("user", "pass");
    assert_eq!(creds.encoded(), "dXNlcjpwYXNz");
  }

  #[test]
  fn test_credentials_debug_hides_password() {
    let creds = Credentials::new("user", "hunter2");
    assert!(!format!("{:?}", creds).contains("hunter2"));
  }

  #[test]
  fn test_base_url_gets_trailing_slash() {
    let url = normalize_base_url("https://jira.example.com/jira").unwrap();
    assert_eq!(url.as_str(), "https://jira.example.com/jira/");
    let joined = url.join("rest/greenhopper/1.0/rapidview").unwrap();
    assert_eq!(
      joined.as_str(),
      "https://jira.example.com/jira/rest/greenhopper/1.0/rapidview"
    );
  }

  #[test]
  fn test_base_url_already_slashed() {
    let url = normalize_base_url("https://jira.example.com/").unwrap();
    assert_eq!(url.as_str(), "https://jira.example.com/");
  }

  #[test]
  fn test_invalid_base_url() {
    assert!(normalize_base_url("not a url").is_err());
  }

  #[tokio::test]
  async fn test_chart_endpoints_send_view_and_sprint() {
    let transport = FakeTransport::default().with(
      "rest/greenhopper/1.0/rapid/charts/velocity",
      r#"{"velocityStatEntries": {}}"#,
    );
    let client = JiraClient::new(&transport);

    let velocity = client.velocity(7, 42).await.unwrap();
    assert!(velocity.stats.is_empty());

    let requests = transport.requests.borrow();
    assert_eq!(
      requests[0].1,
      vec![
        ("rapidViewId".to_string(), "7".to_string()),
        ("sprintId".to_string(), "42".to_string()),
      ]
    );
  }

  #[tokio::test]
  async fn test_decode_failure_names_resource() {
    let transport =
      FakeTransport::default().with("rest/greenhopper/1.0/rapidview", "<html>login</html>");
    let client = JiraClient::new(&transport);

    let err = client.projects().await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse project list"));
  }

  #[tokio::test]
  async fn test_transport_failure_is_wrapped() {
    let client = JiraClient::new(FakeTransport::default());
    let err = client.sprints(3).await.unwrap_err();
    assert_eq!(err.to_string(), "Could not get sprint list");
  }
}
