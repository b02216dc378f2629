pub mod client;
pub mod issue;
pub mod types;
pub mod velocity;

use serde::{Deserialize, Deserializer};

/// Decode an explicit JSON `null` as the type's default.
///
/// `#[serde(default)]` only covers absent keys; Jira also sends `null` for
/// fields such as a missing estimate.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  let v: Option<T> = Option::deserialize(deserializer)?;
  Ok(v.unwrap_or_default())
}
