//! Velocity chart data (`rest/greenhopper/1.0/rapid/charts/velocity`).

use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct VelocityEntry {
  #[serde(default)]
  pub value: f64,
}

/// Estimated and completed points of one past sprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct VelocityStats {
  #[serde(default)]
  pub estimated: VelocityEntry,
  #[serde(default)]
  pub completed: VelocityEntry,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Velocity {
  /// Keyed by sprint id as sent by Jira
  #[serde(rename = "velocityStatEntries", default)]
  pub stats: BTreeMap<String, VelocityStats>,
}

impl Velocity {
  /// Sprint labels, most recent first.
  ///
  /// Numeric labels are sprint ids and sort by value, so `"100"` comes before
  /// `"99"`. Any non-numeric labels follow in descending string order.
  pub fn sorted_labels(&self) -> Vec<&str> {
    let mut labels: Vec<&str> = self.stats.keys().map(String::as_str).collect();
    labels.sort_by_key(|label| Reverse((label.parse::<u64>().ok(), *label)));
    labels
  }

  /// Mean completed points over the `count` most recent sprints.
  ///
  /// Returns 0.0 when there is no history to average.
  pub fn average_completed(&self, count: usize) -> f64 {
    let recent: Vec<f64> = self
      .sorted_labels()
      .into_iter()
      .take(count)
      .filter_map(|label| self.stats.get(label))
      .map(|stats| stats.completed.value)
      .collect();

    if recent.is_empty() {
      return 0.0;
    }
    recent.iter().sum::<f64>() / recent.len() as f64
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn velocity(entries: &[(&str, f64)]) -> Velocity {
    Velocity {
      stats: entries
        .iter()
        .map(|(label, completed)| {
          (
            label.to_string(),
            VelocityStats {
              estimated: VelocityEntry { value: 10.0 },
              completed: VelocityEntry { value: *completed },
            },
          )
        })
        .collect(),
    }
  }

  #[test]
  fn test_decode() {
    let json = r#"{
      "sprints": [],
      "velocityStatEntries": {
        "41": {"estimated": {"value": 20.0, "text": "20.0"}, "completed": {"value": 18.0, "text": "18.0"}},
        "42": {"estimated": {"value": 21.0}, "completed": {"value": 15.0}}
      }
    }"#;
    let velocity: Velocity = serde_json::from_str(json).unwrap();
    assert_eq!(velocity.stats.len(), 2);
    assert_eq!(velocity.stats["41"].estimated.value, 20.0);
    assert_eq!(velocity.sorted_labels(), vec!["42", "41"]);
  }

  #[test]
  fn test_numeric_labels_sort_by_value() {
    let v = velocity(&[("99", 1.0), ("100", 2.0), ("101", 3.0), ("9", 4.0)]);
    assert_eq!(v.sorted_labels(), vec!["101", "100", "99", "9"]);
  }

  #[test]
  fn test_text_labels_sort_descending_after_numeric() {
    let v = velocity(&[("2024-01", 1.0), ("7", 2.0), ("2024-03", 3.0)]);
    assert_eq!(v.sorted_labels(), vec!["7", "2024-03", "2024-01"]);
  }

  #[test]
  fn test_average_of_last_three() {
    let v = velocity(&[("1", 100.0), ("2", 10.0), ("3", 20.0), ("4", 30.0)]);
    assert_eq!(v.average_completed(3), 20.0);
  }

  #[test]
  fn test_average_over_more_than_available() {
    let v = velocity(&[("1", 10.0), ("2", 15.0)]);
    assert_eq!(v.average_completed(5), 12.5);
  }

  #[test]
  fn test_average_of_one_is_most_recent() {
    let v = velocity(&[("10", 7.0), ("9", 3.0)]);
    assert_eq!(v.average_completed(1), 7.0);
  }

  #[test]
  fn test_empty_history_averages_to_zero() {
    assert_eq!(Velocity::default().average_completed(3), 0.0);
    assert_eq!(velocity(&[("1", 5.0)]).average_completed(0), 0.0);
  }
}
