//! Tracing setup. Logs go to stderr so stdout carries only the report.

use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_ENV: &str = "SPRINT_REPORT_LOG";

/// Install the global subscriber.
///
/// The filter comes from `SPRINT_REPORT_LOG` (default `info`). When
/// `log_file` is given, events are also appended there; keep the returned
/// guard alive until exit so buffered lines are flushed.
pub fn init(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let filter = || EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

  let stderr_layer = fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .with_filter(filter());

  let (file_layer, guard) = match log_file {
    Some(path) => {
      let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
      let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("Log file path has no file name: {}", path.display()))?;
      let appender =
        tracing_appender::rolling::never(directory.unwrap_or_else(|| Path::new(".")), file_name);
      let (writer, guard) = tracing_appender::non_blocking(appender);
      let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter());
      (Some(layer), Some(guard))
    }
    None => (None, None),
  };

  tracing_subscriber::registry()
    .with(stderr_layer)
    .with(file_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to initialise logging: {}", e))?;

  Ok(guard)
}
