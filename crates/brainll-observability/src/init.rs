// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always; with the `file-logging` feature, JSON files in a
//! timestamped run folder as well.

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Filter for `base_level` raised to debug for the flagged crates
pub fn build_filter(debug_flags: &CrateDebugFlags, base_level: &str) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(base_level);
    EnvFilter::try_new(&directives)
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", directives, e))
}

fn console_layer<S>(filter: EnvFilter) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(filter)
        .boxed()
}

/// Install the console subscriber
///
/// # Errors
///
/// Fails if `base_level` is not a valid filter or a global subscriber is already set.
pub fn init_logging(debug_flags: &CrateDebugFlags, base_level: &str) -> Result<()> {
    let filter = build_filter(debug_flags, base_level)?;
    Registry::default()
        .with(console_layer(filter))
        .try_init()
        .map_err(|e| anyhow!("Failed to install subscriber: {}", e))
}

#[cfg(feature = "file-logging")]
pub use file::{init_file_logging, LoggingGuard};

#[cfg(feature = "file-logging")]
mod file {
    use std::path::{Path, PathBuf};

    use anyhow::{anyhow, Context, Result};
    use chrono::{NaiveDateTime, Utc};
    use tracing_appender::non_blocking::WorkerGuard;
    use tracing_appender::rolling;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{Layer, Registry};

    use super::{build_filter, console_layer};
    use crate::cli::CrateDebugFlags;

    const RUN_PREFIX: &str = "run_";
    const RUN_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Keeps the file writer alive; logs are flushed on drop
    pub struct LoggingGuard {
        _file_guard: WorkerGuard,
        log_dir: PathBuf,
    }

    impl LoggingGuard {
        pub fn log_dir(&self) -> &Path {
            &self.log_dir
        }
    }

    /// Console output plus `brainll.log` (JSON) under `<log_dir>/run_<timestamp>/`.
    ///
    /// Only the newest `retention_runs` run folders are kept.
    pub fn init_file_logging(
        debug_flags: &CrateDebugFlags,
        base_level: &str,
        log_dir: &Path,
        retention_runs: usize,
    ) -> Result<LoggingGuard> {
        let run_folder = log_dir.join(format!("{}{}", RUN_PREFIX, Utc::now().format(RUN_FORMAT)));
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
        cleanup_old_runs(log_dir, retention_runs)?;

        let appender = rolling::never(&run_folder, "brainll.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(build_filter(debug_flags, base_level)?)
            .boxed();

        Registry::default()
            .with(console_layer(build_filter(debug_flags, base_level)?))
            .with(file_layer)
            .try_init()
            .map_err(|e| anyhow!("Failed to install subscriber: {}", e))?;

        Ok(LoggingGuard {
            _file_guard: guard,
            log_dir: run_folder,
        })
    }

    /// Remove all but the newest `keep` run folders
    pub(crate) fn cleanup_old_runs(log_dir: &Path, keep: usize) -> Result<usize> {
        let mut runs: Vec<(NaiveDateTime, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(log_dir)? {
            let path = entry?.path();
            let stamp = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(RUN_PREFIX))
                .and_then(|s| NaiveDateTime::parse_from_str(s, RUN_FORMAT).ok());
            if let Some(stamp) = stamp.filter(|_| path.is_dir()) {
                runs.push((stamp, path));
            }
        }
        runs.sort();

        let excess = runs.len().saturating_sub(keep);
        let mut removed = 0;
        for (_, path) in runs.into_iter().take(excess) {
            match std::fs::remove_dir_all(&path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!(
                    "Warning: Failed to remove old log directory {}: {}",
                    path.display(),
                    e
                ),
            }
        }
        Ok(removed)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-brainll-config".to_string()]);
        assert!(build_filter(&flags, "warn").is_ok());
        assert!(build_filter(&CrateDebugFlags::default(), "brainll=loud").is_err());
    }
}
