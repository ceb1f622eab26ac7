// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for honeycomb binaries
//!
//! Console output is always on. With the `file-logging` feature and a log
//! directory, a combined JSON log is also written to a timestamped run folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── honeycomb.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Number of run folders kept when file logging is enabled
pub const RETAINED_RUNS: usize = 10;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps log writers alive; drop it at the end of `main` to flush files
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder receiving log files, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Build the filter for the given flags and default level
pub fn build_filter(debug_flags: &CrateDebugFlags, default_level: &str) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(default_level);
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter: {}", directives))
}

/// Initialize logging with console output and optional file output
///
/// # Arguments
/// * `debug_flags` - Per-crate debug flags
/// * `default_level` - Level for everything not raised by a flag
/// * `log_dir` - Base directory for run folders (file logging only)
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    default_level: &str,
    log_dir: Option<&Path>,
) -> Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(build_filter(debug_flags, default_level)?)
        .boxed();
    layers.push(console_layer);

    #[cfg(feature = "file-logging")]
    let (file_guards, run_folder) = match log_dir {
        Some(base) => {
            let (layer, guard, run_folder) = file_layer(base, build_filter(debug_flags, default_level)?)?;
            layers.push(layer);
            (vec![guard], Some(run_folder))
        }
        None => (Vec::new(), None),
    };
    #[cfg(not(feature = "file-logging"))]
    let run_folder: Option<PathBuf> = None;

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    #[cfg(not(feature = "file-logging"))]
    if let Some(dir) = log_dir {
        tracing::warn!(
            "Log directory {} ignored: built without the file-logging feature",
            dir.display()
        );
    }

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir: run_folder,
    })
}

#[cfg(feature = "file-logging")]
fn file_layer(
    base_log_dir: &Path,
    filter: EnvFilter,
) -> Result<(BoxedLayer, tracing_appender::non_blocking::WorkerGuard, PathBuf)> {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let run_folder = base_log_dir.join(format!("run_{}", timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_runs(base_log_dir, RETAINED_RUNS)?;

    let appender = tracing_appender::rolling::never(&run_folder, "honeycomb.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(filter)
        .boxed();

    Ok((layer, guard, run_folder))
}

/// Remove all but the `keep` most recent run folders
#[cfg(feature = "file-logging")]
pub fn cleanup_old_runs(base_log_dir: &Path, keep: usize) -> Result<()> {
    if !base_log_dir.exists() {
        return Ok(());
    }

    let mut runs: Vec<(PathBuf, chrono::NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)
        .with_context(|| format!("Failed to list log directory: {}", base_log_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("run_"))
            .and_then(|s| chrono::NaiveDateTime::parse_from_str(s, "%Y%m%d_%H%M%S").ok());
        if let Some(stamp) = stamp {
            runs.push((path, stamp));
        }
    }

    runs.sort_by_key(|(_, stamp)| *stamp);
    let excess = runs.len().saturating_sub(keep);
    for (path, _) in runs.iter().take(excess) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!("Warning: Failed to remove old log directory {}: {}", path.display(), e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-honeycomb-neighbors".to_string()]);
        assert!(build_filter(&flags, "info").is_ok());
        assert!(build_filter(&CrateDebugFlags::default(), "warn").is_ok());
    }

    #[cfg(feature = "file-logging")]
    #[test]
    fn test_cleanup_keeps_most_recent_runs() {
        let dir = tempfile::tempdir().unwrap();
        for stamp in ["20240101_000000", "20240102_000000", "20240103_000000"] {
            std::fs::create_dir(dir.path().join(format!("run_{}", stamp))).unwrap();
        }
        std::fs::create_dir(dir.path().join("notes")).unwrap();

        cleanup_old_runs(dir.path(), 2).unwrap();

        assert!(!dir.path().join("run_20240101_000000").exists());
        assert!(dir.path().join("run_20240102_000000").exists());
        assert!(dir.path().join("run_20240103_000000").exists());
        assert!(dir.path().join("notes").exists());
    }
}
