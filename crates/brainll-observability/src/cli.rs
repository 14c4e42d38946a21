// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-brainll-npu-engine` and `--debug-all`.

use std::collections::BTreeSet;
use std::env;

use crate::{crate_target, KNOWN_CRATES};

pub const DEBUG_ENV: &str = "BRAINLL_DEBUG";

/// Crates whose logs are raised to debug level
///
/// # Example
/// ```rust
/// use brainll_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-brainll-npu-engine".to_string()]);
/// assert!(flags.is_enabled("brainll-npu-engine"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Parse `--debug-{crate-name}` and `--debug-all` arguments; others are ignored
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Flags for a list of crate names (`all` enables every known crate)
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::default();
        for name in names {
            match name.as_ref().trim() {
                "" => {}
                "all" => flags.enable_all(),
                crate_name => flags.enable(crate_name),
            }
        }
        flags
    }

    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(crate_name.to_string());
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    /// Union of both flag sets
    pub fn merge(&mut self, other: &CrateDebugFlags) {
        self.enabled_crates
            .extend(other.enabled_crates.iter().cloned());
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    /// Enabled crates, sorted
    pub fn enabled_crates(&self) -> Vec<&str> {
        self.enabled_crates.iter().map(String::as_str).collect()
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` for enabled crates, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// `EnvFilter` directives: `base_level` plus `target=debug` for each enabled crate
    pub fn to_filter_string(&self, base_level: &str) -> String {
        let mut filters = vec![base_level.to_string()];
        filters.extend(
            self.enabled_crates
                .iter()
                .map(|name| format!("{}=debug", crate_target(name))),
        );
        filters.join(",")
    }
}

/// Debug flags from the process arguments and `BRAINLL_DEBUG`
///
/// `BRAINLL_DEBUG` holds comma-separated crate names, or `all`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var(DEBUG_ENV) {
        flags.merge(&CrateDebugFlags::from_names(value.split(',')));
    }
    flags
}

pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {env}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {env}=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", "),
        env = DEBUG_ENV
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-brainll-npu-engine".to_string()]);
        assert!(flags.is_enabled("brainll-npu-engine"));
        assert!(!flags.is_enabled("brainll-persistence"));
    }

    #[test]
    fn test_unrelated_args_are_ignored() {
        let flags = CrateDebugFlags::from_args(vec![
            "brainll".to_string(),
            "--steps".to_string(),
            "100".to_string(),
        ]);
        assert!(!flags.any_enabled());
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_from_names_and_merge() {
        let mut flags = CrateDebugFlags::from_names(["brainll-config", " ", "brainll"]);
        flags.merge(&CrateDebugFlags::from_names(vec!["brainll-persistence".to_string()]));
        assert_eq!(
            flags.enabled_crates(),
            vec!["brainll", "brainll-config", "brainll-persistence"]
        );
        assert_eq!(
            CrateDebugFlags::from_names(["all"]).enabled_crates().len(),
            KNOWN_CRATES.len()
        );
    }

    #[test]
    fn test_filter_string() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-brainll-npu-engine".to_string()]);
        assert_eq!(flags.to_filter_string("warn"), "warn,brainll_npu_engine=debug");
        assert_eq!(CrateDebugFlags::default().to_filter_string("info"), "info");
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-brainll-config".to_string()]);
        assert_eq!(flags.log_level("brainll-config"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("brainll-npu-engine"), tracing::Level::INFO);
    }

    #[test]
    fn test_help_lists_crates() {
        let help = debug_flags_help();
        assert!(help.contains("brainll-npu-plasticity"));
        assert!(help.contains("BRAINLL_DEBUG=all"));
    }
}
